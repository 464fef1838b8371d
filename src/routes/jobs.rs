//! Job asincroni: invio, stato e risultato

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::error::{AppError, Result};
use crate::models::{
    ErrorResponse, JobCreatedResponse, JobParameter, JobResult, JobStatus, JobStatusView,
};
use crate::services::queue::JobRepository;

use super::upload::read_upload;

#[derive(Clone)]
pub struct JobsState {
    pub repository: JobRepository,
    pub max_file_size_mb: u64,
}

pub fn router(repository: JobRepository, max_file_size_mb: u64) -> Router {
    let state = JobsState {
        repository,
        max_file_size_mb,
    };

    Router::new()
        .route("/api/jobs", post(create_job))
        .route("/api/jobs/:job_id/status", get(get_job_status))
        .route("/api/jobs/:job_id/result", get(get_job_result))
        .with_state(state)
}

/// Invia un file per la classificazione asincrona
#[utoipa::path(
    post,
    path = "/api/jobs",
    tag = "Jobs",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 202, description = "Job accettato", body = JobCreatedResponse),
        (status = 400, description = "Nessun file caricato", body = ErrorResponse),
        (status = 413, description = "File troppo grande", body = ErrorResponse),
        (status = 503, description = "Store non raggiungibile", body = ErrorResponse),
    )
)]
pub async fn create_job(
    State(state): State<JobsState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<JobCreatedResponse>)> {
    let (data, file_name) = read_upload(&mut multipart, state.max_file_size_mb).await?;

    let job_id = state
        .repository
        .create_job(JobParameter::new(data, file_name))
        .await?;

    tracing::info!(job_id = %job_id, "Job in coda");

    Ok((
        StatusCode::ACCEPTED,
        Json(JobCreatedResponse {
            job_id,
            message: "Job inviato".to_string(),
        }),
    ))
}

/// Stato di un job
#[utoipa::path(
    get,
    path = "/api/jobs/{job_id}/status",
    tag = "Jobs",
    params(("job_id" = String, Path, description = "Id del job")),
    responses(
        (status = 200, description = "Stato del job", body = JobStatusView),
        (status = 404, description = "Job non trovato", body = ErrorResponse),
    )
)]
pub async fn get_job_status(
    State(state): State<JobsState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatusView>> {
    state
        .repository
        .get_job_status(&job_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::JobNotFound(job_id.clone()))
}

/// Risultato di un job completato
#[utoipa::path(
    get,
    path = "/api/jobs/{job_id}/result",
    tag = "Jobs",
    params(("job_id" = String, Path, description = "Id del job")),
    responses(
        (status = 200, description = "Risultato della classificazione", body = JobResult),
        (status = 400, description = "Job non ancora completato", body = ErrorResponse),
        (status = 404, description = "Job non trovato", body = ErrorResponse),
        (status = 500, description = "Job fallito", body = ErrorResponse),
    )
)]
pub async fn get_job_result(
    State(state): State<JobsState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobResult>> {
    // Prima lo stato, per distinguere "non trovato" da "non pronto"
    let status = state
        .repository
        .get_job_status(&job_id)
        .await?
        .ok_or_else(|| AppError::JobNotFound(job_id.clone()))?;

    match status.status {
        JobStatus::Pending | JobStatus::Processing => Err(AppError::JobNotCompleted(job_id)),
        JobStatus::Failed => Err(AppError::JobFailed(
            status.error.unwrap_or_else(|| job_id.clone()),
        )),
        JobStatus::Completed => state
            .repository
            .get_job_result(&job_id)
            .await?
            .map(Json)
            .ok_or_else(|| AppError::Internal(format!("Risultato mancante per il job {}", job_id))),
    }
}
