//! Classificazione sincrona di un singolo file

use axum::{extract::Multipart, extract::State, routing::post, Json, Router};

use crate::error::Result;
use crate::models::{ErrorResponse, JobResult};
use crate::services::classifier::SharedClassifier;

use super::upload::read_upload;

#[derive(Clone)]
pub struct DetectState {
    pub classifier: SharedClassifier,
    pub max_file_size_mb: u64,
}

pub fn router(classifier: SharedClassifier, max_file_size_mb: u64) -> Router {
    let state = DetectState {
        classifier,
        max_file_size_mb,
    };

    Router::new()
        .route("/api/detect-file-type", post(detect_file_type))
        .with_state(state)
}

/// Rileva subito il tipo di un file, senza passare dalla coda
#[utoipa::path(
    post,
    path = "/api/detect-file-type",
    tag = "Rilevamento",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Tipo di file rilevato", body = JobResult),
        (status = 400, description = "Nessun file caricato", body = ErrorResponse),
        (status = 422, description = "Classificazione fallita", body = ErrorResponse),
    )
)]
pub async fn detect_file_type(
    State(state): State<DetectState>,
    mut multipart: Multipart,
) -> Result<Json<JobResult>> {
    let (data, file_name) = read_upload(&mut multipart, state.max_file_size_mb).await?;

    let outcome = state.classifier.classify(&data).await?;
    let result = JobResult::from_outcome(&file_name, outcome)?;

    tracing::info!(
        "Rilevamento sincrono: {} -> {} ({})",
        result.file_name,
        result.file_type,
        result.score_percent
    );

    Ok(Json(result))
}
