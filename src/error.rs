use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::db::StoreError;
use crate::models::JobStatus;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Job non trovato: {0}")]
    JobNotFound(String),

    #[error("Job non ancora completato: {0}")]
    JobNotCompleted(String),

    #[error("Job fallito: {0}")]
    JobFailed(String),

    #[error("Transizione non ammessa per il job {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("Job modificato da un altro processo: {0}")]
    JobConflict(String),

    #[error("Campo multipart mancante: {0}")]
    MissingField(String),

    #[error("File troppo grande: massimo {0} MB")]
    FileTooLarge(u64),

    #[error("Richiesta non valida: {0}")]
    BadRequest(String),

    #[error("Errore di classificazione: {0}")]
    Classification(String),

    #[error("Errore store: {0}")]
    Store(#[from] StoreError),

    #[error("Errore interno: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::JobNotFound(_) => StatusCode::NOT_FOUND,
            AppError::JobNotCompleted(_) => StatusCode::BAD_REQUEST,
            AppError::JobFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::JobConflict(_) => StatusCode::CONFLICT,
            AppError::MissingField(_) => StatusCode::BAD_REQUEST,
            AppError::FileTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Classification(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Store(StoreError::Connection(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
