use axum::{extract::Multipart, http::StatusCode};

use crate::error::{AppError, Result};
use crate::utils::{sanitize_file_name, validate_file_size};

/// Legge il primo file del form multipart: contenuto e nome originale
pub async fn read_upload(
    multipart: &mut Multipart,
    max_file_size_mb: u64,
) -> Result<(Vec<u8>, String)> {
    let multipart_error = |e: axum::extract::multipart::MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::FileTooLarge(max_file_size_mb)
        } else {
            AppError::BadRequest(e.body_text())
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.file_name().is_none() && field.name() != Some("file") {
            continue;
        }

        let file_name = sanitize_file_name(field.file_name().unwrap_or("file"));
        let bytes = field.bytes().await.map_err(multipart_error)?;
        validate_file_size(bytes.len() as u64, max_file_size_mb)?;

        return Ok((bytes.to_vec(), file_name));
    }

    Err(AppError::MissingField("file".to_string()))
}
