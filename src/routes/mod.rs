pub mod detect;
pub mod health;
pub mod jobs;
mod upload;

use axum::{extract::DefaultBodyLimit, Router};

use crate::config::Config;
use crate::services::classifier::SharedClassifier;
use crate::services::queue::JobRepository;

/// Margine per gli header del form multipart oltre al limite del file
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn create_router(
    repository: JobRepository,
    classifier: SharedClassifier,
    config: &Config,
) -> Router {
    let body_limit = config.max_file_size_bytes() as usize + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .merge(health::router(repository.store().clone()))
        .merge(jobs::router(repository, config.max_file_size_mb))
        .merge(detect::router(classifier, config.max_file_size_mb))
        .layer(DefaultBodyLimit::max(body_limit))
}
