use axum::{extract::State, routing::get, Json, Router};

use crate::db::SharedJobStore;
use crate::models::{EndpointsInfo, HealthResponse, JobEndpoints, RootResponse};

#[derive(Clone)]
pub struct HealthState {
    pub store: SharedJobStore,
}

pub fn router(store: SharedJobStore) -> Router {
    let state = HealthState { store };
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Informazioni sul servizio e mappa degli endpoint
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Informazioni API", body = RootResponse),
    ),
    tag = "Sistema"
)]
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        name: "Rilevo API".to_string(),
        description: "Rilevamento del tipo di file con elaborazione asincrona".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: EndpointsInfo {
            health: "/health".to_string(),
            documentation: "/documentation".to_string(),
            detect_file_type: "/api/detect-file-type".to_string(),
            jobs: JobEndpoints {
                create: "/api/jobs".to_string(),
                status: "/api/jobs/:jobId/status".to_string(),
                result: "/api/jobs/:jobId/result".to_string(),
            },
        },
    })
}

/// Health check dell'API e dello store job
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "API funzionante", body = HealthResponse),
    ),
    tag = "Sistema"
)]
pub async fn health_check(State(state): State<HealthState>) -> Json<HealthResponse> {
    let store_ok = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Store job non raggiungibile: {}", e);
            false
        }
    };

    Json(HealthResponse {
        status: if store_ok { "ok" } else { "degraded" }.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        service: "api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: if store_ok { "connected" } else { "unavailable" }.to_string(),
    })
}
