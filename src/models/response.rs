use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok" se lo store risponde, altrimenti "degraded"
    pub status: String,
    pub timestamp: String,
    pub service: String,
    /// Versione dell'API
    pub version: String,
    /// Stato della connessione allo store job
    pub store: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RootResponse {
    pub name: String,
    pub description: String,
    pub version: String,
    pub endpoints: EndpointsInfo,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndpointsInfo {
    pub health: String,
    pub documentation: String,
    pub detect_file_type: String,
    pub jobs: JobEndpoints,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JobEndpoints {
    pub create: String,
    pub status: String,
    pub result: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobCreatedResponse {
    pub job_id: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub status: u16,
}
