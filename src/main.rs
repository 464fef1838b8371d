use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use rilevo::config::Config;
use rilevo::db;
use rilevo::models::*;
use rilevo::routes;
use rilevo::services::classifier::{SharedClassifier, SignatureClassifier};
use rilevo::services::queue::JobRepository;
use rilevo::utils::shutdown_signal;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rilevo API",
        version = "1.0.0",
        description = "API per il rilevamento del tipo di file con elaborazione asincrona",
        license(name = "MIT"),
    ),
    paths(
        crate::routes::health::root,
        crate::routes::health::health_check,
        crate::routes::jobs::create_job,
        crate::routes::jobs::get_job_status,
        crate::routes::jobs::get_job_result,
        crate::routes::detect::detect_file_type,
    ),
    components(schemas(
        HealthResponse,
        RootResponse,
        EndpointsInfo,
        JobEndpoints,
        JobCreatedResponse,
        JobStatusView,
        JobStatus,
        JobResult,
        ErrorResponse,
    )),
    tags(
        (name = "Sistema", description = "Health check e info"),
        (name = "Jobs", description = "Gestione job asincroni"),
        (name = "Rilevamento", description = "Rilevamento sincrono del tipo di file"),
    ),
    servers(
        (url = "http://localhost:3002", description = "Server locale"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Carica variabili da .env
    dotenvy::dotenv().ok();

    // Inizializza logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rilevo=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Carica configurazione
    let config = Config::from_env();

    let store = match db::connect(&config).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Errore connessione store: {}", e);
            std::process::exit(1);
        }
    };

    let classifier: SharedClassifier = match SignatureClassifier::load() {
        Ok(classifier) => Arc::new(classifier),
        Err(e) => {
            tracing::error!("Errore inizializzazione classificatore: {}", e);
            std::process::exit(1);
        }
    };

    let repository = JobRepository::new(store, config.job_ttl(), config.lease_timeout());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::create_router(repository, classifier, &config)
        .merge(SwaggerUi::new("/documentation").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("Indirizzo non valido {}:{}: {}", config.host, config.port, e);
            std::process::exit(1);
        }
    };

    tracing::info!("========================================");
    tracing::info!("  Rilevo API v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("========================================");
    tracing::info!("Server: http://{}", addr);
    tracing::info!("Documentazione: http://{}/documentation", addr);
    tracing::info!("----------------------------------------");
    tracing::info!("  GET  /health                      - Health check");
    tracing::info!("  POST /api/detect-file-type        - Rilevamento sincrono");
    tracing::info!("  POST /api/jobs                    - Invia job");
    tracing::info!("  GET  /api/jobs/:jobId/status      - Stato job");
    tracing::info!("  GET  /api/jobs/:jobId/result      - Risultato job");
    tracing::info!("----------------------------------------");
    tracing::info!(
        "Limite upload: {} MB, retention job: {} s",
        config.max_file_size_mb,
        config.job_ttl_secs
    );

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Impossibile aprire {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Errore server: {}", e);
        std::process::exit(1);
    }
}
