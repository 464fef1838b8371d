use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rilevo::config::Config;
use rilevo::db;
use rilevo::services::classifier::SignatureClassifier;
use rilevo::services::queue::{JobRepository, Worker, WorkerSettings};
use rilevo::utils::shutdown_signal;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rilevo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    tracing::info!("Rilevo worker v{}", env!("CARGO_PKG_VERSION"));

    let store = match db::connect(&config).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Errore connessione store: {}", e);
            std::process::exit(1);
        }
    };

    // Il classificatore va caricato prima di accettare job
    let classifier = match SignatureClassifier::load() {
        Ok(classifier) => Arc::new(classifier),
        Err(e) => {
            tracing::error!("Errore inizializzazione classificatore: {}", e);
            std::process::exit(1);
        }
    };

    let repository = JobRepository::new(store, config.job_ttl(), config.lease_timeout());

    Worker::new(repository, classifier, WorkerSettings::from(&config))
        .run(shutdown_signal())
        .await;
}
