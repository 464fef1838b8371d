//! Store dei job: persistenza chiave/valore con scadenza per record

pub mod codec;
pub mod memory;
pub mod redis_store;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Config;
use crate::models::JobRecord;

pub use self::memory::MemoryJobStore;
pub use self::redis_store::RedisJobStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Connessione allo store fallita: {0}")]
    Connection(String),

    #[error("Comando store fallito: {0}")]
    Command(String),

    #[error("Record non valido: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistenza dei record job.
///
/// Ogni scrittura riporta la scadenza del record a `ttl`. Le letture e le
/// scritture fallite non vengono ritentate a questo livello.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn get(&self, id: &str) -> StoreResult<Option<JobRecord>>;

    async fn put(&self, record: &JobRecord, ttl: Duration) -> StoreResult<()>;

    /// Scrive `record` solo se la versione salvata è `expected_version`.
    /// Restituisce `false` se il record manca o è stato modificato nel frattempo.
    async fn put_if_version(
        &self,
        record: &JobRecord,
        expected_version: u64,
        ttl: Duration,
    ) -> StoreResult<bool>;

    /// Id di tutti i job sotto il prefisso configurato, senza ordine garantito
    async fn list_ids(&self) -> StoreResult<Vec<String>>;

    /// Rimuove i record scaduti; 0 per gli store con scadenza nativa
    async fn purge_expired(&self) -> StoreResult<usize>;

    fn has_native_expiry(&self) -> bool;

    async fn ping(&self) -> StoreResult<()>;
}

pub type SharedJobStore = Arc<dyn JobStore>;

/// Apre la connessione allo store configurato
pub async fn connect(config: &Config) -> StoreResult<SharedJobStore> {
    let store = RedisJobStore::connect(
        &config.redis_url(),
        &config.job_key_prefix,
        config.redis_connect_retries,
    )
    .await?;
    store.ping().await?;
    Ok(Arc::new(store))
}
