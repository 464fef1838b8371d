//! Store job su Redis / Dragonfly.
//!
//! Un record per chiave (`<prefisso><id>`) scritto con `SET ... EX`, così la
//! scadenza è gestita dallo store stesso.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError, Script};

use crate::models::JobRecord;

use super::codec::{decode_record, encode_record};
use super::{JobStore, StoreError, StoreResult};

/// Backoff esponenziale per stabilire la connessione: 2^n * 100 ms
const BACKOFF_EXPONENT_BASE: u64 = 2;
const BACKOFF_FACTOR_MS: u64 = 100;

/// Scrittura condizionata sulla versione del record.
/// KEYS[1] = chiave, ARGV[1] = versione attesa, ARGV[2] = payload, ARGV[3] = ttl in secondi
const COMPARE_AND_SET_SCRIPT: &str = r#"
local current = redis.call('GET', KEYS[1])
if not current then
    return 0
end
local decoded = cjson.decode(current)
local version = tonumber(decoded['version']) or 0
if version ~= tonumber(ARGV[1]) then
    return 0
end
redis.call('SET', KEYS[1], ARGV[2], 'EX', ARGV[3])
return 1
"#;

impl From<RedisError> for StoreError {
    fn from(e: RedisError) -> Self {
        if e.is_connection_refusal()
            || e.is_connection_dropped()
            || e.is_io_error()
            || e.is_timeout()
        {
            StoreError::Connection(e.to_string())
        } else {
            StoreError::Command(e.to_string())
        }
    }
}

#[derive(Clone)]
pub struct RedisJobStore {
    conn: ConnectionManager,
    key_prefix: String,
    compare_and_set: Script,
}

impl std::fmt::Debug for RedisJobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisJobStore")
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}

impl RedisJobStore {
    /// Apre la connessione. Il `ConnectionManager` ritenta la connessione con
    /// backoff esponenziale fino a `retries` volte, anche dopo una disconnessione.
    pub async fn connect(url: &str, key_prefix: &str, retries: usize) -> StoreResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new_with_backoff(
            client,
            BACKOFF_EXPONENT_BASE,
            BACKOFF_FACTOR_MS,
            retries,
        )
        .await?;

        tracing::info!("Connesso allo store job (prefisso chiavi \"{}\")", key_prefix);

        Ok(Self {
            conn,
            key_prefix: key_prefix.to_string(),
            compare_and_set: Script::new(COMPARE_AND_SET_SCRIPT),
        })
    }

    fn key(&self, id: &str) -> String {
        format!("{}{}", self.key_prefix, id)
    }
}

/// `SET ... EX` richiede almeno un secondo
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

/// Il prefisso finisce in un pattern `SCAN MATCH`: i metacaratteri glob vanno protetti
fn escape_glob(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl JobStore for RedisJobStore {
    async fn get(&self, id: &str) -> StoreResult<Option<JobRecord>> {
        let mut conn = self.conn.clone();
        let data: Option<String> = conn.get(self.key(id)).await?;

        match data {
            Some(raw) => Ok(Some(decode_record(&raw)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, record: &JobRecord, ttl: Duration) -> StoreResult<()> {
        let payload = encode_record(record)?;
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(self.key(&record.id), payload, ttl_secs(ttl))
            .await?;
        Ok(())
    }

    async fn put_if_version(
        &self,
        record: &JobRecord,
        expected_version: u64,
        ttl: Duration,
    ) -> StoreResult<bool> {
        let payload = encode_record(record)?;
        let mut conn = self.conn.clone();
        let written: i64 = self
            .compare_and_set
            .key(self.key(&record.id))
            .arg(expected_version)
            .arg(payload)
            .arg(ttl_secs(ttl))
            .invoke_async(&mut conn)
            .await?;
        Ok(written == 1)
    }

    async fn list_ids(&self) -> StoreResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", escape_glob(&self.key_prefix));
        let mut keys = Vec::new();
        {
            let mut iter: redis::AsyncIter<String> = conn.scan_match(&pattern).await?;
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
        }

        Ok(keys
            .into_iter()
            .filter_map(|key| key.strip_prefix(&self.key_prefix).map(str::to_string))
            .collect())
    }

    async fn purge_expired(&self) -> StoreResult<usize> {
        Ok(0)
    }

    fn has_native_expiry(&self) -> bool {
        true
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
