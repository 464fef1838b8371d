//! Store job in memoria, per i test e per i processi senza Redis.
//!
//! Conserva i record già serializzati, come farebbe uno store remoto. Non ha
//! scadenza nativa: i record scaduti sono invisibili alle letture ma restano in
//! memoria finché `purge_expired` non li rimuove.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::models::JobRecord;

use super::codec::{decode_record, encode_record};
use super::{JobStore, StoreResult};

#[derive(Debug)]
struct Entry {
    payload: String,
    version: u64,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Default)]
pub struct MemoryJobStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Numero di record fisicamente presenti, scaduti inclusi
    pub async fn stored_count(&self) -> usize {
        self.entries.lock().await.len()
    }

    fn entry_for(record: &JobRecord, ttl: Duration) -> StoreResult<Entry> {
        Ok(Entry {
            payload: encode_record(record)?,
            version: record.version,
            expires_at: Instant::now() + ttl,
        })
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn get(&self, id: &str) -> StoreResult<Option<JobRecord>> {
        let entries = self.entries.lock().await;
        match entries.get(id) {
            Some(entry) if !entry.is_expired(Instant::now()) => {
                Ok(Some(decode_record(&entry.payload)?))
            }
            _ => Ok(None),
        }
    }

    async fn put(&self, record: &JobRecord, ttl: Duration) -> StoreResult<()> {
        let entry = Self::entry_for(record, ttl)?;
        self.entries.lock().await.insert(record.id.clone(), entry);
        Ok(())
    }

    async fn put_if_version(
        &self,
        record: &JobRecord,
        expected_version: u64,
        ttl: Duration,
    ) -> StoreResult<bool> {
        let entry = Self::entry_for(record, ttl)?;
        let mut entries = self.entries.lock().await;

        let matches = entries
            .get(&record.id)
            .map(|current| {
                !current.is_expired(Instant::now()) && current.version == expected_version
            })
            .unwrap_or(false);

        if matches {
            entries.insert(record.id.clone(), entry);
        }
        Ok(matches)
    }

    async fn list_ids(&self) -> StoreResult<Vec<String>> {
        let now = Instant::now();
        let entries = self.entries.lock().await;
        Ok(entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(id, _)| id.clone())
            .collect())
    }

    async fn purge_expired(&self) -> StoreResult<usize> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        Ok(before - entries.len())
    }

    fn has_native_expiry(&self) -> bool {
        false
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobParameter;

    const TTL: Duration = Duration::from_secs(60);

    fn sample_record() -> JobRecord {
        JobRecord::new(JobParameter::new(vec![1, 2, 3], "a.bin"))
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let store = MemoryJobStore::new();
        let record = sample_record();
        store.put(&record, TTL).await.unwrap();

        assert_eq!(store.get(&record.id).await.unwrap(), Some(record.clone()));
        assert_eq!(store.list_ids().await.unwrap(), vec![record.id.clone()]);
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_if_version() {
        let store = MemoryJobStore::new();
        let mut record = sample_record();
        store.put(&record, TTL).await.unwrap();

        record.version = 1;
        assert!(store.put_if_version(&record, 0, TTL).await.unwrap());
        // La versione salvata ora è 1: un secondo scrittore con la vista vecchia perde
        assert!(!store.put_if_version(&record, 0, TTL).await.unwrap());

        let mut unknown = sample_record();
        unknown.version = 1;
        assert!(!store.put_if_version(&unknown, 0, TTL).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_and_purge() {
        let store = MemoryJobStore::new();
        let record = sample_record();
        store.put(&record, Duration::from_secs(10)).await.unwrap();

        tokio::time::advance(Duration::from_secs(11)).await;

        assert!(store.get(&record.id).await.unwrap().is_none());
        assert!(store.list_ids().await.unwrap().is_empty());
        assert_eq!(store.stored_count().await, 1);

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.stored_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_refreshes_expiry() {
        let store = MemoryJobStore::new();
        let record = sample_record();
        store.put(&record, Duration::from_secs(10)).await.unwrap();

        tokio::time::advance(Duration::from_secs(8)).await;
        store.put(&record, Duration::from_secs(10)).await.unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;

        assert!(store.get(&record.id).await.unwrap().is_some());
    }
}
