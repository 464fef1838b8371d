//! Repository dei job: unico punto di accesso allo stato dei job per API e worker

use std::time::Duration;

use chrono::Utc;

use crate::db::{SharedJobStore, StoreError};
use crate::error::{AppError, Result};
use crate::models::{ClaimedJob, JobParameter, JobRecord, JobResult, JobStatus, JobStatusView};

#[derive(Clone)]
pub struct JobRepository {
    store: SharedJobStore,
    retention: Duration,
    lease_timeout: Duration,
}

impl std::fmt::Debug for JobRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobRepository")
            .field("retention", &self.retention)
            .field("lease_timeout", &self.lease_timeout)
            .finish()
    }
}

impl JobRepository {
    pub fn new(store: SharedJobStore, retention: Duration, lease_timeout: Duration) -> Self {
        Self {
            store,
            retention,
            lease_timeout,
        }
    }

    pub fn store(&self) -> &SharedJobStore {
        &self.store
    }

    /// Crea un job in attesa e ne restituisce l'id
    pub async fn create_job(&self, parameter: JobParameter) -> Result<String> {
        let record = JobRecord::new(parameter);
        self.store.put(&record, self.retention).await?;

        tracing::debug!(
            job_id = %record.id,
            size = record.parameter.file_data.len(),
            "Job creato"
        );

        Ok(record.id)
    }

    /// Stato del job, `None` se sconosciuto o scaduto
    pub async fn get_job_status(&self, id: &str) -> Result<Option<JobStatusView>> {
        Ok(self.store.get(id).await?.map(|record| record.to_status()))
    }

    /// Risultato del job, presente solo se il job è completato
    pub async fn get_job_result(&self, id: &str) -> Result<Option<JobResult>> {
        Ok(self
            .store
            .get(id)
            .await?
            .filter(|record| record.status == JobStatus::Completed)
            .and_then(|record| record.result))
    }

    /// Prende in carico un job in attesa (o con lease scaduto) portandolo in `processing`.
    ///
    /// La presa in carico è una scrittura condizionata sulla versione del record:
    /// se un altro worker ha modificato il job nel frattempo, il job viene saltato.
    pub async fn get_pending_job(&self) -> Result<Option<ClaimedJob>> {
        let lease = self.lease();

        for id in self.store.list_ids().await? {
            let record = match self.store.get(&id).await {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                // Un record illeggibile non deve bloccare gli altri job
                Err(StoreError::Serialization(e)) => {
                    tracing::warn!(job_id = %id, "Record job illeggibile, saltato: {}", e);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let now = Utc::now();
            if !record.is_claimable(now, lease) {
                continue;
            }

            let expected_version = record.version;
            let reclaimed = record.status == JobStatus::Processing;
            let mut claimed = record;
            claimed.mark_processing(now)?;

            if !self
                .store
                .put_if_version(&claimed, expected_version, self.retention)
                .await?
            {
                tracing::debug!(job_id = %id, "Job preso in carico da un altro worker");
                continue;
            }

            if reclaimed {
                tracing::warn!(
                    job_id = %id,
                    attempt = claimed.attempts,
                    "Lease scaduto, job ripreso in carico"
                );
            }

            return Ok(Some(ClaimedJob {
                job_id: claimed.id,
                parameter: claimed.parameter,
                attempt: claimed.attempts,
            }));
        }

        Ok(None)
    }

    /// Durata del lease; zero disattiva la ripresa dei job abbandonati
    fn lease(&self) -> chrono::Duration {
        let never = chrono::Duration::days(36_500);
        if self.lease_timeout.is_zero() {
            return never;
        }
        chrono::Duration::from_std(self.lease_timeout).unwrap_or(never)
    }

    /// Porta un job in elaborazione a `completed` con il risultato.
    ///
    /// `attempt` è quello restituito dal claim: se nel frattempo il lease è
    /// scaduto e il job è stato ripreso da un altro worker, la scrittura è
    /// rifiutata con `JobConflict`.
    pub async fn complete_job(&self, id: &str, attempt: u32, result: JobResult) -> Result<()> {
        self.finish(id, attempt, |record| record.mark_completed(result, Utc::now()))
            .await
    }

    /// Porta un job in elaborazione a `failed` con il messaggio d'errore
    pub async fn fail_job(&self, id: &str, attempt: u32, error: impl Into<String>) -> Result<()> {
        let error = error.into();
        self.finish(id, attempt, |record| record.mark_failed(error, Utc::now()))
            .await
    }

    async fn finish<F>(&self, id: &str, attempt: u32, apply: F) -> Result<()>
    where
        F: FnOnce(&mut JobRecord) -> Result<()>,
    {
        let mut record = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| AppError::JobNotFound(id.to_string()))?;

        let expected_version = record.version;
        apply(&mut record)?;

        if record.attempts != attempt {
            tracing::warn!(
                job_id = %id,
                attempt,
                current = record.attempts,
                "Esito scartato: job ripreso da un altro worker"
            );
            return Err(AppError::JobConflict(id.to_string()));
        }

        if !self
            .store
            .put_if_version(&record, expected_version, self.retention)
            .await?
        {
            return Err(AppError::JobConflict(id.to_string()));
        }

        Ok(())
    }

    /// Rimuove i job scaduti. Con uno store a scadenza nativa non fa nulla.
    pub async fn cleanup_old_jobs(&self) -> Result<usize> {
        if self.store.has_native_expiry() {
            tracing::debug!("Job scaduti rimossi automaticamente dal TTL dello store");
            return Ok(0);
        }

        let removed = self.store.purge_expired().await?;
        Ok(removed)
    }
}
