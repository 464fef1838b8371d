//! Worker di polling: prende in carico un job alla volta e lo classifica

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{ClaimedJob, JobResult};
use crate::services::classifier::SharedClassifier;

use super::JobRepository;

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub poll_interval: Duration,
    pub cleanup_interval: Duration,
    pub classify_timeout: Duration,
}

impl From<&Config> for WorkerSettings {
    fn from(config: &Config) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            cleanup_interval: config.cleanup_interval(),
            classify_timeout: config.classify_timeout(),
        }
    }
}

pub struct Worker {
    repository: JobRepository,
    classifier: SharedClassifier,
    settings: WorkerSettings,
}

impl Worker {
    pub fn new(
        repository: JobRepository,
        classifier: SharedClassifier,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            repository,
            classifier,
            settings,
        }
    }

    /// Ciclo principale: un tick di polling e un tick di cleanup indipendenti,
    /// fino a quando `shutdown` si completa
    pub async fn run<S>(self, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        let mut poll = tokio::time::interval(self.settings.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut cleanup = tokio::time::interval(self.settings.cleanup_interval);
        cleanup.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Il primo tick di un interval è immediato: il cleanup parte dopo un intervallo pieno
        cleanup.reset();

        tokio::pin!(shutdown);

        tracing::info!(
            "Worker avviato (polling ogni {} ms, cleanup ogni {} ms)",
            self.settings.poll_interval.as_millis(),
            self.settings.cleanup_interval.as_millis()
        );

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("Arresto del worker richiesto");
                    break;
                }
                _ = poll.tick() => {
                    if let Err(e) = self.process_next_job().await {
                        tracing::error!("Errore worker: {}", e);
                    }
                }
                _ = cleanup.tick() => {
                    self.cleanup().await;
                }
            }
        }

        tracing::info!("Worker arrestato");
    }

    /// Un singolo tick: `Ok(false)` se non c'era nessun job da elaborare
    pub async fn process_next_job(&self) -> Result<bool> {
        let Some(job) = self.repository.get_pending_job().await? else {
            return Ok(false);
        };

        tracing::info!(
            job_id = %job.job_id,
            attempt = job.attempt,
            "Elaborazione job ({} byte)",
            job.parameter.file_data.len()
        );

        match self.execute(&job).await {
            Ok(result) => {
                let file_type = result.file_type.clone();
                self.repository
                    .complete_job(&job.job_id, job.attempt, result)
                    .await?;
                tracing::info!(job_id = %job.job_id, "Job completato: {}", file_type);
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(job_id = %job.job_id, "Job fallito: {}", message);
                self.repository
                    .fail_job(&job.job_id, job.attempt, message)
                    .await?;
            }
        }

        Ok(true)
    }

    async fn execute(&self, job: &ClaimedJob) -> Result<JobResult> {
        let outcome = tokio::time::timeout(
            self.settings.classify_timeout,
            self.classifier.classify(&job.parameter.file_data),
        )
        .await
        .map_err(|_| {
            AppError::Classification(format!(
                "nessuna risposta entro {} ms",
                self.settings.classify_timeout.as_millis()
            ))
        })??;

        JobResult::from_outcome(&job.parameter.file_name, outcome)
    }

    pub async fn cleanup(&self) {
        tracing::info!("Avvio cleanup job vecchi...");
        match self.repository.cleanup_old_jobs().await {
            Ok(count) => tracing::info!("Cleanup completato: {} job eliminati", count),
            Err(e) => tracing::error!("Errore cleanup: {}", e),
        }
    }
}
