use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::JobResult;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Stati da cui il job non esce più
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Tabella delle transizioni ammesse.
    ///
    /// `processing -> processing` è la ripresa di un lease scaduto.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Input immutabile di un job: contenuto del file e nome originale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobParameter {
    /// Serializzato come array numerico semplice
    pub file_data: Vec<u8>,
    pub file_name: String,
}

impl JobParameter {
    pub fn new(file_data: impl Into<Vec<u8>>, file_name: impl Into<String>) -> Self {
        Self {
            file_data: file_data.into(),
            file_name: file_name.into(),
        }
    }
}

/// Record persistito nello store, uno per job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: String,
    pub parameter: JobParameter,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Inizio del lease dell'ultimo claim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub version: u64,
}

impl JobRecord {
    pub fn new(parameter: JobParameter) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            parameter,
            status: JobStatus::Pending,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
            claimed_at: None,
            attempts: 0,
            version: 0,
        }
    }

    /// Il job può essere preso in carico: in attesa, oppure in elaborazione
    /// con un lease più vecchio di `lease_timeout`
    pub fn is_claimable(&self, now: DateTime<Utc>, lease_timeout: chrono::Duration) -> bool {
        match self.status {
            JobStatus::Pending => true,
            JobStatus::Processing => self
                .claimed_at
                .map(|claimed| now - claimed >= lease_timeout)
                .unwrap_or(true),
            _ => false,
        }
    }

    pub fn mark_processing(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition(JobStatus::Processing, now)?;
        self.claimed_at = Some(self.updated_at);
        self.attempts += 1;
        Ok(())
    }

    pub fn mark_completed(&mut self, result: JobResult, now: DateTime<Utc>) -> Result<()> {
        self.transition(JobStatus::Completed, now)?;
        self.result = Some(result);
        self.error = None;
        Ok(())
    }

    pub fn mark_failed(&mut self, error: String, now: DateTime<Utc>) -> Result<()> {
        self.transition(JobStatus::Failed, now)?;
        self.error = Some(error);
        self.result = None;
        Ok(())
    }

    fn transition(&mut self, next: JobStatus, now: DateTime<Utc>) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::InvalidTransition {
                id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        // updated_at non scende mai sotto created_at o sotto la transizione precedente
        self.updated_at = now.max(self.updated_at);
        self.version += 1;
        Ok(())
    }

    pub fn to_status(&self) -> JobStatusView {
        JobStatusView {
            job_id: self.id.clone(),
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            error: self.error.clone(),
        }
    }
}

/// Proiezione pubblica dello stato di un job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusView {
    pub job_id: String,
    pub status: JobStatus,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Job preso in carico dal worker
#[derive(Debug, Clone)]
pub struct ClaimedJob {
    pub job_id: String,
    pub parameter: JobParameter,
    pub attempt: u32,
}
