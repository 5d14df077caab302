//! Batch types.
//!
//! A batch is a fan-out of single-job submissions sharing one set of
//! options. Aggregated status and results preserve submission order, and
//! each entry carries its own outcome: one failed job never hides the
//! others.

use serde::{Deserialize, Serialize};

use crate::job::{JobId, JobResult, JobStatus};

/// Marker carried by lookups on batch handles the backend never issued.
pub const UNKNOWN_BATCH: &str = "unknown-batch";

/// Opaque batch handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(pub String);

impl BatchId {
    /// Create a new batch ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handles produced by a batch submission, in submission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSubmission {
    /// Batch handle.
    pub batch_id: BatchId,
    /// One handle per submitted circuit.
    pub job_ids: Vec<JobId>,
}

/// Per-job status of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStatus {
    /// Batch handle.
    pub batch_id: BatchId,
    /// `(handle, status)` in submission order.
    pub jobs: Vec<(JobId, JobStatus)>,
    /// `unknown-batch` when the handle was never issued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchStatus {
    /// Lookup result for a handle that was never issued.
    pub fn unknown(batch_id: BatchId) -> Self {
        Self {
            batch_id,
            jobs: vec![],
            error: Some(UNKNOWN_BATCH.to_string()),
        }
    }

    /// Whether the handle was never issued.
    pub fn is_unknown_batch(&self) -> bool {
        self.error.as_deref() == Some(UNKNOWN_BATCH)
    }

    /// Number of jobs in `status`.
    pub fn count(&self, status: JobStatus) -> usize {
        self.jobs.iter().filter(|(_, s)| *s == status).count()
    }

    /// Single status summarizing the batch.
    ///
    /// Any failure wins, then any cancellation; all completed is completed;
    /// all queued is queued; any pending job makes the batch running.
    pub fn overall(&self) -> JobStatus {
        if self.jobs.is_empty() {
            return JobStatus::Unknown;
        }
        let all = |s: JobStatus| self.jobs.iter().all(|(_, j)| *j == s);
        if self.count(JobStatus::Failed) > 0 {
            JobStatus::Failed
        } else if self.count(JobStatus::Cancelled) > 0 {
            JobStatus::Cancelled
        } else if all(JobStatus::Completed) {
            JobStatus::Completed
        } else if all(JobStatus::Queued) {
            JobStatus::Queued
        } else if self.jobs.iter().any(|(_, s)| s.is_pending()) {
            JobStatus::Running
        } else {
            JobStatus::Unknown
        }
    }
}

/// Per-job results of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResults {
    /// Batch handle.
    pub batch_id: BatchId,
    /// One result per job, in submission order.
    pub results: Vec<JobResult>,
    /// `unknown-batch` when the handle was never issued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchResults {
    /// Lookup result for a handle that was never issued.
    pub fn unknown(batch_id: BatchId) -> Self {
        Self {
            batch_id,
            results: vec![],
            error: Some(UNKNOWN_BATCH.to_string()),
        }
    }

    /// Whether the handle was never issued.
    pub fn is_unknown_batch(&self) -> bool {
        self.error.as_deref() == Some(UNKNOWN_BATCH)
    }

    /// Results that carry usable measurements.
    pub fn successful(&self) -> impl Iterator<Item = &JobResult> {
        self.results.iter().filter(|r| r.is_success())
    }
}
