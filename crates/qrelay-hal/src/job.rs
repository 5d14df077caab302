//! Job lifecycle types.
//!
//! The canonical status vocabulary:
//!
//! ```text
//!   submit() ──→ Queued ──→ Running ──→ Completed
//!                  │           │
//!                  │           ├──→ Failed
//!                  │           │
//!                  └───────────┴──→ Cancelled
//!
//!   Unknown: provider text not recognized, or handle never issued.
//! ```
//!
//! `Unknown` is not terminal. A poller that sees it should keep polling or
//! give up on its own schedule; it must not conclude the job failed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::result::Counts;

/// Marker carried by results for handles the backend never issued.
pub const UNKNOWN_JOB: &str = "unknown-job";

/// Marker carried by results for jobs whose provider id was never learned.
pub const MISSING_PROVIDER_ID: &str = "missing-provider-id";

/// Opaque job handle issued by a backend.
///
/// Handles are generated locally and are unrelated to the provider's own
/// job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    /// Create a new job ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Canonical status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Job is waiting in queue.
    Queued,
    /// Job is currently running.
    Running,
    /// Job completed successfully.
    Completed,
    /// Job was cancelled.
    Cancelled,
    /// Job failed.
    Failed,
    /// Status could not be determined.
    Unknown,
}

impl JobStatus {
    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Failed => "failed",
            JobStatus::Unknown => "unknown",
        }
    }

    /// Check if this is a terminal state. `Unknown` is not.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// Check if the job is still pending (queued or running).
    pub fn is_pending(&self) -> bool {
        matches!(self, JobStatus::Queued | JobStatus::Running)
    }

    /// Check if the job completed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Completed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for a single submission.
///
/// Optional fields left as `None` never reach the provider request; they
/// are omitted, not sent as null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitOptions {
    /// Target device identifier. Required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    /// Provider-side program identifier (e.g. `sampler`). Required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_id: Option<String>,
    /// Number of shots.
    pub shots: u32,
    /// Job tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Provider log level for the job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    /// Runtime image or version hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    /// Cost ceiling hint, in seconds of processor time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_execution_time: Option<u64>,
    /// Provider session to run inside.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl SubmitOptions {
    /// Options for `shots` shots with nothing else set.
    pub fn new(shots: u32) -> Self {
        Self {
            shots,
            ..Self::default()
        }
    }

    /// Set the target device.
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    /// Set the provider program.
    pub fn with_program(mut self, program_id: impl Into<String>) -> Self {
        self.program_id = Some(program_id.into());
        self
    }

    /// Set job tags.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Set provider log level.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// Set runtime hint.
    pub fn with_runtime(mut self, runtime: impl Into<String>) -> Self {
        self.runtime = Some(runtime.into());
        self
    }

    /// Set the processor-time ceiling.
    pub fn with_max_execution_time(mut self, seconds: u64) -> Self {
        self.max_execution_time = Some(seconds);
        self
    }

    /// Run inside a provider session.
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Canonical result of a job.
///
/// Result lookups are total: a handle the backend never issued produces a
/// failed-shaped value with `error == Some(UNKNOWN_JOB)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    /// Status implied by the fetch.
    pub status: JobStatus,
    /// Local handle.
    pub job_id: JobId,
    /// Provider job id, if known.
    pub provider_id: Option<String>,
    /// Measurement structure as returned by the provider.
    pub measurements: serde_json::Value,
    /// Unmodified response body.
    pub raw: serde_json::Value,
    /// Failure marker or message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobResult {
    /// Failed-shaped result for a handle that was never issued.
    pub fn unknown(job_id: JobId) -> Self {
        Self::failed(job_id, None, UNKNOWN_JOB)
    }

    /// Failed-shaped result with an error message.
    pub fn failed(job_id: JobId, provider_id: Option<String>, error: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            job_id,
            provider_id,
            measurements: serde_json::Value::Object(serde_json::Map::new()),
            raw: serde_json::Value::Null,
            error: Some(error.into()),
        }
    }

    /// Whether this result refers to a handle the backend never issued.
    pub fn is_unknown_job(&self) -> bool {
        self.error.as_deref() == Some(UNKNOWN_JOB)
    }

    /// Whether the fetch produced usable measurements.
    pub fn is_success(&self) -> bool {
        self.status.is_success() && self.error.is_none()
    }

    /// Interpret the measurements as a bitstring → count mapping.
    ///
    /// Non-integer values are skipped; a non-object measurement structure
    /// yields empty counts.
    pub fn counts(&self) -> Counts {
        Counts::from_value(&self.measurements)
    }
}

/// Outcome of a cancellation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelOutcome {
    /// Local handle.
    pub job_id: JobId,
    /// Whether the provider acknowledged the request with a success status.
    pub accepted: bool,
    /// Provider status code, if any operation responded.
    pub status_code: Option<u16>,
    /// Failure marker or message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CancelOutcome {
    /// Outcome for a handle that was never issued.
    pub fn unknown(job_id: JobId) -> Self {
        Self {
            job_id,
            accepted: false,
            status_code: None,
            error: Some(UNKNOWN_JOB.to_string()),
        }
    }
}

/// Queue snapshot for a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueStatus {
    /// Device identifier.
    pub device: String,
    /// Jobs waiting ahead of a new submission.
    pub pending_jobs: Option<u32>,
    /// Whether the device accepts work.
    pub operational: Option<bool>,
    /// Provider status text.
    pub status_message: Option<String>,
    /// When the snapshot was taken.
    pub observed_at: DateTime<Utc>,
}
