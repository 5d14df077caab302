//! IBM-specific operations beyond the generic backend contract.

use async_trait::async_trait;
use serde_json::Value;

use qrelay_hal::{HalResult, JobId, MISSING_PROVIDER_ID, UNKNOWN_JOB};

use crate::normalize::parse_document;
use crate::session::{Session, SessionClosure, SessionInfo, SessionOptions};
use crate::transport::OperationResponse;

/// A provider document returned as-is (metrics, logs, analytics).
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderDocument {
    /// Local job handle, for job-scoped documents.
    pub job_id: Option<JobId>,
    /// Provider status code, if a request was made.
    pub status_code: Option<u16>,
    /// Body, parsed when it is a JSON document and raw text otherwise.
    pub body: Value,
    /// Failure marker or message.
    pub error: Option<String>,
}

impl ProviderDocument {
    /// Document for a job handle that was never issued.
    pub fn unknown_job(job_id: JobId) -> Self {
        Self::marker(job_id, UNKNOWN_JOB)
    }

    /// Document for a job whose provider id was never learned.
    pub fn missing_provider_id(job_id: JobId) -> Self {
        Self::marker(job_id, MISSING_PROVIDER_ID)
    }

    fn marker(job_id: JobId, marker: &str) -> Self {
        Self {
            job_id: Some(job_id),
            status_code: None,
            body: Value::Null,
            error: Some(marker.to_string()),
        }
    }

    /// Document from a provider response.
    pub fn from_response(job_id: Option<JobId>, response: &OperationResponse) -> Self {
        let body = parse_document(&response.body)
            .map(|doc| doc.into_owned())
            .unwrap_or_else(|| response.body.clone());
        Self {
            job_id,
            status_code: Some(response.status),
            body,
            error: (!response.is_success())
                .then(|| format!("provider returned HTTP {}", response.status)),
        }
    }

    /// Whether the provider answered with a success status.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// IBM Quantum extension surface.
///
/// Job-scoped lookups follow the same rules as the contract's `result()`:
/// a handle that was never issued yields a document marked `unknown-job`
/// without any network call.
#[async_trait]
pub trait IbmExtensions: Send + Sync {
    /// Execution metrics of a job.
    async fn job_metrics(&self, job_id: &JobId) -> HalResult<ProviderDocument>;

    /// Provider-side logs of a job.
    async fn job_logs(&self, job_id: &JobId) -> HalResult<ProviderDocument>;

    /// Circuits as transpiled by the provider.
    async fn transpiled_circuits(&self, job_id: &JobId) -> HalResult<ProviderDocument>;

    /// Open a session. Requires a credential.
    async fn create_session(&self, options: &SessionOptions) -> HalResult<Session>;

    /// Close a session. Never fails.
    async fn close_session(&self, session_id: &str) -> SessionClosure;

    /// Provider view of a session merged with the local record.
    async fn session_info(&self, session_id: &str) -> SessionInfo;

    /// Account usage analytics.
    async fn usage_analytics(&self) -> HalResult<ProviderDocument>;
}
