//! Backend trait and configuration.
//!
//! The [`Backend`] trait is the provider-neutral contract. A concrete
//! adapter implements it once; provider-specific extras live in a second
//! trait next to the adapter rather than here.
//!
//! ## Method table
//!
//! | Method | Kind | Returns |
//! |--------|------|---------|
//! | `name()` / `capabilities()` / `supported_gates()` | sync | introspection |
//! | `availability()` / `queue_status()` | async | liveness and queue depth |
//! | `authenticate()` | async | stores a credential |
//! | `submit()` / `status()` / `result()` / `cancel()` | async | single-job lifecycle |
//! | `batch_submit()` / `batch_status()` / `batch_results()` | async | fan-out lifecycle |
//! | `list_devices()` / `device_topology()` / `calibration()` | async | device data |
//! | `estimate_cost()` | sync | pure cost model |
//! | `validate()` / `wait()` | async, provided | convenience |

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use qrelay_ir::Circuit;

use crate::batch::{BatchId, BatchResults, BatchStatus, BatchSubmission};
use crate::capability::{Capabilities, Topology};
use crate::cost::CostEstimate;
use crate::device::{CalibrationData, DeviceInfo};
use crate::error::{HalError, HalResult};
use crate::job::{CancelOutcome, JobId, JobResult, JobStatus, QueueStatus, SubmitOptions};

/// Configuration for a backend instance.
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Name of the backend.
    pub name: String,
    /// API endpoint URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Authentication token.
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Additional configuration.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl BackendConfig {
    /// Create a new backend configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: None,
            token: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Set the endpoint URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the authentication token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Add extra configuration.
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// String value of an extra key.
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(serde_json::Value::as_str)
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("token", &"[REDACTED]")
            .field("extra", &self.extra)
            .finish()
    }
}

/// Trait for quantum backends.
///
/// # Contract
///
/// - `capabilities()` MUST be synchronous and infallible.
/// - `submit()` returns a locally generated handle; the same handle is never
///   issued twice by one instance.
/// - `status()` on a handle never issued returns `Unknown` without I/O.
/// - `result()` on a handle never issued returns a failed-shaped
///   [`JobResult`] marked `unknown-job`; it does not return `Err`.
/// - Batch lookups on a handle never issued return values marked
///   `unknown-batch`.
/// - `estimate_cost()` is pure: no I/O, deterministic.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Get the capabilities of this backend.
    fn capabilities(&self) -> &Capabilities;

    /// Gate names accepted by `submit()`.
    fn supported_gates(&self) -> Vec<String> {
        self.capabilities()
            .gate_set
            .all()
            .map(str::to_string)
            .collect()
    }

    /// Check backend availability.
    async fn availability(&self) -> HalResult<BackendAvailability>;

    /// Queue depth of a device.
    async fn queue_status(&self, device: &str) -> HalResult<QueueStatus>;

    /// Store a credential for subsequent calls.
    ///
    /// A blank credential MUST be rejected before any network call.
    async fn authenticate(&self, token: &str) -> HalResult<()>;

    /// Submit a circuit for execution.
    async fn submit(&self, circuit: &Circuit, options: &SubmitOptions) -> HalResult<JobId>;

    /// Get the canonical status of a job.
    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus>;

    /// Fetch and normalize the result of a job.
    async fn result(&self, job_id: &JobId) -> HalResult<JobResult>;

    /// Request cancellation of a job.
    async fn cancel(&self, job_id: &JobId) -> HalResult<CancelOutcome>;

    /// Submit every circuit with the same options and group the handles.
    async fn batch_submit(
        &self,
        circuits: &[Circuit],
        options: &SubmitOptions,
    ) -> HalResult<BatchSubmission>;

    /// Status of every job in a batch, in submission order.
    async fn batch_status(&self, batch_id: &BatchId) -> HalResult<BatchStatus>;

    /// Result of every job in a batch, in submission order.
    async fn batch_results(&self, batch_id: &BatchId) -> HalResult<BatchResults>;

    /// Devices offered by the provider.
    async fn list_devices(&self) -> HalResult<Vec<DeviceInfo>>;

    /// Coupling map of a device.
    async fn device_topology(&self, device: &str) -> HalResult<Topology>;

    /// Latest calibration of a device.
    async fn calibration(&self, device: &str) -> HalResult<CalibrationData>;

    /// Estimate the cost of running `circuit` for `shots` shots on `device`.
    fn estimate_cost(&self, circuit: &Circuit, shots: u32, device: &str) -> CostEstimate;

    /// Validate a circuit against cached capabilities.
    async fn validate(&self, circuit: &Circuit) -> HalResult<ValidationResult> {
        let caps = self.capabilities();
        let mut reasons = Vec::new();

        if circuit.num_qubits() > caps.num_qubits as usize {
            reasons.push(format!(
                "Circuit requires {} qubits but backend only has {}",
                circuit.num_qubits(),
                caps.num_qubits
            ));
        }

        for gate in circuit.instructions().iter().filter_map(|i| i.as_gate()) {
            if !caps.gate_set.contains(gate.name()) {
                reasons.push(format!("Unsupported gate: {}", gate.name()));
                break;
            }
        }

        if reasons.is_empty() {
            Ok(ValidationResult::Valid)
        } else {
            Ok(ValidationResult::Invalid { reasons })
        }
    }

    /// Wait for a job to finish and return its result.
    ///
    /// Polls every 500ms for up to 5 minutes. `Unknown` keeps polling.
    async fn wait(&self, job_id: &JobId) -> HalResult<JobResult> {
        use tokio::time::sleep;

        let poll_interval = Duration::from_millis(500);
        let max_polls = 600;

        for _ in 0..max_polls {
            match self.status(job_id).await? {
                JobStatus::Completed => return self.result(job_id).await,
                JobStatus::Failed => return Err(HalError::JobFailed(job_id.0.clone())),
                JobStatus::Cancelled => return Err(HalError::JobCancelled),
                status @ (JobStatus::Queued | JobStatus::Running | JobStatus::Unknown) => {
                    debug!(%job_id, %status, "job not finished, polling again");
                    sleep(poll_interval).await;
                }
            }
        }

        Err(HalError::Timeout(job_id.0.clone()))
    }
}

/// Backend availability information.
#[derive(Debug, Clone)]
pub struct BackendAvailability {
    /// Whether the backend is currently accepting jobs.
    pub is_available: bool,
    /// Number of jobs currently in queue (if known).
    pub queue_depth: Option<u32>,
    /// Estimated wait time for a new job (if known).
    pub estimated_wait: Option<Duration>,
    /// Human-readable status message.
    pub status_message: Option<String>,
}

impl BackendAvailability {
    /// Availability for a backend that is always available.
    pub fn always_available() -> Self {
        Self {
            is_available: true,
            queue_depth: Some(0),
            estimated_wait: Some(Duration::ZERO),
            status_message: None,
        }
    }

    /// Availability for an offline backend.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            is_available: false,
            queue_depth: None,
            estimated_wait: None,
            status_message: Some(reason.into()),
        }
    }
}

/// Result of circuit validation against backend constraints.
#[derive(Debug, Clone)]
pub enum ValidationResult {
    /// Circuit is valid and can be submitted directly.
    Valid,
    /// Circuit is invalid for this backend.
    Invalid {
        /// Reasons the circuit is invalid.
        reasons: Vec<String>,
    },
}

impl ValidationResult {
    /// Check if the circuit is valid.
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }
}

/// Trait for creating backends from configuration.
pub trait BackendFactory: Backend + Sized {
    /// Create a backend from configuration.
    fn from_config(config: BackendConfig) -> HalResult<Self>;
}
