//! IBM Quantum backend implementation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::HeaderValue;
use tracing::{debug, info, instrument, warn};

use qrelay_hal::{
    Backend, BackendAvailability, BackendConfig, BackendFactory, BatchId, BatchResults,
    BatchStatus, BatchSubmission, CalibrationData, CancelOutcome, Capabilities, CostEstimate,
    DeviceInfo, HalError, HalResult, JobId, JobResult, JobStatus, MISSING_PROVIDER_ID,
    QueueStatus, SubmitOptions, Topology,
};
use qrelay_ir::Circuit;

use crate::config::IbmConfig;
use crate::cost;
use crate::device::{
    capabilities_for, parse_calibration, parse_device_list, parse_queue_status, parse_topology,
};
use crate::dispatch::{Action, Dispatcher};
use crate::error::{IbmError, IbmResult};
use crate::extensions::{IbmExtensions, ProviderDocument};
use crate::normalize;
use crate::request::{CreateJobRequest, validate_options};
use crate::session::{self, Session, SessionClosure, SessionInfo, SessionOptions};
use crate::state::{AdapterState, JobRecord};
use crate::transport::{HttpTransport, OperationRequest, OperationResponse, Transport};

/// IBM Quantum backend adapter.
///
/// Job handles returned by [`Backend::submit`] are generated locally and
/// map to provider job ids through the adapter's registry. All lookups on
/// handles this instance never issued are answered locally.
///
/// # Example
///
/// ```ignore
/// use qrelay_adapter_ibm::{IbmBackend, IbmConfig};
/// use qrelay_hal::Backend;
///
/// let backend = IbmBackend::new(IbmConfig::from_env())?;
/// let options = backend.default_options(1024);
/// let job = backend.submit(&circuit, &options).await?;
/// let result = backend.wait(&job).await?;
/// ```
pub struct IbmBackend {
    /// Adapter configuration.
    config: IbmConfig,
    /// Cached capabilities of the default target.
    capabilities: Capabilities,
    /// Alias-trying dispatcher.
    dispatcher: Dispatcher,
    /// Credential and registries.
    state: AdapterState,
}

impl std::fmt::Debug for IbmBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IbmBackend")
            .field("config", &self.config)
            .field("target", &self.capabilities.name)
            .finish_non_exhaustive()
    }
}

impl IbmBackend {
    /// Create a backend that talks HTTP to the configured endpoint.
    pub fn new(config: IbmConfig) -> IbmResult<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a backend configured from the environment.
    pub fn from_env() -> IbmResult<Self> {
        Self::new(IbmConfig::from_env())
    }

    /// Create a backend over an arbitrary transport.
    pub fn with_transport(config: IbmConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            capabilities: capabilities_for(&config.backend),
            dispatcher: Dispatcher::new(transport),
            state: AdapterState::with_token(config.token.clone()),
            config,
        }
    }

    /// Default target device.
    pub fn target(&self) -> &str {
        &self.config.backend
    }

    /// Adapter configuration.
    pub fn config(&self) -> &IbmConfig {
        &self.config
    }

    /// Submission options for the default target and program.
    pub fn default_options(&self, shots: u32) -> SubmitOptions {
        SubmitOptions::new(shots)
            .with_backend(self.config.backend.clone())
            .with_program(self.config.program_id.clone())
    }

    /// Registry entry for a job handle.
    pub async fn job_record(&self, job_id: &JobId) -> Option<JobRecord> {
        self.state.job(job_id).await
    }

    /// Ids of sessions opened by this instance and not yet closed.
    pub async fn open_sessions(&self) -> Vec<String> {
        self.state.session_ids().await
    }

    async fn credential(&self) -> Option<String> {
        self.state.token().await
    }

    async fn require_credential(&self) -> IbmResult<String> {
        self.state
            .token()
            .await
            .filter(|t| !t.trim().is_empty())
            .ok_or(IbmError::MissingToken)
    }

    async fn dispatch_or_fail(
        &self,
        action: Action,
        request: OperationRequest,
        credential: Option<&str>,
    ) -> IbmResult<OperationResponse> {
        self.dispatcher
            .dispatch(action, request, credential)
            .await
            .ok_or_else(|| IbmError::DispatchFailed(action.name().to_string()))
    }

    /// Dispatch a read-only device query and require a success status.
    async fn device_query(&self, action: Action, device: &str) -> IbmResult<OperationResponse> {
        let token = self.credential().await;
        let request = OperationRequest::new().param("backend_name", device);
        let response = self.dispatch_or_fail(action, request, token.as_deref()).await?;
        ensure_success(action, response)
    }

    /// Submit one circuit whose options were already validated.
    async fn submit_validated(
        &self,
        circuit: &Circuit,
        options: &SubmitOptions,
        token: &str,
    ) -> HalResult<JobId> {
        let request = CreateJobRequest::build(circuit, options)?;
        let payload = request.to_value()?;
        debug!(backend = %request.backend, program = %request.program_id, "create-job request built");

        let response = self
            .dispatch_or_fail(
                Action::CreateJob,
                OperationRequest::new().with_body(payload.clone()),
                Some(token),
            )
            .await?;

        let provider_id = if response.is_success() {
            normalize::provider_id(&response.body)
        } else {
            None
        };
        if provider_id.is_none() {
            warn!(status = response.status, "create-job response carried no provider id");
        }

        let job_id = self
            .state
            .register_job(JobRecord {
                provider_id: provider_id.clone(),
                backend: request.backend,
                submitted_at: Utc::now(),
                shots: options.shots,
                payload,
            })
            .await;
        info!(%job_id, provider_id = provider_id.as_deref().unwrap_or("-"), "job submitted");
        Ok(job_id)
    }

    /// Fetch a job-scoped provider document.
    async fn job_document(&self, action: Action, job_id: &JobId) -> HalResult<ProviderDocument> {
        let Some(record) = self.state.job(job_id).await else {
            return Ok(ProviderDocument::unknown_job(job_id.clone()));
        };
        let Some(provider_id) = record.provider_id else {
            return Ok(ProviderDocument::missing_provider_id(job_id.clone()));
        };

        let token = self.credential().await;
        let request = OperationRequest::new().param("id", provider_id);
        let response = self.dispatch_or_fail(action, request, token.as_deref()).await?;
        Ok(ProviderDocument::from_response(
            Some(job_id.clone()),
            &response,
        ))
    }
}

fn ensure_success(action: Action, response: OperationResponse) -> IbmResult<OperationResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(IbmError::ApiError {
            code: Some(response.status),
            message: format!("{action} returned HTTP {}", response.status),
        })
    }
}

#[async_trait]
impl Backend for IbmBackend {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ibm"
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    #[instrument(skip(self))]
    async fn availability(&self) -> HalResult<BackendAvailability> {
        let response = match self.device_query(Action::GetBackendStatus, self.target()).await {
            Ok(response) => response,
            Err(e) => {
                warn!("IBM backend availability check failed: {e}");
                return Ok(BackendAvailability::unavailable("failed to query backend"));
            }
        };

        let queue = parse_queue_status(self.target(), &response.body);
        if queue.operational == Some(false) {
            return Ok(BackendAvailability::unavailable(
                queue
                    .status_message
                    .unwrap_or_else(|| "backend offline".to_string()),
            ));
        }
        Ok(BackendAvailability {
            is_available: true,
            queue_depth: queue.pending_jobs,
            estimated_wait: None,
            status_message: queue.status_message,
        })
    }

    #[instrument(skip(self))]
    async fn queue_status(&self, device: &str) -> HalResult<QueueStatus> {
        let response = self.device_query(Action::GetBackendStatus, device).await?;
        Ok(parse_queue_status(device, &response.body))
    }

    #[instrument(skip(self, token))]
    async fn authenticate(&self, token: &str) -> HalResult<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(IbmError::MissingToken.into());
        }
        if HeaderValue::from_str(token).is_err() {
            return Err(IbmError::InvalidToken.into());
        }
        self.state.set_token(token).await;
        info!("credential updated");
        Ok(())
    }

    #[instrument(skip(self, circuit, options))]
    async fn submit(&self, circuit: &Circuit, options: &SubmitOptions) -> HalResult<JobId> {
        validate_options(options)?;
        let token = self.require_credential().await?;
        self.submit_validated(circuit, options, &token).await
    }

    #[instrument(skip(self))]
    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        let Some(record) = self.state.job(job_id).await else {
            debug!("status lookup on unknown job handle");
            return Ok(JobStatus::Unknown);
        };
        let Some(provider_id) = record.provider_id else {
            return Ok(JobStatus::Unknown);
        };

        let token = self.credential().await;
        let request = OperationRequest::new().param("id", provider_id);
        let response = self
            .dispatch_or_fail(Action::GetJob, request, token.as_deref())
            .await?;
        Ok(normalize::status_from_body(&response.body))
    }

    #[instrument(skip(self))]
    async fn result(&self, job_id: &JobId) -> HalResult<JobResult> {
        let Some(record) = self.state.job(job_id).await else {
            return Ok(JobResult::unknown(job_id.clone()));
        };
        let Some(provider_id) = record.provider_id else {
            return Ok(JobResult::failed(job_id.clone(), None, MISSING_PROVIDER_ID));
        };

        let token = self.credential().await;
        let request = OperationRequest::new().param("id", provider_id.clone());
        let response = self
            .dispatch_or_fail(Action::GetJobResults, request, token.as_deref())
            .await?;

        if response.is_success() {
            Ok(JobResult {
                status: JobStatus::Completed,
                job_id: job_id.clone(),
                provider_id: Some(provider_id),
                measurements: normalize::measurements(&response.body),
                raw: response.body,
                error: None,
            })
        } else {
            let mut result = JobResult::failed(
                job_id.clone(),
                Some(provider_id),
                format!("provider returned HTTP {}", response.status),
            );
            result.raw = response.body;
            Ok(result)
        }
    }

    #[instrument(skip(self))]
    async fn cancel(&self, job_id: &JobId) -> HalResult<CancelOutcome> {
        let Some(record) = self.state.job(job_id).await else {
            return Ok(CancelOutcome::unknown(job_id.clone()));
        };
        let Some(provider_id) = record.provider_id else {
            return Ok(CancelOutcome {
                job_id: job_id.clone(),
                accepted: false,
                status_code: None,
                error: Some(MISSING_PROVIDER_ID.to_string()),
            });
        };

        let token = self.credential().await;
        let request = OperationRequest::new().param("id", provider_id);
        let response = self
            .dispatch_or_fail(Action::CancelJob, request, token.as_deref())
            .await?;

        let accepted = response.is_success();
        if accepted {
            info!(%job_id, "job cancelled");
        }
        Ok(CancelOutcome {
            job_id: job_id.clone(),
            accepted,
            status_code: Some(response.status),
            error: (!accepted).then(|| format!("provider returned HTTP {}", response.status)),
        })
    }

    #[instrument(skip(self, circuits, options), fields(count = circuits.len()))]
    async fn batch_submit(
        &self,
        circuits: &[Circuit],
        options: &SubmitOptions,
    ) -> HalResult<BatchSubmission> {
        validate_options(options)?;
        let token = self.require_credential().await?;

        let mut job_ids = Vec::with_capacity(circuits.len());
        for circuit in circuits {
            job_ids.push(self.submit_validated(circuit, options, &token).await?);
        }

        let batch_id = self.state.register_batch(job_ids.clone()).await;
        info!(%batch_id, jobs = job_ids.len(), "batch submitted");
        Ok(BatchSubmission { batch_id, job_ids })
    }

    #[instrument(skip(self))]
    async fn batch_status(&self, batch_id: &BatchId) -> HalResult<BatchStatus> {
        let Some(record) = self.state.batch(batch_id).await else {
            return Ok(BatchStatus::unknown(batch_id.clone()));
        };

        let mut jobs = Vec::with_capacity(record.job_ids.len());
        for job_id in record.job_ids {
            let status = match self.status(&job_id).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(%job_id, "status lookup failed: {e}");
                    JobStatus::Unknown
                }
            };
            jobs.push((job_id, status));
        }

        Ok(BatchStatus {
            batch_id: batch_id.clone(),
            jobs,
            error: None,
        })
    }

    #[instrument(skip(self))]
    async fn batch_results(&self, batch_id: &BatchId) -> HalResult<BatchResults> {
        let Some(record) = self.state.batch(batch_id).await else {
            return Ok(BatchResults::unknown(batch_id.clone()));
        };

        let mut results = Vec::with_capacity(record.job_ids.len());
        for job_id in record.job_ids {
            let result = match self.result(&job_id).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(%job_id, "result fetch failed: {e}");
                    let provider_id = self.state.job(&job_id).await.and_then(|r| r.provider_id);
                    JobResult::failed(job_id, provider_id, e.to_string())
                }
            };
            results.push(result);
        }

        Ok(BatchResults {
            batch_id: batch_id.clone(),
            results,
            error: None,
        })
    }

    #[instrument(skip(self))]
    async fn list_devices(&self) -> HalResult<Vec<DeviceInfo>> {
        let token = self.credential().await;
        let response = self
            .dispatch_or_fail(Action::ListBackends, OperationRequest::new(), token.as_deref())
            .await?;
        let response = ensure_success(Action::ListBackends, response)?;
        Ok(parse_device_list(&response.body))
    }

    #[instrument(skip(self))]
    async fn device_topology(&self, device: &str) -> HalResult<Topology> {
        let response = self
            .device_query(Action::GetBackendConfiguration, device)
            .await?;
        Ok(parse_topology(&response.body))
    }

    #[instrument(skip(self))]
    async fn calibration(&self, device: &str) -> HalResult<CalibrationData> {
        let response = self
            .device_query(Action::GetBackendProperties, device)
            .await?;
        Ok(parse_calibration(device, &response.body))
    }

    fn estimate_cost(&self, circuit: &Circuit, shots: u32, device: &str) -> CostEstimate {
        cost::estimate(circuit, shots, device)
    }
}

#[async_trait]
impl IbmExtensions for IbmBackend {
    #[instrument(skip(self))]
    async fn job_metrics(&self, job_id: &JobId) -> HalResult<ProviderDocument> {
        self.job_document(Action::GetJobMetrics, job_id).await
    }

    #[instrument(skip(self))]
    async fn job_logs(&self, job_id: &JobId) -> HalResult<ProviderDocument> {
        self.job_document(Action::GetJobLogs, job_id).await
    }

    #[instrument(skip(self))]
    async fn transpiled_circuits(&self, job_id: &JobId) -> HalResult<ProviderDocument> {
        self.job_document(Action::GetTranspiledCircuits, job_id).await
    }

    async fn create_session(&self, options: &SessionOptions) -> HalResult<Session> {
        let options = match (&options.instance, &self.config.instance) {
            (None, Some(instance)) => options.clone().with_instance(instance.clone()),
            _ => options.clone(),
        };
        Ok(session::create(&self.dispatcher, &self.state, &options).await?)
    }

    async fn close_session(&self, session_id: &str) -> SessionClosure {
        session::close(&self.dispatcher, &self.state, session_id).await
    }

    async fn session_info(&self, session_id: &str) -> SessionInfo {
        session::info(&self.dispatcher, &self.state, session_id).await
    }

    #[instrument(skip(self))]
    async fn usage_analytics(&self) -> HalResult<ProviderDocument> {
        let token = self.credential().await;
        let response = self
            .dispatch_or_fail(
                Action::GetUsageAnalytics,
                OperationRequest::new(),
                token.as_deref(),
            )
            .await?;
        Ok(ProviderDocument::from_response(None, &response))
    }
}

impl BackendFactory for IbmBackend {
    fn from_config(config: BackendConfig) -> HalResult<Self> {
        let config = IbmConfig::try_from(config)?;
        Self::new(config).map_err(HalError::from)
    }
}
