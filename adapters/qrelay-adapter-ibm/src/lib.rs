//! qrelay adapter for IBM Quantum
//!
//! This crate provides a backend implementation for submitting circuits to
//! IBM Quantum processors through the Qiskit Runtime REST API
//! (`https://quantum.cloud.ibm.com/api/v1/`), together with the pieces that
//! keep that integration working when the provider renames its operations.
//!
//! # Dispatch resilience
//!
//! Every logical action (create a job, fetch its results, open a session)
//! is resolved through an ordered list of provider operation names. The
//! [`Dispatcher`] tries each name in turn and moves on when an alias is
//! unknown, errors at the transport level, or answers `401`. When no alias
//! responds the caller gets `None` and decides how to fail.
//!
//! # Job handles
//!
//! [`IbmBackend::submit`](qrelay_hal::Backend::submit) returns a locally
//! generated handle. The handle maps to the provider job id through an
//! in-process registry, so lookups on handles this instance never issued
//! are answered locally with an `unknown-job` marker.
//!
//! # Authentication
//!
//! Set `IBM_QUANTUM_TOKEN` (and `IBM_SERVICE_CRN` on IBM Cloud):
//!
//! ```bash
//! export IBM_QUANTUM_TOKEN="your-api-token"
//! export IBM_SERVICE_CRN="crn:v1:bluemix:public:quantum-computing:..."
//! ```
//!
//! A token can also be supplied later through
//! [`Backend::authenticate`](qrelay_hal::Backend::authenticate). Submission,
//! batch submission and session creation fail fast without one.
//!
//! # Example
//!
//! ```ignore
//! use qrelay_adapter_ibm::{IbmBackend, IbmConfig};
//! use qrelay_hal::Backend;
//! use qrelay_ir::Circuit;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = IbmBackend::new(IbmConfig::from_env())?;
//!
//!     let circuit = Circuit::bell()?;
//!     let job_id = backend.submit(&circuit, &backend.default_options(1024)).await?;
//!     println!("Job: {job_id}");
//!
//!     let result = backend.wait(&job_id).await?;
//!     println!("Counts: {:?}", result.counts());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Cost estimation
//!
//! [`Backend::estimate_cost`](qrelay_hal::Backend::estimate_cost) is computed
//! locally from gate timings and the device's pricing tier. It performs no
//! I/O and is deterministic.

mod backend;
mod config;
pub mod cost;
pub mod device;
pub mod dispatch;
mod error;
pub mod extensions;
pub mod normalize;
pub mod request;
pub mod session;
pub mod state;
pub mod transport;

pub use backend::IbmBackend;
pub use config::{
    DEFAULT_BACKEND, DEFAULT_ENDPOINT, DEFAULT_PROGRAM, ENV_BACKEND, ENV_ENDPOINT, ENV_INSTANCE,
    ENV_SERVICE_CRN, ENV_TOKEN, IbmConfig,
};
pub use dispatch::{Action, Dispatcher};
pub use error::{IbmError, IbmResult};
pub use extensions::{IbmExtensions, ProviderDocument};
pub use session::{Session, SessionClosure, SessionInfo, SessionOptions};
pub use transport::{HttpTransport, OperationRequest, OperationResponse, Transport};

pub use qrelay_hal::{Backend, BackendConfig, BackendFactory};
