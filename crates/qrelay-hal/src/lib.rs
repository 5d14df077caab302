//! qrelay Hardware Abstraction Layer
//!
//! The provider-neutral contract that backend adapters implement.
//!
//! # Overview
//!
//! - [`Backend`]: job lifecycle, batches, devices, cost estimates
//! - [`Capabilities`]: what a backend can run
//! - [`JobStatus`]: the canonical six-state status vocabulary
//! - [`JobResult`], [`BatchStatus`], [`BatchResults`]: total lookups that
//!   report unknown handles as values, not errors
//! - [`CostEstimate`]: itemized, locally computed estimate
//!
//! # Example
//!
//! ```ignore
//! use qrelay_hal::{Backend, SubmitOptions};
//! use qrelay_ir::Circuit;
//!
//! async fn run(backend: &dyn Backend) -> qrelay_hal::HalResult<()> {
//!     let options = SubmitOptions::new(1024)
//!         .with_backend("ibm_torino")
//!         .with_program("sampler");
//!     let job = backend.submit(&Circuit::bell()?, &options).await?;
//!     let result = backend.wait(&job).await?;
//!     println!("{:?}", result.counts().most_frequent());
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod batch;
pub mod capability;
pub mod cost;
pub mod device;
pub mod error;
pub mod job;
pub mod result;

pub use backend::{Backend, BackendAvailability, BackendConfig, BackendFactory, ValidationResult};
pub use batch::{BatchId, BatchResults, BatchStatus, BatchSubmission, UNKNOWN_BATCH};
pub use capability::{Capabilities, GateSet, Topology, TopologyKind};
pub use cost::{CostEstimate, PricingTier};
pub use device::{CalibrationData, DeviceInfo, GateCalibration, QubitCalibration};
pub use error::{HalError, HalResult};
pub use job::{
    CancelOutcome, JobId, JobResult, JobStatus, MISSING_PROVIDER_ID, QueueStatus, SubmitOptions,
    UNKNOWN_JOB,
};
pub use result::Counts;
