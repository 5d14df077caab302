//! Provider request bodies.
//!
//! Optional fields the caller left unset are omitted from the serialized
//! body entirely. The provider treats an absent field and a `null` field
//! differently, so `None` must never serialize.

use serde::Serialize;
use serde_json::Value;

use qrelay_hal::SubmitOptions;
use qrelay_ir::Circuit;

use crate::error::{IbmError, IbmResult};

/// Include line the provider's QASM loader needs for standard gates.
pub const STDGATES_INCLUDE: &str = "stdgates.inc";

/// Sampler primitive version used for the pub format.
pub const PRIMITIVE_VERSION: u8 = 2;

/// Target and program of a validated submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitTarget {
    /// Device identifier.
    pub backend: String,
    /// Provider program identifier.
    pub program_id: String,
}

/// Check the caller contract of a submission.
///
/// Target device and program are required and must not be blank; the
/// shot count must be positive.
pub fn validate_options(options: &SubmitOptions) -> IbmResult<SubmitTarget> {
    let required = |value: &Option<String>, name: &'static str| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or(IbmError::MissingOption(name))
    };

    let backend = required(&options.backend, "backend")?;
    let program_id = required(&options.program_id, "program_id")?;
    if options.shots == 0 {
        return Err(IbmError::InvalidShots(options.shots));
    }

    Ok(SubmitTarget {
        backend,
        program_id,
    })
}

/// Body of the create-job operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateJobRequest {
    /// Provider program.
    pub program_id: String,
    /// Target device.
    pub backend: String,
    /// Program parameters.
    pub params: JobParams,
    /// Job tags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Provider log level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    /// Runtime image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    /// Processor-time ceiling in seconds.
    #[serde(rename = "cost", skip_serializing_if = "Option::is_none")]
    pub max_execution_time: Option<u64>,
    /// Session to run in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Sampler v2 parameters: one pub per circuit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobParams {
    /// Primitive version.
    pub version: u8,
    /// `[qasm, parameter_values, shots]` triples.
    pub pubs: Vec<Value>,
}

impl CreateJobRequest {
    /// Build the request for one circuit.
    pub fn build(circuit: &Circuit, options: &SubmitOptions) -> IbmResult<Self> {
        let target = validate_options(options)?;
        let qasm = circuit_to_qasm(circuit)?;

        Ok(Self {
            program_id: target.program_id,
            backend: target.backend,
            params: JobParams {
                version: PRIMITIVE_VERSION,
                pubs: vec![serde_json::json!([qasm, {}, options.shots])],
            },
            tags: options.tags.clone(),
            log_level: options.log_level.clone(),
            runtime: options.runtime.clone(),
            max_execution_time: options.max_execution_time,
            session_id: options.session_id.clone(),
        })
    }

    /// Serialize to a JSON document.
    pub fn to_value(&self) -> IbmResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Body of the create-session operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateSessionRequest {
    /// Target device.
    pub backend: String,
    /// Maximum session lifetime in seconds.
    pub max_ttl: u64,
    /// Instance to bill.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    /// Channel (`ibm_cloud`, `ibm_quantum`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

/// Serialize a circuit to `OpenQASM` 3.0 with the standard gate include.
pub fn circuit_to_qasm(circuit: &Circuit) -> IbmResult<String> {
    qrelay_qasm3::emit_with_includes(circuit, &[STDGATES_INCLUDE])
        .map_err(|e| IbmError::CircuitError(e.to_string()))
}

/// Whether `value`, at any depth, contains a `null`.
pub fn contains_null(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.iter().any(contains_null),
        Value::Object(map) => map.values().any(contains_null),
        _ => false,
    }
}
