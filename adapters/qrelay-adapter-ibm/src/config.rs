//! Adapter configuration.
//!
//! Configuration comes from three places: explicit construction, the
//! environment ([`IbmConfig::from_env`]) or the generic contract config
//! ([`BackendConfig`] with `backend`, `instance`, `service_crn` and
//! `program_id` in its `extra` map).

use std::fmt;
use std::time::Duration;

use qrelay_hal::BackendConfig;

use crate::error::{IbmError, IbmResult};

/// Default IBM Quantum Cloud API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://quantum.cloud.ibm.com/api";

/// Default target device (Heron processor).
pub const DEFAULT_BACKEND: &str = "ibm_torino";

/// Default provider program.
pub const DEFAULT_PROGRAM: &str = "sampler";

/// Token environment variable.
pub const ENV_TOKEN: &str = "IBM_QUANTUM_TOKEN";
/// Service CRN environment variable.
pub const ENV_SERVICE_CRN: &str = "IBM_SERVICE_CRN";
/// Endpoint override environment variable.
pub const ENV_ENDPOINT: &str = "IBM_QUANTUM_ENDPOINT";
/// Target device environment variable.
pub const ENV_BACKEND: &str = "IBM_QUANTUM_BACKEND";
/// Instance environment variable.
pub const ENV_INSTANCE: &str = "IBM_QUANTUM_INSTANCE";

/// IBM adapter configuration.
#[derive(Clone)]
pub struct IbmConfig {
    /// API base URL.
    pub endpoint: String,
    /// Bearer token. May be supplied later through `authenticate()`.
    pub token: Option<String>,
    /// `Service-CRN` header value.
    pub service_crn: Option<String>,
    /// Instance (hub/group/project or CRN) used for sessions.
    pub instance: Option<String>,
    /// Default target device.
    pub backend: String,
    /// Default provider program.
    pub program_id: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
}

impl Default for IbmConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: None,
            service_crn: None,
            instance: None,
            backend: DEFAULT_BACKEND.to_string(),
            program_id: DEFAULT_PROGRAM.to_string(),
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl IbmConfig {
    /// Configuration targeting `backend` with defaults elsewhere.
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            ..Self::default()
        }
    }

    /// Read configuration from the process environment.
    ///
    /// Nothing is required: a missing token only means `authenticate()` must
    /// be called before submitting.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            endpoint: non_blank(ENV_ENDPOINT).unwrap_or(defaults.endpoint),
            token: non_blank(ENV_TOKEN),
            service_crn: non_blank(ENV_SERVICE_CRN),
            instance: non_blank(ENV_INSTANCE),
            backend: non_blank(ENV_BACKEND).unwrap_or(defaults.backend),
            ..defaults
        }
    }

    /// Set the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the service CRN.
    pub fn with_service_crn(mut self, crn: impl Into<String>) -> Self {
        self.service_crn = Some(crn.into());
        self
    }

    /// Set the instance.
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Set the default program.
    pub fn with_program(mut self, program_id: impl Into<String>) -> Self {
        self.program_id = program_id.into();
        self
    }

    /// Endpoint without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }
}

impl TryFrom<BackendConfig> for IbmConfig {
    type Error = IbmError;

    fn try_from(config: BackendConfig) -> IbmResult<Self> {
        let mut ibm = IbmConfig::default();

        if let Some(endpoint) = config.endpoint.as_deref() {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(IbmError::Configuration(format!(
                    "endpoint must be an http(s) URL, got {endpoint}"
                )));
            }
            ibm.endpoint = endpoint.to_string();
        }
        ibm.token = config.token.clone().filter(|t| !t.trim().is_empty());

        if let Some(backend) = config.extra_str("backend") {
            ibm.backend = backend.to_string();
        }
        if let Some(program) = config.extra_str("program_id") {
            ibm.program_id = program.to_string();
        }
        ibm.instance = config.extra_str("instance").map(str::to_string);
        ibm.service_crn = config.extra_str("service_crn").map(str::to_string);

        Ok(ibm)
    }
}

impl fmt::Debug for IbmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IbmConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("service_crn", &self.service_crn)
            .field("instance", &self.instance)
            .field("backend", &self.backend)
            .field("program_id", &self.program_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}
