//! Error types for the IBM Quantum adapter.

use qrelay_hal::HalError;
use thiserror::Error;

/// Result type for IBM operations.
pub type IbmResult<T> = Result<T, IbmError>;

/// Errors that can occur when using IBM Quantum.
#[derive(Debug, Error)]
pub enum IbmError {
    /// No credential configured.
    #[error(
        "IBM Quantum API token not set. Call authenticate() or set the IBM_QUANTUM_TOKEN environment variable."
    )]
    MissingToken,

    /// Credential cannot be carried in an HTTP header.
    #[error("Invalid IBM Quantum API token")]
    InvalidToken,

    /// A required submission option is missing or blank.
    #[error("Missing required option: {0}")]
    MissingOption(&'static str),

    /// Shot count outside the accepted range.
    #[error("Invalid shot count: {0}")]
    InvalidShots(u32),

    /// Every candidate operation for an action was skipped.
    #[error("No candidate operation responded for {0}")]
    DispatchFailed(String),

    /// The transport has no route for an operation name.
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// A path parameter required by an operation's route was not supplied.
    #[error("Operation {operation} requires parameter {param}")]
    MissingParameter {
        /// Operation name.
        operation: String,
        /// Missing path parameter.
        param: &'static str,
    },

    /// A path parameter cannot name a single path segment.
    #[error("Operation {operation} got an unusable value for parameter {param}")]
    InvalidParameter {
        /// Operation name.
        operation: String,
        /// Offending path parameter.
        param: &'static str,
    },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API returned an error.
    #[error("IBM Quantum API error: {message}")]
    ApiError {
        /// Provider status code.
        code: Option<u16>,
        /// Error message.
        message: String,
    },

    /// Circuit could not be serialized.
    #[error("Circuit conversion error: {0}")]
    CircuitError(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<IbmError> for HalError {
    fn from(e: IbmError) -> Self {
        match e {
            IbmError::MissingToken | IbmError::InvalidToken => {
                HalError::AuthenticationFailed(e.to_string())
            }
            IbmError::MissingOption(_) => HalError::InvalidOptions(e.to_string()),
            IbmError::InvalidShots(_) => HalError::InvalidShots(e.to_string()),
            IbmError::DispatchFailed(action) => HalError::DispatchFailed(action),
            IbmError::CircuitError(msg) => HalError::InvalidCircuit(msg),
            IbmError::JsonError(err) => HalError::Serialization(err),
            IbmError::Configuration(msg) => HalError::Configuration(msg),
            _ => HalError::Backend(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_display() {
        let err = IbmError::MissingToken;
        assert!(err.to_string().contains("IBM_QUANTUM_TOKEN"));
    }

    #[test]
    fn test_missing_option_display() {
        let err = IbmError::MissingOption("program_id");
        assert!(err.to_string().contains("program_id"));
    }

    #[test]
    fn test_api_error_display() {
        let err = IbmError::ApiError {
            code: Some(500),
            message: "Internal error".into(),
        };
        assert!(err.to_string().contains("Internal error"));
    }

    #[test]
    fn test_missing_parameter_display() {
        let err = IbmError::MissingParameter {
            operation: "get_job_details_jid".into(),
            param: "id",
        };
        let msg = err.to_string();
        assert!(msg.contains("get_job_details_jid"));
        assert!(msg.contains("id"));
    }

    #[test]
    fn test_missing_token_to_hal_auth_failed() {
        let hal: HalError = IbmError::MissingToken.into();
        assert!(matches!(hal, HalError::AuthenticationFailed(_)));
    }

    #[test]
    fn test_invalid_token_to_hal_auth_failed() {
        let hal: HalError = IbmError::InvalidToken.into();
        assert!(matches!(hal, HalError::AuthenticationFailed(_)));
    }

    #[test]
    fn test_missing_option_to_hal_invalid_options() {
        let hal: HalError = IbmError::MissingOption("backend").into();
        assert!(matches!(hal, HalError::InvalidOptions(msg) if msg.contains("backend")));
    }

    #[test]
    fn test_invalid_shots_to_hal() {
        let hal: HalError = IbmError::InvalidShots(0).into();
        assert!(matches!(hal, HalError::InvalidShots(_)));
    }

    #[test]
    fn test_dispatch_failed_to_hal() {
        let hal: HalError = IbmError::DispatchFailed("get-job".into()).into();
        assert!(matches!(hal, HalError::DispatchFailed(action) if action == "get-job"));
    }

    #[test]
    fn test_circuit_error_to_hal_invalid_circuit() {
        let hal: HalError = IbmError::CircuitError("bad".into()).into();
        assert!(matches!(hal, HalError::InvalidCircuit(msg) if msg == "bad"));
    }

    #[test]
    fn test_unknown_operation_to_hal_backend() {
        let hal: HalError = IbmError::UnknownOperation("nope".into()).into();
        assert!(matches!(hal, HalError::Backend(_)));
    }

    #[test]
    fn test_api_error_to_hal_backend() {
        let hal: HalError = IbmError::ApiError {
            code: None,
            message: "server error".into(),
        }
        .into();
        assert!(matches!(hal, HalError::Backend(_)));
    }
}
