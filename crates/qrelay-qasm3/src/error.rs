//! Error types for the QASM3 emitter.

use thiserror::Error;

/// Errors that can occur while emitting QASM.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EmitError {
    /// Gate parameter cannot be written as a QASM literal.
    #[error("Gate '{gate}' has non-finite parameter {value}")]
    NonFiniteParameter {
        /// Gate name.
        gate: String,
        /// Offending value.
        value: f64,
    },

    /// Measurement without a matching classical bit.
    #[error("Measurement on {qubits} qubits but {clbits} classical bits")]
    MeasureArity {
        /// Number of measured qubits.
        qubits: usize,
        /// Number of target bits.
        clbits: usize,
    },
}

/// Result type for emission.
pub type EmitResult<T> = Result<T, EmitError>;
