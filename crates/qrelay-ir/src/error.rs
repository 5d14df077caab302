//! Error types for the IR crate.

use crate::qubit::{ClbitId, QubitId};
use thiserror::Error;

/// Errors that can occur while building a circuit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Qubit index outside the circuit.
    #[error("Qubit {qubit} not found in circuit (gate: {gate_name})")]
    QubitNotFound {
        /// The offending qubit.
        qubit: QubitId,
        /// Instruction being applied.
        gate_name: String,
    },

    /// Classical bit index outside the circuit.
    #[error("Classical bit {clbit} not found in circuit")]
    ClbitNotFound {
        /// The offending classical bit.
        clbit: ClbitId,
    },

    /// Gate applied to the wrong number of qubits.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of qubits.
        expected: u32,
        /// Actual number of qubits provided.
        got: u32,
    },

    /// Same qubit used twice in one instruction.
    #[error("Duplicate qubit {qubit} in '{gate_name}'")]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: QubitId,
        /// Instruction being applied.
        gate_name: String,
    },
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
