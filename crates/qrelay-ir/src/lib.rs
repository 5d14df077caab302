//! qrelay circuit representation
//!
//! A flat, ordered instruction list over a fixed number of qubits and
//! classical bits. Adapters need two things from a circuit: the operation
//! list (for cost estimation and validation) and a serializable form (see
//! `qrelay-qasm3`). Nothing here performs compilation or simulation.
//!
//! # Example
//!
//! ```rust
//! use qrelay_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("bell", 2, 2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.measure_all().unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.gate_count(), 2);
//! ```

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::{CustomGate, Gate, StandardGate};
pub use instruction::{Instruction, InstructionKind};
pub use qubit::{ClbitId, QubitId};
