//! OpenQASM 3.0 serialization for qrelay circuits.
//!
//! Providers accept circuits as assembly text. This crate turns a
//! [`qrelay_ir::Circuit`] into `OPENQASM 3.0` source using a single `q`
//! qubit register and a single `c` bit register.
//!
//! ```rust
//! use qrelay_ir::Circuit;
//!
//! let qasm = qrelay_qasm3::emit(&Circuit::bell().unwrap()).unwrap();
//! assert!(qasm.starts_with("OPENQASM 3.0;"));
//! assert!(qasm.contains("cx q[0], q[1];"));
//! ```

mod emitter;
mod error;

pub use emitter::{emit, emit_with_includes};
pub use error::{EmitError, EmitResult};
