//! Quantum gate types.

use serde::{Deserialize, Serialize};

/// Standard gates with known semantics.
///
/// Angles are concrete radians; symbolic parameters are bound before a
/// circuit reaches an adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,
    /// Rotation around X axis.
    Rx(f64),
    /// Rotation around Y axis.
    Ry(f64),
    /// Rotation around Z axis.
    Rz(f64),
    /// Universal single-qubit gate U(θ, φ, λ).
    U(f64, f64, f64),
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Z gate.
    CZ,
    /// Echoed cross-resonance gate (IBM Eagle native).
    ECR,
    /// SWAP gate.
    Swap,
    /// ZZ rotation gate.
    RZZ(f64),
    /// Toffoli gate (CCX).
    CCX,
    /// Fredkin gate (CSWAP).
    CSwap,
}

impl StandardGate {
    /// OpenQASM 3 name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::I => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::T => "t",
            StandardGate::Tdg => "tdg",
            StandardGate::SX => "sx",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::U(..) => "u",
            StandardGate::CX => "cx",
            StandardGate::CZ => "cz",
            StandardGate::ECR => "ecr",
            StandardGate::Swap => "swap",
            StandardGate::RZZ(_) => "rzz",
            StandardGate::CCX => "ccx",
            StandardGate::CSwap => "cswap",
        }
    }

    /// Number of qubits this gate acts on.
    pub fn num_qubits(&self) -> u32 {
        match self {
            StandardGate::CX
            | StandardGate::CZ
            | StandardGate::ECR
            | StandardGate::Swap
            | StandardGate::RZZ(_) => 2,
            StandardGate::CCX | StandardGate::CSwap => 3,
            _ => 1,
        }
    }

    /// Angle parameters in declaration order.
    pub fn parameters(&self) -> Vec<f64> {
        match self {
            StandardGate::Rx(theta)
            | StandardGate::Ry(theta)
            | StandardGate::Rz(theta)
            | StandardGate::RZZ(theta) => vec![*theta],
            StandardGate::U(theta, phi, lambda) => vec![*theta, *phi, *lambda],
            _ => vec![],
        }
    }
}

/// A gate outside the standard set, identified only by name.
///
/// Adapters forward these verbatim; whether the provider accepts them is
/// the provider's decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomGate {
    /// Gate name as it should appear in the serialized circuit.
    pub name: String,
    /// Number of qubits.
    pub num_qubits: u32,
    /// Angle parameters.
    pub params: Vec<f64>,
}

impl CustomGate {
    /// Create a parameterless custom gate.
    pub fn new(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            params: vec![],
        }
    }

    /// Attach angle parameters.
    pub fn with_params(mut self, params: Vec<f64>) -> Self {
        self.params = params;
        self
    }
}

/// A gate, standard or custom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    /// Built-in gate.
    Standard(StandardGate),
    /// Named gate outside the standard set.
    Custom(CustomGate),
}

impl Gate {
    /// Name of the gate.
    pub fn name(&self) -> &str {
        match self {
            Gate::Standard(g) => g.name(),
            Gate::Custom(g) => &g.name,
        }
    }

    /// Number of qubits the gate acts on.
    pub fn num_qubits(&self) -> u32 {
        match self {
            Gate::Standard(g) => g.num_qubits(),
            Gate::Custom(g) => g.num_qubits,
        }
    }

    /// Angle parameters.
    pub fn parameters(&self) -> Vec<f64> {
        match self {
            Gate::Standard(g) => g.parameters(),
            Gate::Custom(g) => g.params.clone(),
        }
    }
}

impl From<StandardGate> for Gate {
    fn from(gate: StandardGate) -> Self {
        Gate::Standard(gate)
    }
}

impl From<CustomGate> for Gate {
    fn from(gate: CustomGate) -> Self {
        Gate::Custom(gate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_gate_arity() {
        assert_eq!(StandardGate::H.num_qubits(), 1);
        assert_eq!(StandardGate::CX.num_qubits(), 2);
        assert_eq!(StandardGate::RZZ(0.5).num_qubits(), 2);
        assert_eq!(StandardGate::CCX.num_qubits(), 3);
    }

    #[test]
    fn test_custom_gate_name() {
        let gate: Gate = CustomGate::new("cnot", 2).into();
        assert_eq!(gate.name(), "cnot");
        assert_eq!(gate.num_qubits(), 2);
        assert!(gate.parameters().is_empty());
    }

    #[test]
    fn test_parameters_order() {
        let gate = StandardGate::U(0.1, 0.2, 0.3);
        assert_eq!(gate.parameters(), vec![0.1, 0.2, 0.3]);
    }
}
