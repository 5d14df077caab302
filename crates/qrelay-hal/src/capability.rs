//! Backend capability introspection.
//!
//! Describes what a backend can run: qubit count, supported gates and
//! connectivity. Capabilities are cached at construction so the contract's
//! `capabilities()` stays synchronous; connectivity that can only be learned
//! from the provider is fetched on demand through `device_topology()`.
//!
//! All edges in [`Topology`] are bidirectional: if `(a, b)` is present,
//! both `a → b` and `b → a` are valid two-qubit interactions.

use serde::{Deserialize, Serialize};

/// Hardware capabilities of a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    /// Name of the target device.
    pub name: String,
    /// Number of qubits available.
    pub num_qubits: u32,
    /// Supported gate set (OpenQASM 3 naming convention).
    pub gate_set: GateSet,
    /// Connectivity, when known without a provider round-trip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology: Option<Topology>,
    /// Maximum number of shots per job.
    pub max_shots: u32,
    /// Whether this is a simulator (`true`) or real hardware (`false`).
    pub is_simulator: bool,
    /// Additional capability flags (`"dynamic_circuits"`, `"sessions"`, ...).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

impl Capabilities {
    /// Capabilities for a simulator with all-to-all connectivity.
    pub fn simulator(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            gate_set: GateSet::universal(),
            topology: Some(Topology::full(num_qubits)),
            max_shots: 100_000,
            is_simulator: true,
            features: vec!["sessions".into()],
        }
    }

    /// Capabilities for an IBM Heron processor (CZ native).
    ///
    /// Heavy-hex connectivity is device specific and is left unset here.
    pub fn ibm_heron(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            gate_set: GateSet::ibm_heron(),
            topology: None,
            max_shots: 100_000,
            is_simulator: false,
            features: vec!["dynamic_circuits".into(), "sessions".into()],
        }
    }

    /// Capabilities for an IBM Eagle processor (ECR native).
    pub fn ibm_eagle(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            gate_set: GateSet::ibm_eagle(),
            topology: None,
            max_shots: 100_000,
            is_simulator: false,
            features: vec!["dynamic_circuits".into(), "sessions".into()],
        }
    }
}

/// Gate set supported by a backend.
///
/// The `native` list identifies gates that execute without decomposition.
/// If `native` is empty, all supported gates are considered native.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateSet {
    /// Single-qubit gates supported.
    pub single_qubit: Vec<String>,
    /// Two-qubit gates supported.
    pub two_qubit: Vec<String>,
    /// Three-qubit gates supported.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub three_qubit: Vec<String>,
    /// Native gates.
    pub native: Vec<String>,
}

fn names(gates: &[&str]) -> Vec<String> {
    gates.iter().map(|g| (*g).to_string()).collect()
}

impl GateSet {
    /// IBM Eagle gate set (127-qubit processors).
    ///
    /// Eagle native gates: `ecr, rz, sx, x`.
    pub fn ibm_eagle() -> Self {
        Self {
            single_qubit: names(&["rz", "sx", "x", "id"]),
            two_qubit: names(&["ecr"]),
            three_qubit: vec![],
            native: names(&["rz", "sx", "x", "ecr"]),
        }
    }

    /// IBM Heron gate set (133/156-qubit processors).
    ///
    /// Heron native gates: `cz, rz, sx, x`. `rx`, `h` and `rzz` are accepted
    /// and decomposed by the provider's transpiler.
    pub fn ibm_heron() -> Self {
        Self {
            single_qubit: names(&["rz", "sx", "x", "id", "rx", "h"]),
            two_qubit: names(&["cz", "rzz"]),
            three_qubit: vec![],
            native: names(&["rz", "sx", "x", "cz", "id"]),
        }
    }

    /// Universal gate set.
    pub fn universal() -> Self {
        Self {
            single_qubit: names(&[
                "id", "x", "y", "z", "h", "s", "sdg", "t", "tdg", "sx", "rx", "ry", "rz", "u",
            ]),
            two_qubit: names(&["cx", "cz", "ecr", "swap", "rzz"]),
            three_qubit: names(&["ccx", "cswap"]),
            native: vec![],
        }
    }

    /// Check if a gate is supported.
    pub fn contains(&self, gate: &str) -> bool {
        self.all().any(|g| g == gate)
    }

    /// Every supported gate name, single-qubit first.
    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.single_qubit
            .iter()
            .chain(&self.two_qubit)
            .chain(&self.three_qubit)
            .map(String::as_str)
    }
}

/// Qubit connectivity topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    /// Kind of topology.
    pub kind: TopologyKind,
    /// Coupling edges. Bidirectional.
    pub edges: Vec<(u32, u32)>,
}

impl Topology {
    /// Fully connected topology.
    pub fn full(n: u32) -> Self {
        let mut edges = vec![];
        for i in 0..n {
            for j in (i + 1)..n {
                edges.push((i, j));
            }
        }
        Self {
            kind: TopologyKind::FullyConnected,
            edges,
        }
    }

    /// Topology from a provider coupling map.
    ///
    /// Directed pairs are folded into undirected edges: `(0, 1)` and
    /// `(1, 0)` become one edge.
    pub fn from_coupling_map(pairs: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let mut edges: Vec<(u32, u32)> = pairs
            .into_iter()
            .filter(|(a, b)| a != b)
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect();
        edges.sort_unstable();
        edges.dedup();
        Self {
            kind: TopologyKind::Custom,
            edges,
        }
    }

    /// Check if two qubits are connected.
    pub fn is_connected(&self, q1: u32, q2: u32) -> bool {
        self.edges
            .iter()
            .any(|&(a, b)| (a == q1 && b == q2) || (a == q2 && b == q1))
    }

    /// Qubits coupled to `qubit`.
    pub fn neighbors(&self, qubit: u32) -> Vec<u32> {
        self.edges
            .iter()
            .filter_map(|&(a, b)| {
                if a == qubit {
                    Some(b)
                } else if b == qubit {
                    Some(a)
                } else {
                    None
                }
            })
            .collect()
    }
}

/// Kind of qubit topology.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[non_exhaustive]
pub enum TopologyKind {
    /// Fully connected (all-to-all).
    FullyConnected,
    /// Heavy-hex lattice (IBM Heron/Eagle processors).
    HeavyHex,
    /// Arbitrary coupling map.
    Custom,
}
