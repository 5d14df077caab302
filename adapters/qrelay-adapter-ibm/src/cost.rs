//! Cost estimation.
//!
//! Pure and deterministic: the same circuit, shot count and device always
//! produce the same [`CostEstimate`], and nothing here touches the network.
//!
//! ```text
//!   device ──→ timing table ──→ µs per shot ──→ µs total ──→ seconds
//!   device ──→ pricing tier ──→ $/s, shot fee
//!   seconds × $/s + shots × fee + complexity fee + priority fee = total
//! ```

use qrelay_hal::{CostEstimate, PricingTier};
use qrelay_ir::{Circuit, InstructionKind};

/// Cost of a gate missing from the timing table, in microseconds.
pub const UNKNOWN_GATE_US: f64 = 100.0;

/// Overhead between consecutive shots, in microseconds.
pub const INTER_SHOT_OVERHEAD_US: f64 = 1000.0;

/// Lower bound on any execution time estimate, in microseconds.
pub const MIN_EXECUTION_US: f64 = 1000.0;

/// Per-shot fee on hardware tiers, in USD.
pub const SHOT_FEE: f64 = 0.000_03;

/// Gate count above which the complexity fee applies.
pub const COMPLEXITY_THRESHOLD: usize = 100;

/// Fee per gate beyond [`COMPLEXITY_THRESHOLD`], in USD.
pub const COMPLEXITY_FEE_PER_GATE: f64 = 0.000_1;

/// Provider credits per USD.
pub const CREDITS_PER_USD: f64 = 100.0;

/// Heron-generation devices.
pub const PREMIUM_DEVICES: &[&str] = &[
    "ibm_torino",
    "ibm_fez",
    "ibm_marrakesh",
    "ibm_kingston",
    "ibm_aachen",
];

/// Eagle-generation devices.
pub const STANDARD_DEVICES: &[&str] = &[
    "ibm_brisbane",
    "ibm_sherbrooke",
    "ibm_kyiv",
    "ibm_strasbourg",
    "ibm_brussels",
];

/// Older hardware.
pub const ENTRY_DEVICES: &[&str] = &[
    "ibm_osaka",
    "ibm_nazca",
    "ibm_cusco",
    "ibm_algiers",
    "ibm_kyoto",
];

/// Named simulators.
pub const SIMULATOR_DEVICES: &[&str] = &[
    "ibmq_qasm_simulator",
    "simulator_statevector",
    "simulator_mps",
    "simulator_stabilizer",
    "simulator_extended_stabilizer",
    "aer_simulator",
];

/// Per-gate durations for one class of device, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateTimings {
    /// Single-qubit gates.
    pub single_qubit: f64,
    /// Virtual Z rotations (`rz`, `s`, `t` and friends).
    pub virtual_z: f64,
    /// Two-qubit gates.
    pub two_qubit: f64,
    /// Three-qubit gates.
    pub three_qubit: f64,
    /// One measurement.
    pub measure: f64,
}

/// Timings for named hardware.
pub const HARDWARE_TIMINGS: GateTimings = GateTimings {
    single_qubit: 0.035,
    virtual_z: 0.0,
    two_qubit: 0.66,
    three_qubit: 3.5,
    measure: 4.0,
};

/// Timings for simulators.
pub const SIMULATOR_TIMINGS: GateTimings = GateTimings {
    single_qubit: 0.01,
    virtual_z: 0.01,
    two_qubit: 0.02,
    three_qubit: 0.05,
    measure: 0.01,
};

/// Timings for hardware the tables do not name.
pub const DEFAULT_TIMINGS: GateTimings = GateTimings {
    single_qubit: 0.05,
    virtual_z: 0.0,
    two_qubit: 0.8,
    three_qubit: 4.0,
    measure: 5.0,
};

impl GateTimings {
    /// Duration of one gate, or `None` if the table does not know it.
    pub fn gate_us(&self, name: &str) -> Option<f64> {
        let us = match name.to_ascii_lowercase().as_str() {
            "rz" | "s" | "sdg" | "t" | "tdg" | "z" | "p" | "u1" => self.virtual_z,
            "id" | "x" | "y" | "h" | "sx" | "sxdg" | "rx" | "ry" | "u" | "u2" | "u3" => {
                self.single_qubit
            }
            "cx" | "cnot" | "cz" | "ecr" | "rzz" | "cy" | "ch" => self.two_qubit,
            "swap" => 3.0 * self.two_qubit,
            "ccx" | "toffoli" | "cswap" | "fredkin" => self.three_qubit,
            _ => return None,
        };
        Some(us)
    }
}

/// Whether `device` is a simulator.
pub fn is_simulator(device: &str) -> bool {
    SIMULATOR_DEVICES.contains(&device) || device.contains("simulator")
}

/// Timing table for `device`.
pub fn timings_for(device: &str) -> GateTimings {
    if is_simulator(device) {
        SIMULATOR_TIMINGS
    } else if PREMIUM_DEVICES.contains(&device)
        || STANDARD_DEVICES.contains(&device)
        || ENTRY_DEVICES.contains(&device)
    {
        HARDWARE_TIMINGS
    } else {
        DEFAULT_TIMINGS
    }
}

/// Pricing tier of `device`. Unrecognized devices are standard.
pub fn pricing_tier(device: &str) -> PricingTier {
    if is_simulator(device) {
        PricingTier::Simulator
    } else if PREMIUM_DEVICES.contains(&device) {
        PricingTier::Premium
    } else if ENTRY_DEVICES.contains(&device) {
        PricingTier::Entry
    } else {
        PricingTier::Standard
    }
}

/// Processor time price of a tier, in USD per second.
pub fn cost_per_second(tier: PricingTier) -> f64 {
    match tier {
        PricingTier::Premium => 1.60,
        PricingTier::Standard => 1.20,
        PricingTier::Entry => 0.80,
        PricingTier::Simulator => 0.0,
    }
}

/// Estimated execution time in microseconds.
///
/// Measurement and reset are charged once per qubit on top of the gate sum;
/// measure and barrier instructions themselves add nothing.
pub fn execution_time_us(circuit: &Circuit, shots: u32, timings: &GateTimings) -> f64 {
    let gate_us: f64 = circuit
        .instructions()
        .iter()
        .map(|inst| match &inst.kind {
            InstructionKind::Gate(gate) => timings.gate_us(gate.name()).unwrap_or(UNKNOWN_GATE_US),
            InstructionKind::Reset => timings.measure,
            InstructionKind::Measure | InstructionKind::Barrier => 0.0,
        })
        .sum();
    let per_shot = gate_us + circuit.num_qubits() as f64 * timings.measure;

    let total = per_shot * f64::from(shots)
        + INTER_SHOT_OVERHEAD_US * f64::from(shots.saturating_sub(1));
    total.max(MIN_EXECUTION_US)
}

/// Estimate the cost of running `circuit` for `shots` shots on `device`.
pub fn estimate(circuit: &Circuit, shots: u32, device: &str) -> CostEstimate {
    let tier = pricing_tier(device);
    let timings = timings_for(device);

    let execution_time_us = execution_time_us(circuit, shots, &timings);
    let execution_time_seconds = execution_time_us / 1_000_000.0;
    let gate_count = circuit.gate_count();

    let processor_time_cost = execution_time_seconds * cost_per_second(tier);
    let shot_cost = if tier.is_hardware() {
        f64::from(shots) * SHOT_FEE
    } else {
        0.0
    };
    let complexity_fee =
        gate_count.saturating_sub(COMPLEXITY_THRESHOLD) as f64 * COMPLEXITY_FEE_PER_GATE;
    let priority_fee = 0.0;
    let total_cost = processor_time_cost + shot_cost + complexity_fee + priority_fee;

    CostEstimate {
        device: device.to_string(),
        tier,
        shots,
        gate_count,
        execution_time_us,
        execution_time_seconds,
        processor_time_cost,
        shot_cost,
        complexity_fee,
        priority_fee,
        total_cost,
        estimated_credits: total_cost * CREDITS_PER_USD,
    }
}
