//! Device listing and calibration types.

use serde::{Deserialize, Serialize};

/// A device offered by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device identifier (e.g. `ibm_torino`).
    pub name: String,
    /// Qubit count, when the listing reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_qubits: Option<u32>,
    /// Provider status text, when the listing reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Whether the provider marks the device as a simulator.
    #[serde(default)]
    pub simulator: bool,
}

impl DeviceInfo {
    /// Device known only by name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            num_qubits: None,
            status: None,
            simulator: false,
        }
    }
}

/// Calibration snapshot for one qubit. Times in microseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QubitCalibration {
    /// Qubit index.
    pub qubit: u32,
    /// T1 relaxation time.
    pub t1_us: Option<f64>,
    /// T2 dephasing time.
    pub t2_us: Option<f64>,
    /// Readout assignment error.
    pub readout_error: Option<f64>,
}

/// Calibration snapshot for one gate on specific qubits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateCalibration {
    /// Gate name.
    pub gate: String,
    /// Qubits the calibration applies to.
    pub qubits: Vec<u32>,
    /// Gate error rate.
    pub error: Option<f64>,
    /// Gate duration in nanoseconds.
    pub length_ns: Option<f64>,
}

/// Calibration data for a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationData {
    /// Device identifier.
    pub device: String,
    /// Provider timestamp of the calibration run.
    pub last_update: Option<String>,
    /// Per-qubit data.
    pub qubits: Vec<QubitCalibration>,
    /// Per-gate data.
    pub gates: Vec<GateCalibration>,
}

impl CalibrationData {
    /// Mean T1 over qubits that report one.
    pub fn mean_t1_us(&self) -> Option<f64> {
        mean(self.qubits.iter().filter_map(|q| q.t1_us))
    }

    /// Mean T2 over qubits that report one.
    pub fn mean_t2_us(&self) -> Option<f64> {
        mean(self.qubits.iter().filter_map(|q| q.t2_us))
    }

    /// Mean error of `gate` over all qubit tuples that report one.
    pub fn mean_gate_error(&self, gate: &str) -> Option<f64> {
        mean(
            self.gates
                .iter()
                .filter(|g| g.gate == gate)
                .filter_map(|g| g.error),
        )
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_means_skip_missing() {
        let data = CalibrationData {
            device: "ibm_test".into(),
            last_update: None,
            qubits: vec![
                QubitCalibration {
                    qubit: 0,
                    t1_us: Some(100.0),
                    ..Default::default()
                },
                QubitCalibration {
                    qubit: 1,
                    t1_us: Some(200.0),
                    ..Default::default()
                },
                QubitCalibration {
                    qubit: 2,
                    ..Default::default()
                },
            ],
            gates: vec![GateCalibration {
                gate: "cz".into(),
                qubits: vec![0, 1],
                error: Some(0.004),
                length_ns: Some(68.0),
            }],
        };
        assert_eq!(data.mean_t1_us(), Some(150.0));
        assert_eq!(data.mean_t2_us(), None);
        assert_eq!(data.mean_gate_error("cz"), Some(0.004));
        assert_eq!(data.mean_gate_error("ecr"), None);
    }
}
