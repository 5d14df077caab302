//! Device listing, topology, calibration and queue parsing.
//!
//! Both the cloud API (`{"devices": [...]}`) and the legacy API
//! (`{"backends": [...]}`) shapes are accepted. Extraction is lenient:
//! entries or fields that do not parse are skipped.

use chrono::Utc;
use serde_json::Value;

use qrelay_hal::{
    CalibrationData, Capabilities, DeviceInfo, GateCalibration, QubitCalibration, QueueStatus,
    Topology,
};

use crate::cost::{PREMIUM_DEVICES, is_simulator};
use crate::normalize::{FieldPath, first_present, first_string, lookup, parse_document};

const DEVICE_LIST_PATHS: &[FieldPath] = &[&["devices"], &["backends"]];
const DEVICE_NAME_PATHS: &[FieldPath] = &[&["name"], &["backend_name"]];
const QUBIT_COUNT_PATHS: &[FieldPath] = &[&["n_qubits"], &["num_qubits"], &["qubits"]];
const DEVICE_STATUS_PATHS: &[FieldPath] = &[&["status", "name"], &["status"]];
const PENDING_JOB_PATHS: &[FieldPath] = &[&["length_queue"], &["pending_jobs"]];

/// Parse a device listing.
pub fn parse_device_list(body: &Value) -> Vec<DeviceInfo> {
    let Some(doc) = parse_document(body) else {
        return Vec::new();
    };
    let entries = match first_present(&doc, DEVICE_LIST_PATHS) {
        Some(Value::Array(items)) => items.as_slice(),
        _ => match &*doc {
            Value::Array(items) => items.as_slice(),
            _ => &[],
        },
    };
    entries.iter().filter_map(parse_device_entry).collect()
}

fn parse_device_entry(entry: &Value) -> Option<DeviceInfo> {
    match entry {
        Value::String(name) if !name.is_empty() => Some(DeviceInfo::named(name.clone())),
        Value::Object(_) => {
            let name = first_string(entry, DEVICE_NAME_PATHS)?;
            let num_qubits = first_present(entry, QUBIT_COUNT_PATHS)
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok());
            let status = first_string(entry, DEVICE_STATUS_PATHS);
            let simulator = entry
                .get("simulator")
                .and_then(Value::as_bool)
                .unwrap_or_else(|| is_simulator(&name));
            Some(DeviceInfo {
                name,
                num_qubits,
                status,
                simulator,
            })
        }
        _ => None,
    }
}

/// Coupling map of a backend configuration as a topology.
///
/// A configuration without a coupling map yields an empty topology.
pub fn parse_topology(body: &Value) -> Topology {
    let pairs = parse_document(body)
        .and_then(|doc| match lookup(&doc, &["coupling_map"]) {
            Some(Value::Array(items)) => Some(items.iter().filter_map(edge).collect::<Vec<_>>()),
            _ => None,
        })
        .unwrap_or_default();
    Topology::from_coupling_map(pairs)
}

fn edge(pair: &Value) -> Option<(u32, u32)> {
    let pair = pair.as_array()?;
    let a = u32::try_from(pair.first()?.as_u64()?).ok()?;
    let b = u32::try_from(pair.get(1)?.as_u64()?).ok()?;
    Some((a, b))
}

/// Calibration data from a backend properties document.
///
/// Qubit entries are lists of `{name, value, unit}` records; gate entries
/// carry `gate`, `qubits` and a `parameters` list of the same records.
/// Times are normalized to microseconds, gate lengths to nanoseconds.
pub fn parse_calibration(device: &str, body: &Value) -> CalibrationData {
    let mut data = CalibrationData {
        device: device.to_string(),
        last_update: None,
        qubits: Vec::new(),
        gates: Vec::new(),
    };
    let Some(doc) = parse_document(body) else {
        return data;
    };

    data.last_update = first_string(&doc, &[&["last_update_date"], &["last_update"]]);

    if let Some(Value::Array(qubits)) = doc.get("qubits") {
        for (index, params) in qubits.iter().enumerate() {
            let Some(params) = params.as_array() else {
                continue;
            };
            let mut qubit = QubitCalibration {
                qubit: u32::try_from(index).unwrap_or(u32::MAX),
                ..QubitCalibration::default()
            };
            for param in params {
                let Some((name, value, unit)) = property(param) else {
                    continue;
                };
                match name {
                    "T1" => qubit.t1_us = Some(to_microseconds(value, unit)),
                    "T2" => qubit.t2_us = Some(to_microseconds(value, unit)),
                    "readout_error" => qubit.readout_error = Some(value),
                    _ => {}
                }
            }
            data.qubits.push(qubit);
        }
    }

    if let Some(Value::Array(gates)) = doc.get("gates") {
        for gate in gates {
            let Some(name) = gate.get("gate").and_then(Value::as_str) else {
                continue;
            };
            let qubits = gate
                .get("qubits")
                .and_then(Value::as_array)
                .map(|qs| {
                    qs.iter()
                        .filter_map(Value::as_u64)
                        .filter_map(|q| u32::try_from(q).ok())
                        .collect()
                })
                .unwrap_or_default();
            let mut calibration = GateCalibration {
                gate: name.to_string(),
                qubits,
                error: None,
                length_ns: None,
            };
            for param in gate.get("parameters").and_then(Value::as_array).into_iter().flatten() {
                match property(param) {
                    Some(("gate_error", value, _)) => calibration.error = Some(value),
                    Some(("gate_length", value, unit)) => {
                        calibration.length_ns = Some(to_microseconds(value, unit) * 1000.0);
                    }
                    _ => {}
                }
            }
            data.gates.push(calibration);
        }
    }

    data
}

fn property(param: &Value) -> Option<(&str, f64, &str)> {
    let name = param.get("name")?.as_str()?;
    let value = param.get("value")?.as_f64()?;
    let unit = param.get("unit").and_then(Value::as_str).unwrap_or("");
    Some((name, value, unit))
}

fn to_microseconds(value: f64, unit: &str) -> f64 {
    match unit {
        "s" => value * 1e6,
        "ms" => value * 1e3,
        "ns" => value / 1e3,
        _ => value,
    }
}

/// Queue snapshot from a backend status document.
pub fn parse_queue_status(device: &str, body: &Value) -> QueueStatus {
    let doc = parse_document(body);
    let doc = doc.as_deref();

    let pending_jobs = doc
        .and_then(|d| first_present(d, PENDING_JOB_PATHS))
        .and_then(Value::as_u64)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX));
    let operational = doc.and_then(|d| {
        d.get("state")
            .and_then(Value::as_bool)
            .or_else(|| d.get("operational").and_then(Value::as_bool))
    });
    let status_message = doc.and_then(|d| {
        first_string(d, &[&["status"], &["message"], &["status_msg"]])
    });

    QueueStatus {
        device: device.to_string(),
        pending_jobs,
        operational,
        status_message,
        observed_at: Utc::now(),
    }
}

/// Capabilities for a device, chosen by processor family.
///
/// Heron devices get the CZ gate set; everything else that is not a
/// simulator is treated as Eagle.
pub fn capabilities_for(device: &str) -> Capabilities {
    if is_simulator(device) {
        Capabilities::simulator(device, 32)
    } else if device == "ibm_torino" {
        Capabilities::ibm_heron(device, 133)
    } else if PREMIUM_DEVICES.contains(&device) {
        Capabilities::ibm_heron(device, 156)
    } else {
        Capabilities::ibm_eagle(device, 127)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cloud_device_list() {
        let body = json!({"devices": [
            {"name": "ibm_fez", "status": {"name": "online"}, "qubits": 156},
            {"name": "ibm_torino", "status": {"name": "online"}},
            "ibm_marrakesh"
        ]});
        let devices = parse_device_list(&body);
        assert_eq!(devices.len(), 3);
        assert_eq!(devices[0].name, "ibm_fez");
        assert_eq!(devices[0].num_qubits, Some(156));
        assert_eq!(devices[0].status.as_deref(), Some("online"));
        assert_eq!(devices[2], DeviceInfo::named("ibm_marrakesh"));
    }

    #[test]
    fn test_legacy_device_list() {
        let body = json!({"backends": [
            {"backend_name": "ibmq_qasm_simulator", "n_qubits": 32, "simulator": true, "status": "active"},
            {"no_name": true}
        ]});
        let devices = parse_device_list(&body);
        assert_eq!(devices.len(), 1);
        assert!(devices[0].simulator);
        assert_eq!(devices[0].status.as_deref(), Some("active"));
    }

    #[test]
    fn test_device_list_from_string_and_garbage() {
        let body = json!(r#"["ibm_fez", "ibm_torino"]"#);
        assert_eq!(parse_device_list(&body).len(), 2);
        assert!(parse_device_list(&json!("oops")).is_empty());
        assert!(parse_device_list(&json!({"devices": 3})).is_empty());
    }

    #[test]
    fn test_topology_from_coupling_map() {
        let body = json!({"coupling_map": [[0, 1], [1, 0], [1, 2], [2, 1], ["x", 3]]});
        let topology = parse_topology(&body);
        assert_eq!(topology.edges, vec![(0, 1), (1, 2)]);
        assert!(topology.is_connected(2, 1));
        assert!(parse_topology(&json!({})).edges.is_empty());
    }

    #[test]
    fn test_calibration_parsing() {
        let body = json!({
            "last_update_date": "2026-10-01T00:00:00Z",
            "qubits": [
                [
                    {"name": "T1", "value": 120.5, "unit": "us"},
                    {"name": "T2", "value": 0.09, "unit": "ms"},
                    {"name": "readout_error", "value": 0.012}
                ],
                [{"name": "T1", "value": 100000.0, "unit": "ns"}]
            ],
            "gates": [
                {"gate": "cz", "qubits": [0, 1], "parameters": [
                    {"name": "gate_error", "value": 0.003},
                    {"name": "gate_length", "value": 68.0, "unit": "ns"}
                ]}
            ]
        });
        let cal = parse_calibration("ibm_fez", &body);
        assert_eq!(cal.last_update.as_deref(), Some("2026-10-01T00:00:00Z"));
        assert_eq!(cal.qubits.len(), 2);
        assert_eq!(cal.qubits[0].t1_us, Some(120.5));
        assert!((cal.qubits[0].t2_us.unwrap() - 90.0).abs() < 1e-9);
        assert_eq!(cal.qubits[0].readout_error, Some(0.012));
        assert!((cal.qubits[1].t1_us.unwrap() - 100.0).abs() < 1e-9);
        assert_eq!(cal.gates[0].qubits, vec![0, 1]);
        assert_eq!(cal.gates[0].error, Some(0.003));
        assert!((cal.gates[0].length_ns.unwrap() - 68.0).abs() < 1e-9);
    }

    #[test]
    fn test_calibration_from_garbage_is_empty() {
        let cal = parse_calibration("ibm_fez", &json!("<html>"));
        assert_eq!(cal.device, "ibm_fez");
        assert!(cal.qubits.is_empty());
        assert!(cal.gates.is_empty());
    }

    #[test]
    fn test_queue_status() {
        let body = json!({"state": true, "status": "active", "length_queue": 17});
        let queue = parse_queue_status("ibm_torino", &body);
        assert_eq!(queue.pending_jobs, Some(17));
        assert_eq!(queue.operational, Some(true));
        assert_eq!(queue.status_message.as_deref(), Some("active"));

        let empty = parse_queue_status("ibm_torino", &Value::Null);
        assert_eq!(empty.pending_jobs, None);
        assert_eq!(empty.operational, None);
    }

    #[test]
    fn test_capabilities_by_family() {
        assert_eq!(capabilities_for("ibm_torino").num_qubits, 133);
        assert!(capabilities_for("ibm_fez").gate_set.contains("cz"));
        assert!(capabilities_for("ibm_brisbane").gate_set.contains("ecr"));
        assert!(capabilities_for("aer_simulator").is_simulator);
    }
}
