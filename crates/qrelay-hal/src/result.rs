//! Measurement counts.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Bitstring → occurrence count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    counts: FxHashMap<String, u64>,
}

impl Counts {
    /// Empty counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a measurement structure.
    ///
    /// Accepts:
    /// - a bitstring → count mapping (hex keys such as `0x3` are expanded);
    /// - sampler-v2 shapes, i.e. a `samples` array of hex strings, directly or
    ///   under `data.<register>`, or a list of such pub results (first wins).
    ///
    /// Non-integer counts are skipped; anything else yields empty counts.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Array(items) => items.first().map(Self::from_value).unwrap_or_default(),
            Value::Object(map) => {
                if let Some(Value::Array(samples)) = map.get("samples") {
                    return Self::from_samples(samples);
                }
                if let Some(Value::Object(data)) = map.get("data") {
                    let mut counts = Self::new();
                    for register in data.values() {
                        if let Some(Value::Array(samples)) = register.get("samples") {
                            for (bits, n) in Self::from_samples(samples).iter() {
                                counts.insert(bits, n);
                            }
                        }
                    }
                    return counts;
                }
                Self::from_mapping(map)
            }
            _ => Self::new(),
        }
    }

    fn from_mapping(map: &Map<String, Value>) -> Self {
        let hex_keys: Vec<&str> = map
            .keys()
            .filter(|k| k.starts_with("0x"))
            .map(String::as_str)
            .collect();
        let width = infer_bit_width(&hex_keys);

        let mut counts = Self::new();
        for (key, value) in map {
            let Some(n) = value.as_u64() else { continue };
            if key.starts_with("0x") {
                counts.insert(hex_to_binary(key, width), n);
            } else {
                counts.insert(key.clone(), n);
            }
        }
        counts
    }

    fn from_samples(samples: &[Value]) -> Self {
        let samples: Vec<&str> = samples.iter().filter_map(Value::as_str).collect();
        let width = infer_bit_width(&samples);
        let mut counts = Self::new();
        for sample in samples {
            counts.insert(hex_to_binary(sample, width), 1);
        }
        counts
    }

    /// Add `count` occurrences of `bitstring`.
    pub fn insert(&mut self, bitstring: impl Into<String>, count: u64) {
        *self.counts.entry(bitstring.into()).or_insert(0) += count;
    }

    /// Occurrences of `bitstring` (zero if absent).
    pub fn get(&self, bitstring: &str) -> u64 {
        self.counts.get(bitstring).copied().unwrap_or(0)
    }

    /// Sum over all outcomes.
    pub fn total_shots(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Number of distinct outcomes.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no outcome was recorded.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The most frequent outcome; ties broken by lexicographic order.
    pub fn most_frequent(&self) -> Option<(&str, u64)> {
        self.counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(k, v)| (k.as_str(), *v))
    }

    /// Iterate over outcomes.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Infer the classical register bit width from hex samples.
///
/// Uses the bit length of the largest value; all-zero input needs one bit.
pub fn infer_bit_width(samples: &[&str]) -> usize {
    let max_val = samples
        .iter()
        .filter_map(|s| {
            let hex = s.strip_prefix("0x").unwrap_or(s);
            u64::from_str_radix(hex, 16).ok()
        })
        .max()
        .unwrap_or(0);

    if max_val == 0 {
        1
    } else {
        64 - max_val.leading_zeros() as usize
    }
}

/// Convert a hex string to binary, padded to `width` bits.
///
/// With `width == 0` the width falls back to 4 bits per hex digit. Input
/// that is not hex is returned unchanged.
pub fn hex_to_binary(hex: &str, width: usize) -> String {
    let hex = hex.strip_prefix("0x").unwrap_or(hex);

    if let Ok(value) = u64::from_str_radix(hex, 16) {
        let width = if width > 0 { width } else { hex.len() * 4 };
        format!("{value:0>width$b}")
    } else {
        hex.to_string()
    }
}
