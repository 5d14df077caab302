//! Cost estimate types.
//!
//! Estimates are derived values: they are computed locally from a circuit,
//! a shot count and a device, and are never persisted.

use serde::{Deserialize, Serialize};

/// Pricing classification of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingTier {
    /// Newest-generation hardware.
    Premium,
    /// Current-generation hardware; the default for unrecognized devices.
    Standard,
    /// Older hardware.
    Entry,
    /// Classical simulation.
    Simulator,
}

impl PricingTier {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingTier::Premium => "premium",
            PricingTier::Standard => "standard",
            PricingTier::Entry => "entry",
            PricingTier::Simulator => "simulator",
        }
    }

    /// Whether the tier is real hardware.
    pub fn is_hardware(&self) -> bool {
        !matches!(self, PricingTier::Simulator)
    }
}

impl std::fmt::Display for PricingTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Itemized cost estimate. Monetary amounts in USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    /// Device the estimate was computed for.
    pub device: String,
    /// Tier the device resolved to.
    pub tier: PricingTier,
    /// Shots requested.
    pub shots: u32,
    /// Gate operations counted (measurements, resets and barriers excluded).
    pub gate_count: usize,
    /// Estimated execution time in microseconds.
    pub execution_time_us: f64,
    /// Estimated execution time in seconds.
    pub execution_time_seconds: f64,
    /// Execution time × tier rate.
    pub processor_time_cost: f64,
    /// Per-shot fee; zero on simulators.
    pub shot_cost: f64,
    /// Surcharge for gates beyond the complexity threshold.
    pub complexity_fee: f64,
    /// Reserved; always zero.
    pub priority_fee: f64,
    /// Sum of the four components.
    pub total_cost: f64,
    /// `total_cost` in provider credits.
    pub estimated_credits: f64,
}
