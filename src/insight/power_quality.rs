//! Power factor and phase-voltage imbalance.
//!
//! Imbalance is only computed when all three line voltages are present and
//! non-zero. With one or two valid phases the value is `0`: partial phase data
//! is treated as unknown, never extrapolated.

use serde::{Deserialize, Serialize};

use crate::domain::{PhaseVoltages, Snapshot, PHASE_VOLTAGE_FIELDS, POWER_FACTOR_FIELD};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerQuality {
    pub power_factor: f64,
    pub voltages: PhaseVoltages,
    pub imbalance_pct: f64,
    /// Number of phases that contributed to `imbalance_pct`.
    pub valid_phases: usize,
}

pub fn power_factor(snapshot: &Snapshot) -> f64 {
    snapshot.numeric_or_zero(POWER_FACTOR_FIELD)
}

pub fn phase_voltages(snapshot: &Snapshot) -> PhaseVoltages {
    let [l1, l2, l3] = PHASE_VOLTAGE_FIELDS;
    PhaseVoltages {
        l1_v: snapshot.numeric_or_zero(l1),
        l2_v: snapshot.numeric_or_zero(l2),
        l3_v: snapshot.numeric_or_zero(l3),
    }
}

/// `(max - min) / mean * 100` over exactly three non-zero voltages, else `0`.
pub fn phase_imbalance_pct(voltages: &PhaseVoltages) -> f64 {
    let valid: Vec<f64> = voltages
        .as_array()
        .into_iter()
        .filter(|v| *v != 0.0)
        .collect();
    if valid.len() != 3 {
        return 0.0;
    }
    let max = valid.iter().copied().fold(f64::MIN, f64::max);
    let min = valid.iter().copied().fold(f64::MAX, f64::min);
    let mean = valid.iter().sum::<f64>() / 3.0;
    if mean == 0.0 {
        return 0.0;
    }
    (max - min) / mean * 100.0
}

pub fn analyze(snapshot: &Snapshot) -> PowerQuality {
    let voltages = phase_voltages(snapshot);
    PowerQuality {
        power_factor: power_factor(snapshot),
        voltages,
        imbalance_pct: phase_imbalance_pct(&voltages),
        valid_phases: voltages.as_array().iter().filter(|v| **v != 0.0).count(),
    }
}
