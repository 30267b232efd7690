use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Register carrying the main incomer power factor.
pub const POWER_FACTOR_FIELD: &str = "Main Incomer Power Factor";

/// Registers carrying the three line voltages, in phase order.
pub const PHASE_VOLTAGE_FIELDS: [&str; 3] = ["L1 Voltage", "L2 Voltage", "L3 Voltage"];

/// One point-in-time reading from the submeter.
///
/// Register values are kept as raw JSON because the meter backend may report
/// numbers, numeric strings, or garbage for any field. Callers go through
/// [`Snapshot::numeric`], which never fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meter_name: Option<String>,
    pub readings: BTreeMap<String, Value>,
}

impl Snapshot {
    pub fn new(timestamp: DateTime<Utc>, readings: BTreeMap<String, Value>) -> Self {
        Self {
            timestamp,
            meter_name: None,
            readings,
        }
    }

    pub fn with_meter_name(mut self, name: impl Into<String>) -> Self {
        self.meter_name = Some(name.into());
        self
    }

    /// Numeric value of a register, or `None` when absent or not a finite number.
    pub fn numeric(&self, field: &str) -> Option<f64> {
        self.readings.get(field).and_then(numeric_value)
    }

    /// Numeric value of a register with missing/non-numeric treated as `0`.
    pub fn numeric_or_zero(&self, field: &str) -> f64 {
        self.numeric(field).unwrap_or(0.0)
    }
}

/// Interpret a raw register value as a finite number.
///
/// Numeric strings count (the meter backend occasionally quotes values);
/// booleans, nulls, objects and non-finite results do not.
pub fn numeric_value(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}
