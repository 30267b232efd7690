use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::domain::{DerivedMetrics, PhaseVoltages};

/// One past pass, as kept for trend and radar views.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistorySample {
    pub timestamp: DateTime<Utc>,
    pub total_load_kw: f64,
    pub power_factor: f64,
    pub voltages: PhaseVoltages,
}

impl HistorySample {
    pub fn carbon_kg(&self, emission_factor_kg_per_kwh: f64) -> f64 {
        self.total_load_kw * emission_factor_kg_per_kwh
    }
}

impl From<&DerivedMetrics> for HistorySample {
    fn from(m: &DerivedMetrics) -> Self {
        Self {
            timestamp: m.timestamp,
            total_load_kw: m.total_load_kw,
            power_factor: m.power_factor,
            voltages: m.phase_voltages,
        }
    }
}

/// Bounded FIFO of past samples, oldest first.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    capacity: usize,
    samples: VecDeque<HistorySample>,
}

impl HistoryBuffer {
    /// A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    /// Push to the tail, evicting from the head when full.
    pub fn append(&mut self, sample: HistorySample) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn snapshot(&self) -> Vec<HistorySample> {
        self.samples.iter().copied().collect()
    }

    pub fn latest(&self) -> Option<&HistorySample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
