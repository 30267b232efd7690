use std::cmp::Ordering;

use crate::domain::{CircuitLoad, Snapshot};

/// Fixed, ordered list of circuit registers that make up site load.
///
/// Order matters: it breaks ties when ranking circuits by load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitSet {
    names: Vec<String>,
}

impl CircuitSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Total site load in watts. Missing or non-numeric circuits count as zero.
pub fn aggregate_load(snapshot: &Snapshot, circuits: &CircuitSet) -> f64 {
    circuits
        .names()
        .iter()
        .map(|c| snapshot.numeric_or_zero(c))
        .sum()
}

/// Per-circuit load in kW, heaviest first, ties in circuit-set order.
pub fn per_circuit_breakdown(snapshot: &Snapshot, circuits: &CircuitSet) -> Vec<CircuitLoad> {
    let mut loads: Vec<CircuitLoad> = circuits
        .names()
        .iter()
        .map(|c| CircuitLoad::new(c.clone(), snapshot.numeric_or_zero(c) / 1000.0))
        .collect();
    // sort_by is stable
    loads.sort_by(|a, b| b.kw.partial_cmp(&a.kw).unwrap_or(Ordering::Equal));
    loads
}

/// Heaviest circuit of a breakdown produced by [`per_circuit_breakdown`].
pub fn dominant_circuit(breakdown: &[CircuitLoad]) -> Option<&CircuitLoad> {
    breakdown.first()
}
