use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    domain::{ConnectionStatus, DerivedMetrics, PeakDemandAlert},
    insight::HistorySample,
};

/// Tick bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickStats {
    pub last_run: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub run_count: u64,
    pub success_count: u64,
    pub error_count: u64,
}

/// Immutable view of the pipeline, republished after every state change.
///
/// `metrics` holds the last good pass and survives fetch failures; check
/// [`InsightState::is_stale`] before presenting it as live.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InsightState {
    pub status: ConnectionStatus,
    pub metrics: Option<DerivedMetrics>,
    /// Oldest first.
    pub history: Vec<HistorySample>,
    pub history_capacity: usize,
    /// Most recent peak demand breaches, oldest first.
    pub alerts: Vec<PeakDemandAlert>,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub stats: TickStats,
}

impl InsightState {
    pub fn is_stale(&self) -> bool {
        self.metrics.is_some() && self.status.is_disconnected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_state_is_not_stale() {
        let state = InsightState {
            status: ConnectionStatus::Error {
                reason: "boom".into(),
            },
            ..Default::default()
        };
        assert!(!state.is_stale());
    }
}
