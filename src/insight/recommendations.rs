//! Ordered threshold rules producing operator guidance.
//!
//! Rules run in a fixed order and each appends at most one message. The low
//! and monitor power-factor rules are mutually exclusive; every other rule is
//! an independent guard. When nothing fires a single nominal message is
//! emitted, so the list is never empty. Message order is part of the output.

use crate::domain::{CircuitLoad, Recommendation, RecommendationKind, Severity};

pub const LOW_POWER_FACTOR: f64 = 0.90;
pub const TARGET_POWER_FACTOR: f64 = 0.95;
pub const IMBALANCE_LIMIT_PCT: f64 = 5.0;
/// Fraction of the contracted peak at which the site is "approaching" it.
pub const DEMAND_LIMIT_FRACTION: f64 = 0.9;
/// Share of site load above which one circuit counts as dominant.
pub const DOMINANT_SHARE: f64 = 0.4;

/// Derived values the rules look at.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleInputs {
    pub power_factor: f64,
    pub imbalance_pct: f64,
    pub total_load_kw: f64,
    pub dominant_circuit: Option<CircuitLoad>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationEngine {
    peak_demand_threshold_kw: f64,
}

impl RecommendationEngine {
    pub fn new(peak_demand_threshold_kw: f64) -> Self {
        Self {
            peak_demand_threshold_kw,
        }
    }

    pub fn evaluate(&self, input: &RuleInputs) -> Vec<Recommendation> {
        let mut out = Vec::new();

        if input.power_factor < LOW_POWER_FACTOR {
            out.push(recommendation(
                RecommendationKind::LowPowerFactor,
                Severity::High,
                "Low power factor detected: install or tune power factor correction capacitors to avoid reactive power penalties.".into(),
            ));
        } else if input.power_factor < TARGET_POWER_FACTOR {
            out.push(recommendation(
                RecommendationKind::MonitorPowerFactor,
                Severity::Informational,
                "Power factor is acceptable but not optimal: continued monitoring is recommended.".into(),
            ));
        }

        if input.imbalance_pct > IMBALANCE_LIMIT_PCT {
            out.push(recommendation(
                RecommendationKind::PhaseImbalance,
                Severity::Warning,
                "High phase voltage imbalance detected: investigate phase loading.".into(),
            ));
        }

        if input.total_load_kw > self.peak_demand_threshold_kw * DEMAND_LIMIT_FRACTION {
            out.push(recommendation(
                RecommendationKind::ApproachingDemandLimit,
                Severity::Warning,
                "Site approaching contract demand limit: shift non-critical loads to avoid penalties.".into(),
            ));
        }

        if let Some(top) = &input.dominant_circuit {
            if top.kw > input.total_load_kw * DOMINANT_SHARE {
                out.push(recommendation(
                    RecommendationKind::DominantLoad,
                    Severity::Informational,
                    format!(
                        "{} is the dominant load: optimisation here offers the highest savings potential.",
                        top.name
                    ),
                ));
            }
        }

        if out.is_empty() {
            out.push(recommendation(
                RecommendationKind::Nominal,
                Severity::Nominal,
                "System operating within optimal parameters: no immediate corrective actions required.".into(),
            ));
        }

        out
    }
}

fn recommendation(kind: RecommendationKind, severity: Severity, message: String) -> Recommendation {
    Recommendation {
        kind,
        severity,
        message,
    }
}
