//! # Insight pipeline
//!
//! Turns one meter [`Snapshot`] into [`DerivedMetrics`]:
//!
//! 1. aggregation: site load and per-circuit breakdown
//! 2. power quality: power factor and phase imbalance
//! 3. scoring: carbon, efficiency, ESG, social impact, health radar
//! 4. recommendations: ordered threshold rules
//!
//! A pass is synchronous and pure. The same snapshot always yields the same
//! metrics; nothing is carried over between passes. History is kept by the
//! caller in a [`HistoryBuffer`].

pub mod aggregation;
pub mod history;
pub mod power_quality;
pub mod recommendations;
pub mod scoring;

pub use aggregation::{aggregate_load, dominant_circuit, per_circuit_breakdown, CircuitSet};
pub use history::{HistoryBuffer, HistorySample};
pub use power_quality::PowerQuality;
pub use recommendations::{RecommendationEngine, RuleInputs};
pub use scoring::ScoringParams;

use crate::{
    config::InsightConfig,
    domain::{DerivedMetrics, Snapshot},
};

#[derive(Debug, Clone)]
pub struct InsightPipeline {
    circuits: CircuitSet,
    params: ScoringParams,
    rules: RecommendationEngine,
}

impl InsightPipeline {
    pub fn new(circuits: CircuitSet, params: ScoringParams) -> Self {
        let rules = RecommendationEngine::new(params.peak_demand_threshold_kw);
        Self {
            circuits,
            params,
            rules,
        }
    }

    pub fn from_config(cfg: &InsightConfig) -> Self {
        Self::new(CircuitSet::new(cfg.circuits.iter().cloned()), ScoringParams::from(cfg))
    }

    pub fn params(&self) -> &ScoringParams {
        &self.params
    }

    pub fn circuits(&self) -> &CircuitSet {
        &self.circuits
    }

    pub fn derive(&self, snapshot: &Snapshot) -> DerivedMetrics {
        let total_load_kw = aggregate_load(snapshot, &self.circuits) / 1000.0;
        let circuits = per_circuit_breakdown(snapshot, &self.circuits);
        let dominant = dominant_circuit(&circuits).cloned();

        let pq = power_quality::analyze(snapshot);

        let carbon_kg = scoring::carbon_kg(total_load_kw, self.params.emission_factor_kg_per_kwh);
        let efficiency_score = scoring::efficiency_score(pq.power_factor, pq.imbalance_pct);
        let esg_score = scoring::esg_score(efficiency_score, carbon_kg, pq.power_factor);
        let social_impact_index =
            scoring::social_impact_index(total_load_kw, self.params.occupant_count);
        let health_radar = scoring::health_radar(scoring::RadarInputs {
            total_load_kw,
            peak_demand_threshold_kw: self.params.peak_demand_threshold_kw,
            power_factor: pq.power_factor,
            imbalance_pct: pq.imbalance_pct,
            carbon_kg,
            dominant_circuit_kw: dominant.as_ref().map_or(0.0, |c| c.kw),
        });

        let recommendations = self.rules.evaluate(&RuleInputs {
            power_factor: pq.power_factor,
            imbalance_pct: pq.imbalance_pct,
            total_load_kw,
            dominant_circuit: dominant.clone(),
        });

        DerivedMetrics {
            timestamp: snapshot.timestamp,
            total_load_kw,
            circuits,
            dominant_circuit: dominant,
            power_factor: pq.power_factor,
            phase_voltages: pq.voltages,
            phase_imbalance_pct: pq.imbalance_pct,
            carbon_kg,
            efficiency_score,
            esg_score,
            social_impact_index,
            waste_proxy: scoring::waste_proxy(efficiency_score),
            sdg_alignment: scoring::sdg_alignment(efficiency_score, esg_score),
            load_level: scoring::load_level(total_load_kw),
            load_trend: scoring::load_trend(total_load_kw),
            intensity: scoring::intensity(total_load_kw, &self.params),
            cost: scoring::cost_rate(total_load_kw, &self.params),
            recommendations,
            health_radar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LoadLevel, LoadTrend, RecommendationKind};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn site_snapshot() -> Snapshot {
        let readings = serde_json::from_value(json!({
            "HVAC/Aircom": 30000.0,
            "Local Mains": 12000.0,
            "Kitchen": 8000.0,
            "Server Room": 5000.0,
            "Canteen": "2000",
            "Passage Plugs": 1000.0,
            "Caretaker Flat": null,
            "Main Incomer": 58000.0,
            "Main Incomer Power Factor": 0.88,
            "L1 Voltage": 225.0,
            "L2 Voltage": 235.0,
            "L3 Voltage": 230.0
        }))
        .unwrap();
        Snapshot::new(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(), readings)
    }

    #[test]
    fn test_full_pass() {
        let pipeline = InsightPipeline::from_config(&InsightConfig::default());
        let m = pipeline.derive(&site_snapshot());

        assert!((m.total_load_kw - 58.0).abs() < 1e-9);
        assert_eq!(m.dominant_circuit.as_ref().map(|c| c.name.as_str()), Some("HVAC/Aircom"));
        assert_eq!(m.circuits.len(), 8);
        assert_eq!(m.power_factor, 0.88);
        let expected_imbalance = (235.0 - 225.0) / 230.0 * 100.0;
        assert!((m.phase_imbalance_pct - expected_imbalance).abs() < 1e-9);
        assert!((m.carbon_kg - 55.1).abs() < 1e-9);
        // 0.88*70 = 61.6, (5 - 4.3478)*6 = 3.913 -> 65.5 -> 66
        assert_eq!(m.efficiency_score, 66);
        // 66*0.4 = 26.4, (100-55.1)*0.4 = 17.96, 0.88*20 = 17.6 -> 61.96 -> 62
        assert_eq!(m.esg_score, 62);
        assert_eq!(m.social_impact_index, 9.5);
        assert_eq!(m.waste_proxy, 133);
        assert_eq!(m.sdg_alignment.responsible_consumption, 57);
        assert_eq!(m.load_level, LoadLevel::High);
        assert_eq!(m.load_trend, LoadTrend::Up);

        let kinds: Vec<_> = m.recommendations.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            [RecommendationKind::LowPowerFactor, RecommendationKind::DominantLoad]
        );
    }

    #[test]
    fn test_derive_is_deterministic() {
        let pipeline = InsightPipeline::from_config(&InsightConfig::default());
        let snapshot = site_snapshot();
        let first = pipeline.derive(&snapshot);
        let second = pipeline.derive(&snapshot);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_empty_snapshot_is_not_an_error() {
        let pipeline = InsightPipeline::from_config(&InsightConfig::default());
        let m = pipeline.derive(&Snapshot::new(Utc::now(), Default::default()));
        assert_eq!(m.total_load_kw, 0.0);
        assert_eq!(m.phase_imbalance_pct, 0.0);
        assert_eq!(m.health_radar.circuit_balance, 0.0);
        assert!(!m.recommendations.is_empty());
        assert_eq!(m.recommendations[0].kind, RecommendationKind::LowPowerFactor);
    }
}
