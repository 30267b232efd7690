//! ESG and efficiency scoring.
//!
//! All formulas are linear heuristics, not physical models. Coefficients are
//! kept exactly as published on the dashboard so numbers match between views.

use crate::{
    config::InsightConfig,
    domain::{CostRate, EnergyIntensity, HealthRadar, LoadLevel, LoadTrend, SdgAlignment},
};

/// Per-occupant load below which the social impact index is high.
pub const SOCIAL_USAGE_THRESHOLD_KW: f64 = 2.0;
pub const SOCIAL_INDEX_LOW_USAGE: f64 = 9.5;
pub const SOCIAL_INDEX_HIGH_USAGE: f64 = 8.2;
pub const SOCIAL_INDEX_MAX: f64 = 10.0;

/// Waste units per efficiency point lost.
pub const WASTE_PER_EFFICIENCY_POINT: f64 = 3.9;
/// Responsible-consumption progress trails the ESG score by this much.
pub const SDG12_ESG_OFFSET: i16 = 5;

pub const HIGH_LOAD_KW: f64 = 15.0;
pub const MODERATE_LOAD_KW: f64 = 8.0;
pub const TREND_UP_KW: f64 = 10.0;
pub const TREND_DOWN_KW: f64 = 3.0;

/// Site constants the scorer needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringParams {
    pub emission_factor_kg_per_kwh: f64,
    pub peak_demand_threshold_kw: f64,
    pub occupant_count: u32,
    pub floor_area_m2: f64,
    pub tariff_per_kwh: f64,
    pub currency: String,
}

impl From<&InsightConfig> for ScoringParams {
    fn from(cfg: &InsightConfig) -> Self {
        Self {
            emission_factor_kg_per_kwh: cfg.emission_factor_kg_per_kwh,
            peak_demand_threshold_kw: cfg.peak_demand_threshold_kw,
            occupant_count: cfg.occupant_count,
            floor_area_m2: cfg.floor_area_m2,
            tariff_per_kwh: cfg.tariff_per_kwh,
            currency: cfg.currency.clone(),
        }
    }
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self::from(&InsightConfig::default())
    }
}

/// Clamp to [0, 100]; NaN collapses to 0.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

fn rounded_score(value: f64) -> u8 {
    clamp_percent(value.round()) as u8
}

fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

pub fn carbon_kg(total_load_kw: f64, emission_factor_kg_per_kwh: f64) -> f64 {
    total_load_kw * emission_factor_kg_per_kwh
}

pub fn efficiency_score(power_factor: f64, imbalance_pct: f64) -> u8 {
    rounded_score(power_factor * 70.0 + (5.0 - imbalance_pct).max(0.0) * 6.0)
}

pub fn esg_score(efficiency_score: u8, carbon_kg: f64, power_factor: f64) -> u8 {
    rounded_score(
        f64::from(efficiency_score) * 0.4 + (100.0 - carbon_kg).max(0.0) * 0.4 + power_factor * 20.0,
    )
}

/// Two-tier proxy: lower usage per occupant scores higher.
///
/// With no occupants configured per-occupant usage is unbounded, so the
/// index always takes the high-usage tier.
pub fn social_impact_index(total_load_kw: f64, occupant_count: u32) -> f64 {
    if occupant_count == 0 {
        return SOCIAL_INDEX_HIGH_USAGE;
    }
    let per_occupant = total_load_kw / f64::from(occupant_count);
    let index = if per_occupant < SOCIAL_USAGE_THRESHOLD_KW {
        SOCIAL_INDEX_LOW_USAGE
    } else {
        SOCIAL_INDEX_HIGH_USAGE
    };
    index.clamp(0.0, SOCIAL_INDEX_MAX)
}

pub fn waste_proxy(efficiency_score: u8) -> u16 {
    let shortfall = 100.0 - f64::from(efficiency_score.min(100));
    (shortfall * WASTE_PER_EFFICIENCY_POINT).round() as u16
}

pub fn sdg_alignment(efficiency_score: u8, esg_score: u8) -> SdgAlignment {
    let cap = |v: i16| v.clamp(0, 100) as u8;
    SdgAlignment {
        affordable_energy: cap(i16::from(efficiency_score)),
        responsible_consumption: cap(i16::from(esg_score) - SDG12_ESG_OFFSET),
        climate_action: cap(i16::from(esg_score)),
    }
}

pub fn load_level(total_load_kw: f64) -> LoadLevel {
    if total_load_kw > HIGH_LOAD_KW {
        LoadLevel::High
    } else if total_load_kw > MODERATE_LOAD_KW {
        LoadLevel::Moderate
    } else {
        LoadLevel::Normal
    }
}

pub fn load_trend(total_load_kw: f64) -> LoadTrend {
    if total_load_kw > TREND_UP_KW {
        LoadTrend::Up
    } else if total_load_kw < TREND_DOWN_KW {
        LoadTrend::Down
    } else {
        LoadTrend::Stable
    }
}

pub fn intensity(total_load_kw: f64, params: &ScoringParams) -> EnergyIntensity {
    EnergyIntensity {
        kw_per_m2: ratio_or_zero(total_load_kw, params.floor_area_m2),
        kw_per_occupant: ratio_or_zero(total_load_kw, f64::from(params.occupant_count)),
    }
}

pub fn cost_rate(total_load_kw: f64, params: &ScoringParams) -> CostRate {
    CostRate {
        per_hour: total_load_kw * params.tariff_per_kwh,
        tariff_per_kwh: params.tariff_per_kwh,
        currency: params.currency.clone(),
    }
}

/// Inputs to [`health_radar`], all already derived for the pass.
#[derive(Debug, Clone, Copy)]
pub struct RadarInputs {
    pub total_load_kw: f64,
    pub peak_demand_threshold_kw: f64,
    pub power_factor: f64,
    pub imbalance_pct: f64,
    pub carbon_kg: f64,
    pub dominant_circuit_kw: f64,
}

pub fn health_radar(i: RadarInputs) -> HealthRadar {
    let circuit_balance = if i.total_load_kw == 0.0 {
        0.0
    } else {
        100.0 - (i.dominant_circuit_kw / i.total_load_kw) * 100.0
    };
    HealthRadar {
        load_health: clamp_percent(
            100.0 - ratio_or_zero(i.total_load_kw, i.peak_demand_threshold_kw) * 100.0,
        ),
        power_factor: clamp_percent(i.power_factor * 100.0),
        phase_balance: clamp_percent(100.0 - i.imbalance_pct * 5.0),
        carbon_impact: clamp_percent(100.0 - i.carbon_kg * 2.0),
        circuit_balance: clamp_percent(circuit_balance),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_carbon_uses_emission_factor() {
        assert!((carbon_kg(10.0, 0.95) - 9.5).abs() < 1e-12);
    }

    #[test]
    fn test_efficiency_score_formula() {
        // 0.9*70 = 63, (5-1)*6 = 24
        assert_eq!(efficiency_score(0.9, 1.0), 87);
        assert_eq!(efficiency_score(0.9, 4.9), 64);
        // imbalance above 5 contributes nothing
        assert_eq!(efficiency_score(0.9, 8.0), 63);
        assert_eq!(efficiency_score(1.0, 0.0), 100);
        assert_eq!(efficiency_score(2.0, 0.0), 100);
        assert_eq!(efficiency_score(-1.0, 10.0), 0);
    }

    #[test]
    fn test_esg_score_formula() {
        // 87*0.4 = 34.8, (100-9.5)*0.4 = 36.2, 0.9*20 = 18
        assert_eq!(esg_score(87, 9.5, 0.9), 89);
        // carbon above 100 contributes nothing
        assert_eq!(esg_score(0, 250.0, 0.0), 0);
        assert_eq!(esg_score(100, 0.0, 1.0), 100);
    }

    #[test]
    fn test_social_impact_two_tiers() {
        assert_eq!(social_impact_index(45.0, 45), 9.5);
        assert_eq!(social_impact_index(90.0, 45), 8.2);
    }

    #[test]
    fn test_social_impact_without_occupants_is_high_usage_tier() {
        assert_eq!(social_impact_index(1.0, 0), SOCIAL_INDEX_HIGH_USAGE);
        assert_eq!(social_impact_index(0.0, 0), SOCIAL_INDEX_HIGH_USAGE);
        assert_eq!(social_impact_index(50.0, 0), SOCIAL_INDEX_HIGH_USAGE);
    }

    #[test]
    fn test_waste_proxy() {
        assert_eq!(waste_proxy(100), 0);
        // 34 * 3.9 = 132.6
        assert_eq!(waste_proxy(66), 133);
        assert_eq!(waste_proxy(0), 390);
    }

    #[test]
    fn test_sdg_alignment_offsets_and_caps() {
        assert_eq!(
            sdg_alignment(66, 62),
            SdgAlignment {
                affordable_energy: 66,
                responsible_consumption: 57,
                climate_action: 62,
            }
        );
        let low = sdg_alignment(0, 3);
        assert_eq!(low.responsible_consumption, 0);
        assert_eq!(sdg_alignment(100, 100).climate_action, 100);
    }

    #[rstest]
    #[case(0.0, LoadLevel::Normal, LoadTrend::Down)]
    #[case(2.9, LoadLevel::Normal, LoadTrend::Down)]
    #[case(3.0, LoadLevel::Normal, LoadTrend::Stable)]
    #[case(8.0, LoadLevel::Normal, LoadTrend::Stable)]
    #[case(8.1, LoadLevel::Moderate, LoadTrend::Stable)]
    #[case(10.0, LoadLevel::Moderate, LoadTrend::Stable)]
    #[case(10.5, LoadLevel::Moderate, LoadTrend::Up)]
    #[case(15.0, LoadLevel::Moderate, LoadTrend::Up)]
    #[case(15.1, LoadLevel::High, LoadTrend::Up)]
    fn test_load_level_and_trend_bands(
        #[case] kw: f64,
        #[case] level: LoadLevel,
        #[case] trend: LoadTrend,
    ) {
        assert_eq!(load_level(kw), level);
        assert_eq!(load_trend(kw), trend);
    }

    #[test]
    fn test_health_radar_values_and_clamping() {
        let radar = health_radar(RadarInputs {
            total_load_kw: 40.0,
            peak_demand_threshold_kw: 80.0,
            power_factor: 0.92,
            imbalance_pct: 2.0,
            carbon_kg: 38.0,
            dominant_circuit_kw: 10.0,
        });
        assert_eq!(radar.load_health, 50.0);
        assert!((radar.power_factor - 92.0).abs() < 1e-9);
        assert_eq!(radar.phase_balance, 90.0);
        assert_eq!(radar.carbon_impact, 24.0);
        assert_eq!(radar.circuit_balance, 75.0);

        let overloaded = health_radar(RadarInputs {
            total_load_kw: 200.0,
            peak_demand_threshold_kw: 80.0,
            power_factor: 1.2,
            imbalance_pct: 30.0,
            carbon_kg: 190.0,
            dominant_circuit_kw: 200.0,
        });
        assert_eq!(overloaded.load_health, 0.0);
        assert_eq!(overloaded.power_factor, 100.0);
        assert_eq!(overloaded.phase_balance, 0.0);
        assert_eq!(overloaded.carbon_impact, 0.0);
        assert_eq!(overloaded.circuit_balance, 0.0);
    }

    #[test]
    fn test_circuit_balance_zero_when_no_load() {
        let radar = health_radar(RadarInputs {
            total_load_kw: 0.0,
            peak_demand_threshold_kw: 80.0,
            power_factor: 0.0,
            imbalance_pct: 0.0,
            carbon_kg: 0.0,
            dominant_circuit_kw: 0.0,
        });
        assert_eq!(radar.circuit_balance, 0.0);
        assert_eq!(radar.load_health, 100.0);
    }

    #[test]
    fn test_intensity_and_cost() {
        let params = ScoringParams::default();
        let i = intensity(24.0, &params);
        assert!((i.kw_per_m2 - 0.02).abs() < 1e-12);
        assert!((i.kw_per_occupant - 24.0 / 45.0).abs() < 1e-12);

        let zero = ScoringParams {
            floor_area_m2: 0.0,
            occupant_count: 0,
            ..ScoringParams::default()
        };
        assert_eq!(intensity(24.0, &zero), EnergyIntensity::default());

        let cost = cost_rate(10.0, &params);
        assert!((cost.per_hour - 19.9).abs() < 1e-9);
        assert_eq!(cost.currency, "ZAR");
    }
}
