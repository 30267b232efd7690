use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Instantaneous load on one configured circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitLoad {
    pub name: String,
    pub kw: f64,
}

impl CircuitLoad {
    pub fn new(name: impl Into<String>, kw: f64) -> Self {
        Self {
            name: name.into(),
            kw,
        }
    }
}

/// Line voltages as reported; `0.0` stands in for a missing register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseVoltages {
    pub l1_v: f64,
    pub l2_v: f64,
    pub l3_v: f64,
}

impl PhaseVoltages {
    pub fn as_array(&self) -> [f64; 3] {
        [self.l1_v, self.l2_v, self.l3_v]
    }
}

/// Load normalised by building size and occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyIntensity {
    pub kw_per_m2: f64,
    pub kw_per_occupant: f64,
}

/// Running cost of the current load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRate {
    pub per_hour: f64,
    pub tariff_per_kwh: f64,
    pub currency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Nominal,
    Informational,
    Warning,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecommendationKind {
    LowPowerFactor,
    MonitorPowerFactor,
    PhaseImbalance,
    ApproachingDemandLimit,
    DominantLoad,
    Nominal,
}

/// Operator guidance produced by the rule engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub severity: Severity,
    pub message: String,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Named axes of the health radar, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum HealthDimension {
    #[serde(rename = "Load Health")]
    #[strum(serialize = "Load Health")]
    LoadHealth,
    #[serde(rename = "Power Factor")]
    #[strum(serialize = "Power Factor")]
    PowerFactor,
    #[serde(rename = "Phase Balance")]
    #[strum(serialize = "Phase Balance")]
    PhaseBalance,
    #[serde(rename = "Carbon Impact")]
    #[strum(serialize = "Carbon Impact")]
    CarbonImpact,
    #[serde(rename = "Circuit Balance")]
    #[strum(serialize = "Circuit Balance")]
    CircuitBalance,
}

/// One radar axis as it goes over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadarAxis {
    pub dimension: HealthDimension,
    pub score: f64,
}

/// Normalised 0-100 health indices.
///
/// Serialized as a list of [`RadarAxis`] in display order; axes missing on
/// input read as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<RadarAxis>", into = "Vec<RadarAxis>")]
pub struct HealthRadar {
    pub load_health: f64,
    pub power_factor: f64,
    pub phase_balance: f64,
    pub carbon_impact: f64,
    pub circuit_balance: f64,
}

impl HealthRadar {
    pub fn score(&self, dimension: HealthDimension) -> f64 {
        match dimension {
            HealthDimension::LoadHealth => self.load_health,
            HealthDimension::PowerFactor => self.power_factor,
            HealthDimension::PhaseBalance => self.phase_balance,
            HealthDimension::CarbonImpact => self.carbon_impact,
            HealthDimension::CircuitBalance => self.circuit_balance,
        }
    }

    fn score_mut(&mut self, dimension: HealthDimension) -> &mut f64 {
        match dimension {
            HealthDimension::LoadHealth => &mut self.load_health,
            HealthDimension::PowerFactor => &mut self.power_factor,
            HealthDimension::PhaseBalance => &mut self.phase_balance,
            HealthDimension::CarbonImpact => &mut self.carbon_impact,
            HealthDimension::CircuitBalance => &mut self.circuit_balance,
        }
    }

    /// `(dimension, score)` pairs in display order.
    pub fn axes(&self) -> Vec<(HealthDimension, f64)> {
        use strum::IntoEnumIterator;
        HealthDimension::iter().map(|d| (d, self.score(d))).collect()
    }
}

impl From<HealthRadar> for Vec<RadarAxis> {
    fn from(radar: HealthRadar) -> Self {
        radar
            .axes()
            .into_iter()
            .map(|(dimension, score)| RadarAxis { dimension, score })
            .collect()
    }
}

impl From<Vec<RadarAxis>> for HealthRadar {
    fn from(axes: Vec<RadarAxis>) -> Self {
        let mut radar = HealthRadar::default();
        for axis in axes {
            *radar.score_mut(axis.dimension) = axis.score;
        }
        radar
    }
}

/// Headline load band shown next to the live reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum LoadLevel {
    #[serde(rename = "Normal")]
    #[strum(serialize = "Normal")]
    Normal,
    #[serde(rename = "Moderate Load")]
    #[strum(serialize = "Moderate Load")]
    Moderate,
    #[serde(rename = "High Load")]
    #[strum(serialize = "High Load")]
    High,
}

/// Direction indicator derived from the instantaneous load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LoadTrend {
    Up,
    Stable,
    Down,
}

/// Progress towards the UN Sustainable Development Goals the site reports on,
/// each 0-100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdgAlignment {
    /// SDG 7: affordable and clean energy.
    pub affordable_energy: u8,
    /// SDG 12: responsible consumption and production.
    pub responsible_consumption: u8,
    /// SDG 13: climate action.
    pub climate_action: u8,
}

/// Everything one pipeline pass derives from a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub timestamp: DateTime<Utc>,
    pub total_load_kw: f64,
    /// Per-circuit breakdown, heaviest first.
    pub circuits: Vec<CircuitLoad>,
    pub dominant_circuit: Option<CircuitLoad>,
    pub power_factor: f64,
    pub phase_voltages: PhaseVoltages,
    pub phase_imbalance_pct: f64,
    pub carbon_kg: f64,
    pub efficiency_score: u8,
    pub esg_score: u8,
    pub social_impact_index: f64,
    /// Efficiency shortfall scaled into a waste figure.
    pub waste_proxy: u16,
    pub sdg_alignment: SdgAlignment,
    pub load_level: LoadLevel,
    pub load_trend: LoadTrend,
    pub intensity: EnergyIntensity,
    pub cost: CostRate,
    pub recommendations: Vec<Recommendation>,
    pub health_radar: HealthRadar,
}

impl DerivedMetrics {
    pub fn highest_severity(&self) -> Severity {
        self.recommendations
            .iter()
            .map(|r| r.severity)
            .max()
            .unwrap_or(Severity::Nominal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radar_axes_order_and_names() {
        let radar = HealthRadar {
            load_health: 10.0,
            power_factor: 20.0,
            phase_balance: 30.0,
            carbon_impact: 40.0,
            circuit_balance: 50.0,
        };
        let names: Vec<String> = radar.axes().iter().map(|(d, _)| d.to_string()).collect();
        assert_eq!(
            names,
            ["Load Health", "Power Factor", "Phase Balance", "Carbon Impact", "Circuit Balance"]
        );
        assert_eq!(radar.score(HealthDimension::CarbonImpact), 40.0);
    }

    #[test]
    fn test_radar_serializes_as_named_axes() {
        let radar = HealthRadar {
            load_health: 10.0,
            power_factor: 20.0,
            phase_balance: 30.0,
            carbon_impact: 40.0,
            circuit_balance: 50.0,
        };
        let json = serde_json::to_value(radar).unwrap();
        let axes = json.as_array().unwrap();
        assert_eq!(axes.len(), 5);
        assert_eq!(axes[0]["dimension"], "Load Health");
        assert_eq!(axes[0]["score"], 10.0);
        assert_eq!(axes[4]["dimension"], "Circuit Balance");

        let back: HealthRadar = serde_json::from_value(json).unwrap();
        assert_eq!(back, radar);
    }

    #[test]
    fn test_radar_missing_axes_read_as_zero() {
        let radar: HealthRadar = serde_json::from_str(
            r#"[{ "dimension": "Power Factor", "score": 97.0 }]"#,
        )
        .unwrap();
        assert_eq!(radar.power_factor, 97.0);
        assert_eq!(radar.load_health, 0.0);
    }

    #[test]
    fn test_load_labels() {
        assert_eq!(LoadLevel::Moderate.to_string(), "Moderate Load");
        assert_eq!(serde_json::to_value(LoadLevel::High).unwrap(), "High Load");
        assert_eq!(serde_json::to_value(LoadTrend::Up).unwrap(), "up");
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::High > Severity::Warning);
        assert!(Severity::Warning > Severity::Informational);
        assert!(Severity::Informational > Severity::Nominal);
        assert_eq!(Severity::High.to_string(), "high");
    }
}
