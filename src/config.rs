use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::{net::SocketAddr, time::Duration};
use thiserror::Error;
use validator::Validate;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Extract(#[from] Box<figment::Error>),
    #[error("invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
    #[error("invalid server address: {0}")]
    Address(#[from] std::net::AddrParseError),
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct Config {
    #[validate(nested)]
    pub server: ServerConfig,
    #[validate(nested)]
    pub meter: MeterConfig,
    #[validate(nested)]
    pub insight: InsightConfig,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            enable_cors: true,
            cors_origins: vec![
                "http://localhost:3000".into(),
                "http://127.0.0.1:3000".into(),
                "http://localhost:5173".into(),
                "http://127.0.0.1:5173".into(),
            ],
            request_timeout_secs: 10,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

/// Where the meter backend lives.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct MeterConfig {
    #[validate(url)]
    pub base_url: String,
    #[validate(range(min = 1, max = 120))]
    pub http_timeout_seconds: u64,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            http_timeout_seconds: 10,
        }
    }
}

/// Site constants consumed by the scorer, the rule engine and the scheduler.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct InsightConfig {
    /// Circuit registers summed to obtain site load, in tie-break order.
    pub circuits: Vec<String>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub emission_factor_kg_per_kwh: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub peak_demand_threshold_kw: f64,
    pub occupant_count: u32,
    #[validate(range(min = 0.0))]
    pub floor_area_m2: f64,
    #[validate(range(min = 1, max = 10_000))]
    pub history_capacity: usize,
    #[validate(range(min = 1000))]
    pub poll_interval_ms: u64,
    #[validate(range(min = 0.0))]
    pub tariff_per_kwh: f64,
    #[validate(length(min = 1, max = 8))]
    pub currency: String,
}

pub const DEFAULT_CIRCUITS: [&str; 8] = [
    "HVAC/Aircom",
    "Local Mains",
    "Kitchen",
    "Server Room",
    "Canteen",
    "Passage Plugs",
    "Caretaker Flat",
    "Battenlane (Outside DB)",
];

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            circuits: DEFAULT_CIRCUITS.iter().map(|c| c.to_string()).collect(),
            emission_factor_kg_per_kwh: 0.95,
            peak_demand_threshold_kw: 80.0,
            occupant_count: 45,
            floor_area_m2: 1200.0,
            history_capacity: 60,
            poll_interval_ms: 10_000,
            tariff_per_kwh: 1.99,
            currency: "ZAR".into(),
        }
    }
}

impl InsightConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file("config/default.toml"))
                .merge(Env::prefixed("LEI__").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let cfg: Config = figment.extract().map_err(Box::new)?;
        cfg.validate()?;
        Ok(cfg)
    }
}
