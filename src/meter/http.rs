use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;
use std::{collections::BTreeMap, time::Duration};
use tracing::debug;

use super::{FetchError, SnapshotFetcher};
use crate::{config::MeterConfig, domain::Snapshot};

const INSTANT_PATH: &str = "/api/energy/instant";

/// Fetches instantaneous readings from the meter backend over HTTP.
#[derive(Clone)]
pub struct HttpSnapshotFetcher {
    url: String,
    client: reqwest::Client,
}

impl HttpSnapshotFetcher {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("live-energy-insight/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self {
            url: format!("{}{}", base_url.trim_end_matches('/'), INSTANT_PATH),
            client,
        })
    }

    pub fn from_config(cfg: &MeterConfig) -> Result<Self, FetchError> {
        Self::new(&cfg.base_url, Duration::from_secs(cfg.http_timeout_seconds))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SnapshotFetcher for HttpSnapshotFetcher {
    async fn fetch(&self) -> Result<Snapshot, FetchError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Protocol {
                status: status.as_u16(),
            });
        }

        let body = resp
            .bytes()
            .await
            .map_err(body_error)?;
        let raw: RawInstant =
            serde_json::from_slice(&body).map_err(|e| FetchError::Data(e.to_string()))?;

        debug!(registers = raw.raw_data.len(), url = %self.url, "meter snapshot received");

        Ok(Snapshot {
            timestamp: raw.timestamp,
            meter_name: raw.meter_name,
            readings: raw.raw_data,
        })
    }
}

/// A body that stops arriving is a link failure; one that arrives but cannot
/// be decoded is a data failure.
fn body_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() || e.is_request() || e.is_body() || e.is_connect() {
        FetchError::Transport(format!("body read interrupted: {e}"))
    } else {
        FetchError::Data(format!("body read failed: {e}"))
    }
}

/// Wire shape of the instantaneous endpoint; extra fields are ignored.
#[derive(Debug, Deserialize)]
struct RawInstant {
    #[serde(default)]
    meter_name: Option<String>,
    timestamp: DateTime<Utc>,
    raw_data: BTreeMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_base_without_double_slash() {
        let f = HttpSnapshotFetcher::new("http://meter:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(f.url(), "http://meter:8000/api/energy/instant");
    }

    #[test]
    fn test_wire_payload_accepts_offset_timestamps() {
        let body = r#"{
            "meter_name": "Bertha House",
            "timestamp": "2024-05-01T10:00:00.123456+00:00",
            "current_power": 12.3,
            "raw_data": { "Kitchen": 1500.0, "L1 Voltage": "231.2" }
        }"#;
        let raw: RawInstant = serde_json::from_str(body).unwrap();
        assert_eq!(raw.meter_name.as_deref(), Some("Bertha House"));
        assert_eq!(raw.raw_data.len(), 2);
    }
}
