use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{error::ApiError, response::ApiResponse, AppState};
use crate::{
    domain::{ConnectionStatus, DerivedMetrics, PhaseVoltages},
    scheduler::{RefreshOutcome, TickStats},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/insights", get(get_insights))
        .route("/history", get(get_history))
        .route("/status", get(get_status))
        .route("/refresh", post(refresh))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct InsightsView {
    pub status: ConnectionStatus,
    pub stale: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub metrics: DerivedMetrics,
}

/// GET /api/v1/insights - latest derived metrics, possibly stale
pub async fn get_insights(State(st): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let current = st.scheduler.current();
    let metrics = current
        .metrics
        .clone()
        .ok_or_else(|| ApiError::ServiceUnavailable("no meter data received yet".into()))?;
    Ok(ApiResponse::success(InsightsView {
        status: current.status.clone(),
        stale: current.is_stale(),
        last_updated: current.last_updated,
        metrics,
    }))
}

#[derive(Debug, Serialize)]
pub struct HistoryPoint {
    pub timestamp: DateTime<Utc>,
    pub total_load_kw: f64,
    pub power_factor: f64,
    pub voltages: PhaseVoltages,
    pub carbon_kg: f64,
}

#[derive(Debug, Serialize)]
pub struct HistoryView {
    pub capacity: usize,
    pub samples: Vec<HistoryPoint>,
}

/// GET /api/v1/history - rolling window, oldest first
pub async fn get_history(State(st): State<AppState>) -> impl IntoResponse {
    let current = st.scheduler.current();
    let factor = st.scheduler.pipeline().params().emission_factor_kg_per_kwh;
    let samples: Vec<HistoryPoint> = current
        .history
        .iter()
        .map(|s| HistoryPoint {
            timestamp: s.timestamp,
            total_load_kw: s.total_load_kw,
            power_factor: s.power_factor,
            voltages: s.voltages,
            carbon_kg: s.carbon_kg(factor),
        })
        .collect();
    let count = samples.len();
    ApiResponse::success(HistoryView {
        capacity: current.history_capacity,
        samples,
    })
    .with_count(count)
}

#[derive(Debug, Serialize)]
pub struct AlertView {
    pub at: DateTime<Utc>,
    pub load_kw: f64,
    pub threshold_kw: f64,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StatusView {
    pub status: ConnectionStatus,
    pub stale: bool,
    pub fetching: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub poll_interval_ms: u64,
    pub alerts: Vec<AlertView>,
    pub stats: TickStats,
}

/// GET /api/v1/status - connection state and poll bookkeeping
pub async fn get_status(State(st): State<AppState>) -> impl IntoResponse {
    let current = st.scheduler.current();
    ApiResponse::success(StatusView {
        status: current.status.clone(),
        stale: current.is_stale(),
        fetching: st.scheduler.is_fetching(),
        last_updated: current.last_updated,
        last_error: current.last_error.clone(),
        poll_interval_ms: st.scheduler.interval().as_millis() as u64,
        alerts: current
            .alerts
            .iter()
            .map(|a| AlertView {
                at: a.at,
                load_kw: a.load_kw,
                threshold_kw: a.threshold_kw,
                message: a.message(),
            })
            .collect(),
        stats: current.stats.clone(),
    })
}

#[derive(Debug, Serialize)]
pub struct RefreshView {
    pub outcome: &'static str,
}

/// POST /api/v1/refresh - poll now; a no-op while a fetch is in flight
pub async fn refresh(State(st): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let (code, outcome) = match st.scheduler.refresh_now() {
        RefreshOutcome::Accepted => (StatusCode::ACCEPTED, "accepted"),
        RefreshOutcome::AlreadyInFlight => (StatusCode::OK, "already_in_flight"),
        RefreshOutcome::NotStarted => {
            return Err(ApiError::ServiceUnavailable("poller not started".into()))
        }
        RefreshOutcome::Stopped => {
            return Err(ApiError::ServiceUnavailable("poller stopped".into()))
        }
    };
    Ok((code, Json(ApiResponse::success(RefreshView { outcome }))))
}
