use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/health", get(health_check))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
    meter: MeterHealth,
}

#[derive(Debug, Serialize)]
pub struct MeterHealth {
    connection: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_updated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// GET /healthz - liveness only
pub async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}

/// GET /health - `healthy` while the meter is connected, `degraded` otherwise
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let current = state.scheduler.current();
    let healthy = current.status.is_connected();

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" },
        timestamp: Utc::now(),
        meter: MeterHealth {
            connection: current.status.label(),
            last_updated: current.last_updated,
            error: current.last_error.clone(),
        },
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    tracing::debug!(healthy, connection = current.status.label(), "health check");

    (status_code, Json(response))
}
