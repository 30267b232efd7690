pub mod error;
pub mod health;
pub mod response;
pub mod v1;

use axum::{
    extract::{DefaultBodyLimit, OriginalUri},
    http::HeaderValue,
    Router,
};
use std::{sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::warn;

use crate::{config::ServerConfig, scheduler::PollScheduler};

/// Shared handler state. Handlers only ever read published snapshots.
#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<PollScheduler>,
}

impl AppState {
    pub fn new(scheduler: Arc<PollScheduler>) -> Self {
        Self { scheduler }
    }
}

pub fn router(state: AppState, cfg: &ServerConfig) -> Router {
    let mut router = Router::new()
        .nest("/api/v1", v1::router(state.clone()))
        .merge(health::router(state))
        .fallback(not_found);

    if cfg.enable_cors {
        let origins: Vec<HeaderValue> = cfg
            .cors_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!(origin = %o, error = %e, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        let cors = CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
            .allow_headers([axum::http::header::CONTENT_TYPE]);
        router = router.layer(cors);
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(64 * 1024))
                .layer(TimeoutLayer::new(Duration::from_secs(cfg.request_timeout_secs))),
        )
        .layer(TraceLayer::new_for_http())
}

async fn not_found(OriginalUri(uri): OriginalUri) -> error::ApiError {
    error::ApiError::NotFound(uri.path().to_string())
}
