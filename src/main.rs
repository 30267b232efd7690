use anyhow::{Context, Result};
use live_energy_insight::{api, config, meter, scheduler, telemetry};
use config::Config;
use meter::HttpSnapshotFetcher;
use scheduler::PollScheduler;
use std::sync::Arc;
use telemetry::init_tracing;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = Config::load().context("loading configuration")?;

    let fetcher = Arc::new(
        HttpSnapshotFetcher::from_config(&cfg.meter).context("building meter client")?,
    );
    info!(url = fetcher.url(), "meter backend configured");

    let scheduler = Arc::new(PollScheduler::from_config(fetcher, &cfg.insight));
    scheduler.start();

    let app = api::router(api::AppState::new(scheduler.clone()), &cfg.server);

    let addr = cfg.server.socket_addr()?;
    if cfg.server.host == "0.0.0.0" {
        warn!("server binding to 0.0.0.0, insights will be reachable from the network");
    }
    info!(%addr, "starting Live Energy Insight");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    scheduler.shutdown().await;
    warn!("shutdown complete");
    Ok(())
}
