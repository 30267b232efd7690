//! # Poll scheduler
//!
//! Drives the meter fetcher on a fixed interval and feeds successful
//! snapshots through the insight pipeline.
//!
//! ## States
//!
//! `Idle -> Loading -> {Connected, Disconnected, Error}`, then `Loading` again
//! after one interval (or earlier on a manual refresh).
//!
//! ## Guarantees
//!
//! - At most one fetch is in flight. A manual refresh while loading is a no-op
//!   and a concurrent [`PollScheduler::tick`] returns [`TickOutcome::Skipped`].
//! - Ticks are strictly sequential, so history is appended in poll order.
//! - All writes go through one mutex which also holds the stopped flag. Once
//!   [`PollScheduler::stop`] returns, a fetch that resolves later is dropped
//!   without touching state.
//! - Readers get immutable [`InsightState`] values from a `watch` channel.

pub mod state;

use chrono::Utc;
use parking_lot::Mutex;
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    sync::{watch, Notify},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::InsightConfig,
    domain::{ConnectionStatus, DerivedMetrics, PeakDemandAlert, Snapshot},
    insight::{HistoryBuffer, HistorySample, InsightPipeline},
    meter::{FetchError, SnapshotFetcher},
};

pub use state::{InsightState, TickStats};

/// Peak demand alerts retained for display.
pub const MAX_PEAK_ALERTS: usize = 5;

/// Result of one [`PollScheduler::tick`].
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Snapshot derived and published.
    Updated,
    /// Fetch failed; previous metrics kept.
    Failed(FetchError),
    /// Another fetch was already in flight.
    Skipped,
    /// Scheduler stopped before the result could be applied.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Accepted,
    AlreadyInFlight,
    NotStarted,
    Stopped,
}

/// Mutable pipeline state. Only touched under [`PollScheduler::writer`].
struct Writer {
    stopped: bool,
    status: ConnectionStatus,
    metrics: Option<DerivedMetrics>,
    history: HistoryBuffer,
    alerts: VecDeque<PeakDemandAlert>,
    last_updated: Option<chrono::DateTime<Utc>>,
    last_error: Option<String>,
    stats: TickStats,
}

impl Writer {
    fn new(history_capacity: usize) -> Self {
        Self {
            stopped: false,
            status: ConnectionStatus::Idle,
            metrics: None,
            history: HistoryBuffer::new(history_capacity),
            alerts: VecDeque::with_capacity(MAX_PEAK_ALERTS),
            last_updated: None,
            last_error: None,
            stats: TickStats::default(),
        }
    }

    fn to_state(&self) -> InsightState {
        InsightState {
            status: self.status.clone(),
            metrics: self.metrics.clone(),
            history: self.history.snapshot(),
            history_capacity: self.history.capacity(),
            alerts: self.alerts.iter().cloned().collect(),
            last_updated: self.last_updated,
            last_error: self.last_error.clone(),
            stats: self.stats.clone(),
        }
    }
}

/// Clears the in-flight flag when a tick finishes or its future is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct PollScheduler {
    fetcher: Arc<dyn SnapshotFetcher>,
    pipeline: InsightPipeline,
    interval: Duration,
    writer: Mutex<Writer>,
    in_flight: AtomicBool,
    started: AtomicBool,
    refresh_pending: AtomicBool,
    refresh: Notify,
    cancel: CancellationToken,
    published: watch::Sender<Arc<InsightState>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PollScheduler {
    pub fn new(
        fetcher: Arc<dyn SnapshotFetcher>,
        pipeline: InsightPipeline,
        interval: Duration,
        history_capacity: usize,
    ) -> Self {
        let writer = Writer::new(history_capacity);
        let (published, _) = watch::channel(Arc::new(writer.to_state()));
        Self {
            fetcher,
            pipeline,
            interval,
            writer: Mutex::new(writer),
            in_flight: AtomicBool::new(false),
            started: AtomicBool::new(false),
            refresh_pending: AtomicBool::new(false),
            refresh: Notify::new(),
            cancel: CancellationToken::new(),
            published,
            task: Mutex::new(None),
        }
    }

    pub fn from_config(fetcher: Arc<dyn SnapshotFetcher>, cfg: &InsightConfig) -> Self {
        Self::new(
            fetcher,
            InsightPipeline::from_config(cfg),
            cfg.poll_interval(),
            cfg.history_capacity,
        )
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn pipeline(&self) -> &InsightPipeline {
        &self.pipeline
    }

    /// Latest published state.
    pub fn current(&self) -> Arc<InsightState> {
        self.published.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<InsightState>> {
        self.published.subscribe()
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Spawn the poll loop. The first tick runs immediately.
    ///
    /// Returns `false` if the loop was already started or the scheduler has
    /// been stopped; a stopped scheduler cannot be restarted.
    pub fn start(self: &Arc<Self>) -> bool {
        if self.is_stopped() || self.started.swap(true, Ordering::AcqRel) {
            return false;
        }
        let scheduler = Arc::clone(self);
        let handle = tokio::spawn(async move { scheduler.run().await });
        *self.task.lock() = Some(handle);
        info!(interval_ms = self.interval.as_millis() as u64, "poll scheduler started");
        true
    }

    /// Stop polling. No state changes are published after this returns.
    pub fn stop(&self) {
        {
            let mut w = self.writer.lock();
            if w.stopped {
                return;
            }
            w.stopped = true;
        }
        self.cancel.cancel();
        info!("poll scheduler stopped");
    }

    /// [`stop`](Self::stop) and wait for the loop task to exit.
    pub async fn shutdown(&self) {
        self.stop();
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "poll loop task ended abnormally");
            }
        }
    }

    /// Ask the loop to poll now instead of waiting out the interval.
    ///
    /// Requests made while a fetch is in flight are dropped; requests made
    /// while one is already pending are coalesced into it.
    pub fn refresh_now(&self) -> RefreshOutcome {
        if self.is_stopped() {
            return RefreshOutcome::Stopped;
        }
        if !self.started.load(Ordering::Acquire) {
            return RefreshOutcome::NotStarted;
        }
        if self.is_fetching() {
            debug!("refresh ignored, fetch already in flight");
            return RefreshOutcome::AlreadyInFlight;
        }
        if !self.refresh_pending.swap(true, Ordering::AcqRel) {
            self.refresh.notify_one();
        }
        RefreshOutcome::Accepted
    }

    /// Run exactly one fetch and apply its result.
    pub async fn tick(&self) -> TickOutcome {
        let Some(_in_flight) = InFlight::acquire(&self.in_flight) else {
            return TickOutcome::Skipped;
        };
        // any pending manual refresh is served by this fetch
        self.refresh_pending.store(false, Ordering::Release);

        if !self.mark_loading() {
            return TickOutcome::Discarded;
        }
        let result = self.fetcher.fetch().await;
        self.apply(result)
    }

    async fn run(self: Arc<Self>) {
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = self.tick() => {}
            }
            if !self.wait_for_next_tick().await {
                break;
            }
        }
        debug!("poll loop exited");
    }

    /// Sleep one interval or until a manual refresh. `false` when cancelled.
    async fn wait_for_next_tick(&self) -> bool {
        let sleep = tokio::time::sleep(self.interval);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return false,
                _ = &mut sleep => return true,
                _ = self.refresh.notified() => {
                    // a permit left over from a request already served by the last tick
                    if self.refresh_pending.swap(false, Ordering::AcqRel) {
                        debug!("manual refresh requested");
                        return true;
                    }
                }
            }
        }
    }

    fn mark_loading(&self) -> bool {
        let mut w = self.writer.lock();
        if w.stopped {
            return false;
        }
        w.status = ConnectionStatus::Loading;
        w.stats.run_count += 1;
        w.stats.last_run = Some(Utc::now());
        self.publish(&w);
        true
    }

    fn apply(&self, result: Result<Snapshot, FetchError>) -> TickOutcome {
        let mut w = self.writer.lock();
        if w.stopped {
            debug!("discarding fetch result that arrived after stop");
            return TickOutcome::Discarded;
        }

        let outcome = match result {
            Ok(snapshot) => {
                let metrics = self.pipeline.derive(&snapshot);
                let now = Utc::now();
                let threshold_kw = self.pipeline.params().peak_demand_threshold_kw;

                w.history.append(HistorySample::from(&metrics));
                if metrics.total_load_kw > threshold_kw {
                    if w.alerts.len() >= MAX_PEAK_ALERTS {
                        w.alerts.pop_front();
                    }
                    w.alerts.push_back(PeakDemandAlert {
                        at: now,
                        load_kw: metrics.total_load_kw,
                        threshold_kw,
                    });
                    warn!(load_kw = metrics.total_load_kw, threshold_kw, "peak demand exceeded");
                }

                info!(
                    total_load_kw = metrics.total_load_kw,
                    power_factor = metrics.power_factor,
                    imbalance_pct = metrics.phase_imbalance_pct,
                    esg_score = metrics.esg_score,
                    recommendations = metrics.recommendations.len(),
                    "poll tick"
                );

                w.metrics = Some(metrics);
                w.status = ConnectionStatus::Connected;
                w.last_error = None;
                w.last_updated = Some(now);
                w.stats.success_count += 1;
                w.stats.last_success = Some(now);
                TickOutcome::Updated
            }
            Err(e) => {
                let reason = e.to_string();
                w.status = if e.is_transport() {
                    ConnectionStatus::Disconnected {
                        reason: reason.clone(),
                    }
                } else {
                    ConnectionStatus::Error {
                        reason: reason.clone(),
                    }
                };
                w.last_error = Some(reason);
                w.stats.error_count += 1;
                warn!(
                    error = %e,
                    status = w.status.label(),
                    stale = w.metrics.is_some(),
                    "meter fetch failed"
                );
                TickOutcome::Failed(e)
            }
        };

        self.publish(&w);
        outcome
    }

    fn publish(&self, w: &Writer) {
        self.published.send_replace(Arc::new(w.to_state()));
    }
}
