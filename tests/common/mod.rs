#![allow(dead_code)]
//! Fetch doubles shared by the integration tests.

use async_trait::async_trait;
use chrono::Utc;
use live_energy_insight::{
    domain::Snapshot,
    meter::{FetchError, SnapshotFetcher},
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::{
    collections::VecDeque,
    sync::atomic::{AtomicUsize, Ordering},
};
use tokio::sync::Notify;

pub fn snapshot(readings: Value) -> Snapshot {
    Snapshot::new(
        Utc::now(),
        serde_json::from_value(readings).expect("readings must be an object"),
    )
}

/// A healthy three-phase reading with `kitchen_w` on the kitchen circuit.
pub fn site_snapshot(kitchen_w: f64) -> Snapshot {
    snapshot(json!({
        "Kitchen": kitchen_w,
        "Server Room": 2500.0,
        "Main Incomer Power Factor": 0.97,
        "L1 Voltage": 230.0,
        "L2 Voltage": 231.0,
        "L3 Voltage": 229.5
    }))
}

/// Replays a fixed list of results, then reports the backend as gone.
pub struct ScriptedFetcher {
    pub calls: AtomicUsize,
    script: Mutex<VecDeque<Result<Snapshot, FetchError>>>,
}

impl ScriptedFetcher {
    pub fn new(script: Vec<Result<Snapshot, FetchError>>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            script: Mutex::new(script.into()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotFetcher for ScriptedFetcher {
    async fn fetch(&self) -> Result<Snapshot, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Transport("connection refused".into())))
    }
}

/// Always succeeds.
pub struct SteadyFetcher {
    pub calls: AtomicUsize,
    kitchen_w: f64,
}

impl SteadyFetcher {
    pub fn new(kitchen_w: f64) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            kitchen_w,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotFetcher for SteadyFetcher {
    async fn fetch(&self) -> Result<Snapshot, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(site_snapshot(self.kitchen_w))
    }
}

/// Blocks every fetch until the test releases it.
pub struct GatedFetcher {
    pub calls: AtomicUsize,
    pub entered: Notify,
    pub release: Notify,
}

impl GatedFetcher {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotFetcher for GatedFetcher {
    async fn fetch(&self) -> Result<Snapshot, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        Ok(site_snapshot(4000.0))
    }
}
