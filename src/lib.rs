pub mod api;
pub mod config;
pub mod domain;
pub mod insight;
pub mod meter;
pub mod scheduler;
pub mod telemetry;
