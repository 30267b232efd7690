//! # Meter access
//!
//! The meter backend's only contract with the pipeline is "return a snapshot
//! or fail". [`SnapshotFetcher`] is that seam; [`HttpSnapshotFetcher`] talks to
//! the backend's instantaneous-readings endpoint.
//!
//! Fetchers never retry. A failed fetch is reported once and the poll
//! scheduler tries again on its next tick.

pub mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Snapshot;

pub use http::HttpSnapshotFetcher;

/// Why a fetch produced no snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Backend unreachable: DNS, connect, timeout, reset.
    #[error("meter backend unreachable: {0}")]
    Transport(String),
    /// Backend answered with a non-success status.
    #[error("meter backend returned HTTP {status}")]
    Protocol { status: u16 },
    /// Backend answered 2xx but the body was not a usable snapshot.
    #[error("malformed meter payload: {0}")]
    Data(String),
}

impl FetchError {
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Transport(_))
    }
}

#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    async fn fetch(&self) -> Result<Snapshot, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_messages() {
        assert_eq!(
            FetchError::Protocol { status: 503 }.to_string(),
            "meter backend returned HTTP 503"
        );
        assert_eq!(
            FetchError::Data("missing field `raw_data`".into()).to_string(),
            "malformed meter payload: missing field `raw_data`"
        );
        assert!(FetchError::Transport("timed out".into()).is_transport());
        assert!(!FetchError::Protocol { status: 500 }.is_transport());
    }
}
