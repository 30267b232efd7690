use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Link state between the service and the meter backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Idle,
    Loading,
    Connected,
    /// Backend could not be reached at all.
    Disconnected { reason: String },
    /// Backend answered, but not with a usable snapshot.
    Error { reason: String },
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ConnectionStatus::Loading)
    }

    /// True for both `Disconnected` and its `Error` sub-state.
    pub fn is_disconnected(&self) -> bool {
        matches!(
            self,
            ConnectionStatus::Disconnected { .. } | ConnectionStatus::Error { .. }
        )
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            ConnectionStatus::Disconnected { reason } | ConnectionStatus::Error { reason } => {
                Some(reason)
            }
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Idle => "idle",
            ConnectionStatus::Loading => "loading",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected { .. } => "disconnected",
            ConnectionStatus::Error { .. } => "error",
        }
    }
}

/// Raised when a pass's load exceeds the contracted peak demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakDemandAlert {
    pub at: DateTime<Utc>,
    pub load_kw: f64,
    pub threshold_kw: f64,
}

impl PeakDemandAlert {
    pub fn message(&self) -> String {
        format!("Peak demand exceeded: {:.1} kW", self.load_kw)
    }
}
