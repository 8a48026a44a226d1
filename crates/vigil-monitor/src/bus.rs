// bus.rs - The connector seam between the monitor and the service manager.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BusError;

/// Which bus instance to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusKind {
    /// The system service manager.
    #[default]
    System,
    /// The calling user's service manager.
    User,
}

impl std::fmt::Display for BusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BusKind::System => write!(f, "system"),
            BusKind::User => write!(f, "user"),
        }
    }
}

/// One `PropertiesChanged` signal, reduced to what the monitor needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    /// Object path the signal was emitted on.
    pub path: String,
    /// Interface whose properties changed.
    pub interface: String,
    /// New `ActiveState`, when the change set carries one.
    pub active_state: Option<String>,
}

/// Source of unit enumeration and state-change notifications.
#[async_trait]
pub trait BusConnector: Send {
    /// Object paths of every unit currently loaded by the service manager.
    async fn list_unit_paths(&mut self) -> Result<Vec<String>, BusError>;

    /// Wait for the next property change. `Ok(None)` means the stream ended.
    async fn next_change(&mut self) -> Result<Option<StateChange>, BusError>;
}
