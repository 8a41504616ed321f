//! Messages exchanged between the page context and the interception layer.
//!
//! The two contexts share no memory: the page posts [`ControlMessage`]s
//! through a [`MessagePort`] and listens for [`LifecycleEvent`]s.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Control messages accepted by the interception layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Activate the waiting version now.
    SkipWaiting,
    /// Process operations deferred while offline.
    SyncPending,
}

/// Interception layer lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    /// Installed, but another version still controls the page.
    Waiting,
    Activating,
    Activated,
    /// Replaced by a newer version.
    Redundant,
}

impl WorkerState {
    /// Only an activated worker intercepts requests.
    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, WorkerState::Activated)
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Waiting => "waiting",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(s)
    }
}

/// A state transition of one interception layer version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub version: String,
    pub state: WorkerState,
}

/// Page-to-worker message channel.
#[async_trait]
pub trait MessagePort: Send + Sync {
    /// Deliver a control message. Delivery is best-effort; no reply is defined.
    async fn post_message(&self, message: ControlMessage) -> Result<(), Error>;
}
