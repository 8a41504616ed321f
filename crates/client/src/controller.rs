//! Page-side connectivity and update tracking.
//!
//! The controller combines two inputs into one observable state:
//! online/offline transitions reported by the platform, and lifecycle
//! events broadcast by the interception layer. The UI watches the state;
//! the controller talks back to the interception layer only through a
//! [`MessagePort`].

use novelsa_core::{ControlMessage, LifecycleEvent, MessagePort, WorkerState};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{broadcast, watch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    Unready,
    Ready,
    UpdateAvailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControllerState {
    pub online: bool,
    pub worker: WorkerStatus,
}

/// What the page should do after [`ConnectivityController::apply_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateAction {
    Reload,
    None,
}

pub struct ConnectivityController {
    port: Arc<dyn MessagePort>,
    state: watch::Sender<ControllerState>,
    controlled: AtomicBool,
}

impl ConnectivityController {
    pub fn new(port: Arc<dyn MessagePort>, online: bool) -> Self {
        let (state, _) = watch::channel(ControllerState { online, worker: WorkerStatus::Unready });
        Self { port, state, controlled: AtomicBool::new(false) }
    }

    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ControllerState {
        *self.state.borrow()
    }

    /// Whether an activated worker controls the page.
    pub fn is_controlled(&self) -> bool {
        self.controlled.load(Ordering::SeqCst)
    }

    /// Record a connectivity change.
    ///
    /// Regaining connectivity asks the controlling worker to process the
    /// sync queue. Delivery failures are logged, never returned.
    pub async fn set_online(&self, online: bool) {
        let changed = self.state.send_if_modified(|s| {
            let changed = s.online != online;
            s.online = online;
            changed
        });
        if !changed {
            return;
        }

        if online {
            tracing::info!("connection restored");
            if self.is_controlled()
                && let Err(e) = self.port.post_message(ControlMessage::SyncPending).await
            {
                tracing::warn!(error = %e, "failed to request sync");
            }
        } else {
            tracing::info!("connection lost");
        }
    }

    /// Apply one lifecycle event of the interception layer.
    pub fn observe(&self, event: &LifecycleEvent) {
        match event.state {
            WorkerState::Installed | WorkerState::Waiting if self.is_controlled() => {
                tracing::info!(version = %event.version, "update available");
                self.state.send_modify(|s| s.worker = WorkerStatus::UpdateAvailable);
            }
            WorkerState::Activated => {
                self.controlled.store(true, Ordering::SeqCst);
                self.state.send_modify(|s| s.worker = WorkerStatus::Ready);
            }
            _ => {}
        }
    }

    /// Drive [`Self::observe`] from a lifecycle broadcast until it closes.
    pub async fn run(&self, mut events: broadcast::Receiver<LifecycleEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => self.observe(&event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "lifecycle events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// Tell the waiting version to take over.
    ///
    /// Returns [`UpdateAction::Reload`] when an update was pending and the
    /// message was delivered; the page then reloads to pick up the new version.
    pub async fn apply_update(&self) -> UpdateAction {
        if self.state().worker != WorkerStatus::UpdateAvailable {
            return UpdateAction::None;
        }

        match self.port.post_message(ControlMessage::SkipWaiting).await {
            Ok(()) => UpdateAction::Reload,
            Err(e) => {
                tracing::warn!(error = %e, "failed to apply update");
                UpdateAction::None
            }
        }
    }
}
