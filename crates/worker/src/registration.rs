//! Registration slots: which worker version is installing, waiting or
//! controlling the page.

use crate::sync::SyncReport;
use crate::worker::OfflineWorker;
use async_trait::async_trait;
use novelsa_core::{ControlMessage, Error, LifecycleEvent, MessagePort, Request, Response, WorkerState};
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};

const EVENT_CAPACITY: usize = 32;

#[derive(Default)]
struct Slots {
    installing: Option<Arc<OfflineWorker>>,
    waiting: Option<Arc<OfflineWorker>>,
    active: Option<Arc<OfflineWorker>>,
}

/// Owns the worker versions of one scope and broadcasts their transitions.
pub struct Registration {
    slots: Mutex<Slots>,
    events: broadcast::Sender<LifecycleEvent>,
}

impl Default for Registration {
    fn default() -> Self {
        Self::new()
    }
}

impl Registration {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { slots: Mutex::new(Slots::default()), events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    fn transition(&self, worker: &OfflineWorker, state: WorkerState) {
        worker.set_state(state);
        self.announce(worker);
    }

    /// Broadcast the state the worker is in now.
    fn announce(&self, worker: &OfflineWorker) {
        // No subscribers is fine.
        let _ = self.events.send(LifecycleEvent { version: worker.version().to_string(), state: worker.state() });
    }

    /// Install a new version. It activates right away when nothing is active
    /// or it asked to skip waiting; otherwise it waits behind the active one.
    ///
    /// Returns the state the worker ended in.
    pub async fn register(&self, worker: OfflineWorker) -> Result<WorkerState, Error> {
        let worker = Arc::new(worker);
        self.slots.lock().await.installing = Some(worker.clone());
        self.transition(&worker, WorkerState::Installing);

        let installed = worker.on_install().await;
        self.slots.lock().await.installing = None;
        if let Err(e) = installed {
            // on_install already marked the worker redundant.
            self.announce(&worker);
            return Err(e);
        }
        self.transition(&worker, WorkerState::Installed);

        let has_active = self.slots.lock().await.active.is_some();
        if !has_active || worker.skip_waiting_requested() {
            self.activate(worker.clone()).await?;
        } else {
            let replaced = self.slots.lock().await.waiting.replace(worker.clone());
            if let Some(replaced) = replaced {
                self.transition(&replaced, WorkerState::Redundant);
            }
            self.transition(&worker, WorkerState::Waiting);
        }
        Ok(worker.state())
    }

    async fn activate(&self, worker: Arc<OfflineWorker>) -> Result<(), Error> {
        self.transition(&worker, WorkerState::Activating);
        if let Err(e) = worker.on_activate().await {
            self.announce(&worker);
            return Err(e);
        }

        let previous = self.slots.lock().await.active.replace(worker.clone());
        if let Some(previous) = previous
            && !Arc::ptr_eq(&previous, &worker)
        {
            self.transition(&previous, WorkerState::Redundant);
        }
        self.transition(&worker, WorkerState::Activated);
        Ok(())
    }

    /// Promote the waiting worker, if any. Returns whether one was promoted.
    pub async fn activate_waiting(&self) -> Result<bool, Error> {
        let waiting = self.slots.lock().await.waiting.take();
        match waiting {
            Some(worker) => {
                worker.skip_waiting();
                self.activate(worker).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn active(&self) -> Option<Arc<OfflineWorker>> {
        self.slots.lock().await.active.clone()
    }

    pub async fn waiting(&self) -> Option<Arc<OfflineWorker>> {
        self.slots.lock().await.waiting.clone()
    }

    /// Route a request through the active worker. `None` when nothing
    /// controls the page or the request is not intercepted.
    pub async fn handle(&self, request: &Request) -> Option<Response> {
        let active = self.active().await?;
        active.handle(request).await
    }

    pub async fn sync_pending(&self) -> Result<SyncReport, Error> {
        let active = self.active().await.ok_or_else(|| Error::ChannelClosed("no active worker".into()))?;
        active.sync_pending().await
    }
}

#[async_trait]
impl MessagePort for Registration {
    async fn post_message(&self, message: ControlMessage) -> Result<(), Error> {
        tracing::debug!(?message, "control message");
        match message {
            ControlMessage::SkipWaiting => {
                if !self.activate_waiting().await? {
                    tracing::debug!("no waiting worker to activate");
                }
                Ok(())
            }
            ControlMessage::SyncPending => self.sync_pending().await.map(|_| ()),
        }
    }
}
