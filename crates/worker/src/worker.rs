//! One version of the interception layer.
//!
//! [`OfflineWorker`] owns the strategies for its cache generation and exposes
//! the three hooks a host wires to its interception runtime: install,
//! activate and handle. It holds no global state; everything it touches is
//! injected through [`Services`].

use crate::lifecycle::{self, InstallReport};
use crate::router::{Route, classify};
use crate::strategies::{
    ApiStrategy, ExternalStrategy, FetchStrategy, ImageStrategy, PageStrategy, Services, ShellStrategy,
};
use crate::sync::{SyncProcessor, SyncReport};
use novelsa_client::{ApiClient, NovelDownloader};
use novelsa_core::{Error, Request, Response, WorkerState};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

pub struct OfflineWorker {
    state: watch::Sender<WorkerState>,
    skip_waiting: AtomicBool,
    page: PageStrategy,
    api: ApiStrategy,
    image: ImageStrategy,
    shell: ShellStrategy,
    external: ExternalStrategy,
    sync: SyncProcessor,
    services: Services,
}

impl OfflineWorker {
    /// Build a worker in the `parsed` state.
    ///
    /// # Errors
    ///
    /// Fails if the configured origin and API prefix do not form a valid URL.
    pub fn new(services: Services) -> Result<Self, Error> {
        let settings = &services.settings;
        let api = ApiClient::new(services.fetcher.clone(), &settings.origin, &settings.api_prefix)?;
        let downloader = NovelDownloader::new(api, services.store.clone());
        let (state, _) = watch::channel(WorkerState::Parsed);

        Ok(Self {
            state,
            skip_waiting: AtomicBool::new(false),
            page: PageStrategy::new(services.clone()),
            api: ApiStrategy::new(services.clone()),
            image: ImageStrategy::new(services.clone()),
            shell: ShellStrategy::new(services.clone()),
            external: ExternalStrategy::new(services.clone()),
            sync: SyncProcessor::new(services.store.clone(), downloader),
            services,
        })
    }

    pub fn version(&self) -> &str {
        &self.services.settings.version
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    /// Subscribers are only notified when the state actually changes.
    pub(crate) fn set_state(&self, state: WorkerState) {
        self.state.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            tracing::info!(version = %self.version(), from = %current, to = %state, "worker state changed");
            *current = state;
            true
        });
    }

    /// Ask to be activated without waiting for the current version to go away.
    pub fn skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    /// Cache the shell. A worker whose install fails becomes redundant.
    pub async fn on_install(&self) -> Result<InstallReport, Error> {
        self.set_state(WorkerState::Installing);
        match lifecycle::install(&self.services).await {
            Ok(report) => {
                if self.services.settings.skip_waiting {
                    self.skip_waiting();
                }
                self.set_state(WorkerState::Installed);
                Ok(report)
            }
            Err(e) => {
                tracing::error!(version = %self.version(), error = %e, "install failed");
                self.set_state(WorkerState::Redundant);
                Err(e)
            }
        }
    }

    /// Drop stale cache generations and start intercepting.
    pub async fn on_activate(&self) -> Result<Vec<String>, Error> {
        self.set_state(WorkerState::Activating);
        match lifecycle::activate(&self.services).await {
            Ok(deleted) => {
                self.set_state(WorkerState::Activated);
                Ok(deleted)
            }
            Err(e) => {
                tracing::error!(version = %self.version(), error = %e, "activate failed");
                self.set_state(WorkerState::Redundant);
                Err(e)
            }
        }
    }

    /// Answer an intercepted request. `None` means the request is not
    /// intercepted and goes to the network untouched.
    pub async fn handle(&self, request: &Request) -> Option<Response> {
        if !self.state().can_intercept_fetch() {
            return None;
        }

        let route = classify(&self.services.settings, request);
        let strategy: &dyn FetchStrategy = match route {
            Route::Passthrough => return None,
            Route::Page => &self.page,
            Route::Api => &self.api,
            Route::Image => &self.image,
            Route::Shell => &self.shell,
            Route::External => &self.external,
        };

        tracing::debug!(url = %request.url, strategy = strategy.name(), "intercepted request");
        Some(strategy.respond(request).await)
    }

    pub async fn sync_pending(&self) -> Result<SyncReport, Error> {
        self.sync.process().await
    }
}
