//! Shared state behind the MCP tools.

use novelsa_client::{ApiClient, ConnectivityController, Fetcher, NovelDownloader};
use novelsa_core::{AppConfig, CacheStorage, Error, OfflineStore};
use novelsa_worker::{OfflineWorker, Registration, Services, WorkerSettings};
use std::sync::Arc;

/// The opened stores, the registration with its active worker and the
/// page-side controller watching it.
pub struct OfflineContext {
    pub config: AppConfig,
    pub store: OfflineStore,
    pub fetcher: Arc<dyn Fetcher>,
    pub registration: Arc<Registration>,
    pub controller: Arc<ConnectivityController>,
    pub downloader: NovelDownloader,
}

impl OfflineContext {
    /// Register a worker for the configured version over the given stores
    /// and start the controller's lifecycle listener.
    pub async fn start(
        config: AppConfig, caches: CacheStorage, store: OfflineStore, fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, Error> {
        let settings = WorkerSettings::from_config(&config).map_err(|e| Error::InvalidInput(e.to_string()))?;

        let registration = Arc::new(Registration::new());
        let controller = Arc::new(ConnectivityController::new(registration.clone(), true));
        let events = registration.subscribe();
        let listener = controller.clone();
        tokio::spawn(async move { listener.run(events).await });

        let api = ApiClient::new(fetcher.clone(), &settings.origin, &settings.api_prefix)?;
        let downloader = NovelDownloader::new(api, store.clone());

        let services = Services::new(settings, caches, store.clone(), fetcher.clone());
        let state = registration.register(OfflineWorker::new(services)?).await?;
        tracing::info!(version = %config.version, %state, "worker registered");

        Ok(Self { config, store, fetcher, registration, controller, downloader })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use novelsa_client::testing::ScriptedFetcher;

    pub async fn context() -> (OfflineContext, Arc<ScriptedFetcher>) {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let context = OfflineContext::start(
            AppConfig::default(),
            CacheStorage::open_in_memory().await.unwrap(),
            OfflineStore::open_in_memory().await.unwrap(),
            fetcher.clone(),
        )
        .await
        .unwrap();
        (context, fetcher)
    }
}
