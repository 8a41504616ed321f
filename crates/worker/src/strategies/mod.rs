//! Fetch strategies, one per request class.
//!
//! A strategy never fails: every path ends in a [`Response`], falling back
//! through network, named caches, the structured store and finally a static
//! response. Storage errors on the way are logged and treated as misses.

pub mod api;
pub mod external;
pub mod image;
pub mod page;
pub mod shell;

pub use api::ApiStrategy;
pub use external::ExternalStrategy;
pub use image::ImageStrategy;
pub use page::PageStrategy;
pub use shell::ShellStrategy;

use crate::settings::WorkerSettings;
use async_trait::async_trait;
use novelsa_client::Fetcher;
use novelsa_core::{CacheStorage, OfflineStore, Request, Response};
use std::sync::Arc;

#[async_trait]
pub trait FetchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn respond(&self, request: &Request) -> Response;
}

/// Everything a strategy may consult, injected at construction.
#[derive(Clone)]
pub struct Services {
    pub settings: Arc<WorkerSettings>,
    pub caches: CacheStorage,
    pub store: OfflineStore,
    pub fetcher: Arc<dyn Fetcher>,
}

impl Services {
    pub fn new(settings: WorkerSettings, caches: CacheStorage, store: OfflineStore, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { settings: Arc::new(settings), caches, store, fetcher }
    }

    /// Look up `request` in one cache. Errors count as a miss.
    pub(crate) async fn cached(&self, cache: &str, request: &Request) -> Option<Response> {
        match self.caches.match_in(cache, request).await {
            Ok(Some(response)) => {
                tracing::debug!(cache, url = %request.url, "cache hit");
                Some(response)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::error!(cache, url = %request.url, error = %e, "cache lookup failed");
                None
            }
        }
    }

    /// Store a response. Failure is logged; the caller still returns it.
    pub(crate) async fn remember(&self, cache: &str, request: &Request, response: &Response) {
        if let Err(e) = self.caches.put(cache, request, response).await {
            tracing::warn!(cache, url = %request.url, error = %e, "failed to cache response");
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use novelsa_client::testing::ScriptedFetcher;
    use novelsa_core::AppConfig;
    use std::time::Duration;
    use url::Url;

    pub const ORIGIN: &str = "http://localhost:3000";

    pub struct Harness {
        pub fetcher: Arc<ScriptedFetcher>,
        pub services: Services,
    }

    impl Harness {
        pub async fn new() -> Self {
            Self::with_api_timeout(Duration::from_secs(5)).await
        }

        pub async fn with_api_timeout(timeout: Duration) -> Self {
            let settings = WorkerSettings::from_config(&AppConfig::default())
                .unwrap()
                .with_api_timeout(timeout);
            let fetcher = Arc::new(ScriptedFetcher::new());
            let services = Services::new(
                settings,
                CacheStorage::open_in_memory().await.unwrap(),
                OfflineStore::open_in_memory().await.unwrap(),
                fetcher.clone(),
            );
            Self { fetcher, services }
        }

        pub fn url(&self, path: &str) -> String {
            format!("{ORIGIN}{path}")
        }

        pub fn get(&self, path: &str) -> Request {
            Request::get(Url::parse(&self.url(path)).unwrap())
        }

        pub async fn seed(&self, cache: &str, path: &str, response: Response) {
            self.services.caches.open_cache(cache).await.unwrap();
            self.services.caches.put(cache, &self.get(path), &response).await.unwrap();
        }
    }
}
