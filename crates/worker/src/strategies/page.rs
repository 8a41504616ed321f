//! Document navigations: network first, then a fallback scoped by route.

use super::{FetchStrategy, Services};
use crate::fallback;
use crate::settings::{APP_ENTRY_POINTS, OFFLINE_PAGE_PATH};
use async_trait::async_trait;
use novelsa_client::Fetcher;
use novelsa_core::{Credentials, Request, Response};

pub struct PageStrategy {
    services: Services,
}

impl PageStrategy {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    /// The exact page, else the application entry point.
    async fn offline_capable(&self, request: &Request) -> Option<Response> {
        let shell = &self.services.settings.names.shell;
        if let Some(response) = self.services.cached(shell, request).await {
            return Some(response);
        }

        for entry in APP_ENTRY_POINTS {
            let Some(url) = self.services.settings.url_for(entry) else {
                continue;
            };
            if let Some(response) = self.services.cached(shell, &Request::get(url)).await {
                tracing::debug!(path = request.path(), entry, "serving app entry point offline");
                return Some(response);
            }
        }
        None
    }

    /// The cached offline document as a 503, or a bare 503.
    async fn offline_document(&self) -> Response {
        let shell = &self.services.settings.names.shell;
        let cached = match self.services.settings.url_for(OFFLINE_PAGE_PATH) {
            Some(url) => self.services.cached(shell, &Request::get(url)).await,
            None => None,
        };

        match cached {
            Some(page) => page.with_status(503),
            None => fallback::page_unavailable(),
        }
    }
}

#[async_trait]
impl FetchStrategy for PageStrategy {
    fn name(&self) -> &'static str {
        "page"
    }

    async fn respond(&self, request: &Request) -> Response {
        match self.services.fetcher.fetch(request, Credentials::Include).await {
            Ok(response) if response.is_ok() => {
                self.services
                    .remember(&self.services.settings.names.shell, request, &response)
                    .await;
                return response;
            }
            Ok(response) => {
                tracing::debug!(path = request.path(), status = response.status, "page fetch not ok");
            }
            Err(e) => {
                tracing::debug!(path = request.path(), error = %e, "network failed for page");
            }
        }

        if self.services.settings.offline_routes.is_offline_capable(request.path()) {
            if let Some(response) = self.offline_capable(request).await {
                return response;
            }
            tracing::warn!(path = request.path(), "offline route has no cached shell");
        }

        self.offline_document().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::testing::Harness;

    fn navigate(h: &Harness, path: &str) -> Request {
        h.get(path).with_destination(novelsa_core::Destination::Document)
    }

    #[tokio::test]
    async fn test_network_success_is_cached() {
        let h = Harness::new().await;
        h.fetcher.respond(&h.url("/library"), Response::text(200, "<html>library</html>"));
        let strategy = PageStrategy::new(h.services.clone());

        let response = strategy.respond(&navigate(&h, "/library")).await;
        assert_eq!(response.status, 200);

        let shell = &h.services.settings.names.shell;
        let cached = h.services.caches.match_in(shell, &h.get("/library")).await.unwrap();
        assert!(cached.is_some());
        assert_eq!(h.fetcher.credentials_for(&h.url("/library")), Some(Credentials::Include));
    }

    #[tokio::test]
    async fn test_offline_route_serves_exact_page() {
        let h = Harness::new().await;
        let shell = h.services.settings.names.shell.clone();
        h.seed(&shell, "/offline-reader/n1", Response::text(200, "reader")).await;
        h.seed(&shell, "/index.html", Response::text(200, "app")).await;
        let strategy = PageStrategy::new(h.services.clone());

        let response = strategy.respond(&navigate(&h, "/offline-reader/n1")).await;
        assert_eq!(&response.body[..], b"reader");
    }

    #[tokio::test]
    async fn test_offline_route_falls_back_to_entry_point() {
        let h = Harness::new().await;
        let shell = h.services.settings.names.shell.clone();
        h.seed(&shell, "/index.html", Response::text(200, "app")).await;
        let strategy = PageStrategy::new(h.services.clone());

        let response = strategy.respond(&navigate(&h, "/offline-library")).await;
        assert_eq!(response.status, 200);
        assert_eq!(&response.body[..], b"app");
    }

    #[tokio::test]
    async fn test_non_offline_route_gets_offline_document() {
        let h = Harness::new().await;
        let shell = h.services.settings.names.shell.clone();
        h.seed(&shell, OFFLINE_PAGE_PATH, fallback::offline_page()).await;
        h.seed(&shell, "/index.html", Response::text(200, "app")).await;
        let strategy = PageStrategy::new(h.services.clone());

        let response = strategy.respond(&navigate(&h, "/novels/n1")).await;
        assert_eq!(response.status, 503);
        assert!(std::str::from_utf8(&response.body).unwrap().contains("/offline-library"));
    }

    #[tokio::test]
    async fn test_no_shell_cache_still_returns_503() {
        let h = Harness::new().await;
        let strategy = PageStrategy::new(h.services.clone());

        let response = strategy.respond(&navigate(&h, "/admin")).await;
        assert_eq!(response.status, 503);
        assert_eq!(&response.body[..], b"Offline - Offline page not cached");

        let response = strategy.respond(&navigate(&h, "/offline-favorites")).await;
        assert_eq!(response.status, 503);
    }

    #[tokio::test]
    async fn test_server_error_falls_back() {
        let h = Harness::new().await;
        h.fetcher.respond(&h.url("/offline"), Response::text(500, "boom"));
        let shell = h.services.settings.names.shell.clone();
        h.seed(&shell, "/", Response::text(200, "root")).await;
        let strategy = PageStrategy::new(h.services.clone());

        let response = strategy.respond(&navigate(&h, "/offline")).await;
        assert_eq!(&response.body[..], b"root");
    }
}
