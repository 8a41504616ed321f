use super::{FetchStrategy, Services};
use crate::fallback;
use async_trait::async_trait;
use novelsa_client::Fetcher;
use novelsa_core::{Credentials, Request, Response};

/// Network only. Nothing is cached and any response status passes through.
pub struct ExternalStrategy {
    services: Services,
}

impl ExternalStrategy {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

#[async_trait]
impl FetchStrategy for ExternalStrategy {
    fn name(&self) -> &'static str {
        "external"
    }

    async fn respond(&self, request: &Request) -> Response {
        match self.services.fetcher.fetch(request, Credentials::SameOrigin).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "external request failed");
                fallback::external_offline()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::testing::Harness;
    use url::Url;

    #[tokio::test]
    async fn test_passes_any_status_through() {
        let h = Harness::new().await;
        let url = "https://fonts.example.com/css?family=Inter";
        h.fetcher.respond(url, Response::text(404, "nope"));
        let strategy = ExternalStrategy::new(h.services.clone());

        let response = strategy.respond(&Request::get(Url::parse(url).unwrap())).await;
        assert_eq!(response.status, 404);
        assert!(h.services.caches.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_network_failure_is_bare_503() {
        let h = Harness::new().await;
        let strategy = ExternalStrategy::new(h.services.clone());

        let response = strategy.respond(&Request::get(Url::parse("https://analytics.example.com/x").unwrap())).await;
        assert_eq!(response.status, 503);
        assert_eq!(&response.body[..], b"Offline");
    }
}
