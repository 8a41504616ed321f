//! Images: cache first, then network, then the offline store, then a
//! placeholder. An image request never fails.

use super::{FetchStrategy, Services};
use crate::fallback;
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use novelsa_client::Fetcher;
use novelsa_core::{Credentials, Request, Response};

const DEFAULT_IMAGE_MIME: &str = "image/png";

pub struct ImageStrategy {
    services: Services,
}

impl ImageStrategy {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    async fn from_store(&self, request: &Request) -> Option<Response> {
        let data = match self.services.store.get_cached_image(request.url.as_str()).await {
            Ok(data) => data?,
            Err(e) => {
                tracing::error!(url = %request.url, error = %e, "offline image lookup failed");
                return None;
            }
        };

        match decode_image(&data) {
            Some((mime, bytes)) => {
                tracing::debug!(url = %request.url, mime, "serving image from offline store");
                Some(Response::new(200, bytes).with_header("Content-Type", mime))
            }
            None => {
                tracing::warn!(url = %request.url, "stored image payload is not valid base64");
                None
            }
        }
    }
}

/// Split a `data:<mime>;base64,<payload>` URL or a bare base64 string into
/// its MIME type and bytes.
fn decode_image(data: &str) -> Option<(String, Vec<u8>)> {
    let (mime, payload) = match data.strip_prefix("data:") {
        Some(rest) => {
            let (meta, payload) = rest.split_once(',')?;
            let mime = meta.strip_suffix(";base64")?;
            let mime = if mime.is_empty() { DEFAULT_IMAGE_MIME } else { mime };
            (mime.to_string(), payload)
        }
        None => (DEFAULT_IMAGE_MIME.to_string(), data),
    };

    let bytes = STANDARD.decode(payload.trim()).ok()?;
    Some((mime, bytes))
}

#[async_trait]
impl FetchStrategy for ImageStrategy {
    fn name(&self) -> &'static str {
        "image"
    }

    async fn respond(&self, request: &Request) -> Response {
        let images = &self.services.settings.names.images;
        if let Some(response) = self.services.cached(images, request).await {
            return response;
        }

        match self.services.fetcher.fetch(request, Credentials::Omit).await {
            Ok(response) if response.is_ok() => {
                self.services.remember(images, request, &response).await;
                return response;
            }
            Ok(response) => {
                tracing::debug!(url = %request.url, status = response.status, "image fetch not ok");
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "network failed for image");
            }
        }

        if let Some(response) = self.from_store(request).await {
            return response;
        }

        fallback::placeholder_image()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::testing::Harness;
    use novelsa_core::Destination;
    use url::Url;

    fn image(url: &str) -> Request {
        Request::get(Url::parse(url).unwrap()).with_destination(Destination::Image)
    }

    #[test]
    fn test_decode_image() {
        assert_eq!(decode_image("data:image/jpeg;base64,AQID"), Some(("image/jpeg".into(), vec![1, 2, 3])));
        assert_eq!(decode_image("AQID"), Some(("image/png".into(), vec![1, 2, 3])));
        assert_eq!(decode_image("data:;base64,AQID"), Some(("image/png".into(), vec![1, 2, 3])));
        assert_eq!(decode_image("data:image/svg+xml,<svg/>"), None);
        assert_eq!(decode_image("not base64!"), None);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let h = Harness::new().await;
        let images = h.services.settings.names.images.clone();
        h.seed(&images, "/covers/a.png", Response::new(200, vec![9u8, 9]).with_header("Content-Type", "image/png"))
            .await;
        let strategy = ImageStrategy::new(h.services.clone());

        let response = strategy.respond(&image(&h.url("/covers/a.png"))).await;
        assert_eq!(&response.body[..], &[9, 9]);
        assert_eq!(h.fetcher.call_count(&h.url("/covers/a.png")), 0);
    }

    #[tokio::test]
    async fn test_network_result_is_cached_without_credentials() {
        let h = Harness::new().await;
        let url = "https://cdn.example.com/covers/b.png";
        h.fetcher.respond(url, Response::new(200, vec![1u8, 2, 3]).with_header("Content-Type", "image/png"));
        let strategy = ImageStrategy::new(h.services.clone());

        let response = strategy.respond(&image(url)).await;
        assert_eq!(&response.body[..], &[1, 2, 3]);
        assert_eq!(h.fetcher.credentials_for(url), Some(Credentials::Omit));

        let images = &h.services.settings.names.images;
        assert_eq!(h.services.caches.entry_count(images).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_store_tier_serves_downloaded_cover() {
        let h = Harness::new().await;
        let url = "https://cdn.example.com/covers/c.jpg";
        h.services.store.cache_image(url, "n1", "data:image/jpeg;base64,AQID").await.unwrap();
        let strategy = ImageStrategy::new(h.services.clone());

        let response = strategy.respond(&image(url)).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.content_type(), Some("image/jpeg"));
        assert_eq!(&response.body[..], &[1, 2, 3]);
    }

    #[tokio::test]
    async fn test_double_miss_returns_placeholder() {
        let h = Harness::new().await;
        h.fetcher.respond(&h.url("/covers/gone.png"), Response::text(404, "missing"));
        let strategy = ImageStrategy::new(h.services.clone());

        for url in [h.url("/covers/gone.png"), h.url("/covers/offline.png")] {
            let response = strategy.respond(&image(&url)).await;
            assert_eq!(response.status, 200);
            assert_eq!(&response.body[..], &fallback::PLACEHOLDER_PNG[..]);
        }
    }
}
