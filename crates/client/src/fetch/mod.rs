//! Network access for the page and the interception layer.
//!
//! Everything that talks to the network goes through the [`Fetcher`] trait so
//! strategies and the downloader can run against a scripted fake in tests.
//!
//! ### Semantics
//! - A response with any status is `Ok`; only transport failures are `Err`
//! - Timeouts surface as `FETCH_TIMEOUT`, other transport failures as `HTTP_ERROR`
//! - `Credentials::Omit` strips `Cookie` and `Authorization` before sending
//! - Max redirects: 5
//! - Max body bytes: 10MB (configurable)

pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub use self::url::{UrlError, is_same_origin, resolve};

use novelsa_core::{AppConfig, Credentials, Error, Request, Response};

/// Something that can perform a network request.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request, credentials: Credentials) -> Result<Response, Error>;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    async fn fetch(&self, request: &Request, credentials: Credentials) -> Result<Response, Error> {
        (**self).fetch(request, credentials).await
    }
}

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "novelsa-offline/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 10MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "novelsa-offline/0.1".to_string(),
            max_bytes: 10 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), timeout: config.fetch_timeout(), ..Self::default() }
    }
}

const STRIPPED_WITHOUT_CREDENTIALS: [&str; 2] = ["cookie", "authorization"];

/// `reqwest`-backed [`Fetcher`].
pub struct HttpFetcher {
    http: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request, credentials: Credentials) -> Result<Response, Error> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| Error::InvalidInput(format!("unsupported method: {}", request.method)))?;

        let mut builder = self.http.request(method, request.url.clone());
        for (name, value) in &request.headers {
            if credentials == Credentials::Omit && STRIPPED_WITHOUT_CREDENTIALS.contains(&name.to_ascii_lowercase().as_str())
            {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::FetchTimeout(format!("{} after {:?}", request.url, self.config.timeout))
            } else {
                Error::HttpError(format!("network error: {}", e))
            }
        })?;

        let status = response.status();
        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::HttpError(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        let bytes: Bytes = response
            .bytes()
            .await
            .map_err(|e| Error::HttpError(format!("failed to read response: {}", e)))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::HttpError(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        tracing::debug!(
            "fetched {} {} -> {} in {}ms ({} bytes)",
            request.method,
            request.url,
            status.as_u16(),
            start.elapsed().as_millis(),
            bytes.len()
        );

        let mut out = Response::new(status.as_u16(), bytes);
        if let Some(reason) = status.canonical_reason() {
            out.status_text = reason.to_string();
        }
        out.headers = headers;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "novelsa-offline/0.1");
        assert_eq!(config.max_bytes, 10 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { user_agent: "reader/2".into(), fetch_timeout_ms: 1500, ..AppConfig::default() };
        let config = FetchConfig::from(&app);
        assert_eq!(config.user_agent, "reader/2");
        assert_eq!(config.timeout, Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_http_fetcher_new() {
        assert!(HttpFetcher::new(FetchConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_connection_refused_is_error() {
        let fetcher = HttpFetcher::new(FetchConfig { timeout: Duration::from_secs(2), ..FetchConfig::default() }).unwrap();
        let request = Request::get(::url::Url::parse("http://127.0.0.1:1/").unwrap());
        let result = fetcher.fetch(&request, Credentials::Omit).await;
        assert!(matches!(result, Err(Error::HttpError(_)) | Err(Error::FetchTimeout(_))));
    }
}
