//! API requests: network raced against a timeout, then the API cache, then
//! the structured store.

use super::{FetchStrategy, Services};
use crate::fallback;
use crate::routes::NovelResource;
use async_trait::async_trait;
use novelsa_client::Fetcher;
use novelsa_core::{ApiEnvelope, Credentials, Error, Request, Response};
use serde::Serialize;

pub struct ApiStrategy {
    services: Services,
}

impl ApiStrategy {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    /// Run the fetch on its own task and stop waiting after the configured
    /// timeout. The request itself keeps running and is dropped on completion.
    async fn race_network(&self, request: &Request) -> Result<Response, Error> {
        let fetcher = self.services.fetcher.clone();
        let owned = request.clone();
        let handle = tokio::spawn(async move { fetcher.fetch(&owned, Credentials::SameOrigin).await });

        let timeout = self.services.settings.api_timeout;
        match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(Error::HttpError(format!("fetch task failed: {join}"))),
            Err(_) => Err(Error::FetchTimeout(format!("no response within {}ms", timeout.as_millis()))),
        }
    }

    /// Answer a novel resource from the structured store.
    async fn from_store(&self, request: &Request) -> Option<Response> {
        let resource = NovelResource::parse(&self.services.settings.api_prefix, request.path())?;
        let store = &self.services.store;

        let body = match &resource {
            NovelResource::Library => {
                let novels = log_miss(store.get_all_novels().await)?;
                if novels.is_empty() {
                    return None;
                }
                envelope(&novels)
            }
            NovelResource::Novel(id) => envelope(&log_miss(store.get_novel(id).await)??),
            NovelResource::Chapters(id) => {
                let chapters = log_miss(store.get_chapters_by_novel(id).await)?;
                if chapters.is_empty() {
                    return None;
                }
                envelope(&chapters)
            }
            NovelResource::Chapter { novel_id, chapter } => {
                let found = match log_miss(store.find_chapter_by_id(novel_id, chapter).await)? {
                    Some(found) => Some(found),
                    None => match chapter.parse::<u32>() {
                        Ok(number) => log_miss(store.get_chapter(novel_id, number).await)?,
                        Err(_) => None,
                    },
                };
                envelope(&found?)
            }
        };

        match body {
            Ok(value) => {
                tracing::debug!(path = request.path(), ?resource, "serving API request from offline store");
                Some(Response::json(200, &value))
            }
            Err(e) => {
                tracing::error!(path = request.path(), error = %e, "failed to encode stored data");
                None
            }
        }
    }
}

fn envelope<T: Serialize>(data: &T) -> Result<serde_json::Value, Error> {
    ApiEnvelope::from_cache(data).to_json()
}

/// Store errors degrade to a miss at this layer.
fn log_miss<T>(result: Result<T, Error>) -> Option<T> {
    result.map_err(|e| tracing::error!(error = %e, "offline store lookup failed")).ok()
}

#[async_trait]
impl FetchStrategy for ApiStrategy {
    fn name(&self) -> &'static str {
        "api"
    }

    async fn respond(&self, request: &Request) -> Response {
        let api_cache = &self.services.settings.names.api;

        match self.race_network(request).await {
            Ok(response) if response.is_ok() => {
                self.services.remember(api_cache, request, &response).await;
                return response;
            }
            Ok(response) => {
                tracing::debug!(path = request.path(), status = response.status, "API fetch not ok");
            }
            Err(e) => {
                tracing::warn!(path = request.path(), error = %e, "API network failed, trying offline data");
            }
        }

        if let Some(response) = self.services.cached(api_cache, request).await {
            return response;
        }

        if let Some(response) = self.from_store(request).await {
            return response;
        }

        tracing::debug!(path = request.path(), "no offline data for API request");
        fallback::api_offline()
    }
}
