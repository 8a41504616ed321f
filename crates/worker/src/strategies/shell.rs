use super::{FetchStrategy, Services};
use crate::fallback;
use async_trait::async_trait;
use novelsa_client::Fetcher;
use novelsa_core::{Credentials, Request, Response};

/// Scripts, styles and fonts: served from the shell cache, refilled from
/// the network on a miss.
pub struct ShellStrategy {
    services: Services,
}

impl ShellStrategy {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

#[async_trait]
impl FetchStrategy for ShellStrategy {
    fn name(&self) -> &'static str {
        "shell"
    }

    async fn respond(&self, request: &Request) -> Response {
        let shell = &self.services.settings.names.shell;
        if let Some(response) = self.services.cached(shell, request).await {
            return response;
        }

        match self.services.fetcher.fetch(request, Credentials::Omit).await {
            Ok(response) if response.is_ok() => {
                self.services.remember(shell, request, &response).await;
                response
            }
            Ok(response) => {
                tracing::debug!(path = request.path(), status = response.status, "shell asset fetch not ok");
                fallback::shell_not_found()
            }
            Err(e) => {
                tracing::warn!(path = request.path(), error = %e, "shell asset unavailable offline");
                fallback::shell_not_found()
            }
        }
    }
}
