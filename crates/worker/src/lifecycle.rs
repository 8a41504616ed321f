//! Install and activate steps of one interception layer version.

use crate::fallback;
use crate::settings::OFFLINE_PAGE_PATH;
use crate::strategies::Services;
use novelsa_client::Fetcher;
use novelsa_core::{Credentials, Error, Request};
use serde::Serialize;
use tokio::task::JoinSet;

/// Outcome of caching the shell during install.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    /// Asset paths now in the shell cache.
    pub cached: Vec<String>,
    /// Asset paths that could not be fetched; install went on without them.
    pub failed: Vec<String>,
}

/// Fetch every shell asset concurrently and store the ones that succeed,
/// then store the offline document.
///
/// # Errors
///
/// Only cache storage failures abort install. A failed asset is logged and
/// recorded in the report.
pub async fn install(services: &Services) -> Result<InstallReport, Error> {
    let settings = &services.settings;
    let shell = services.caches.open_cache(&settings.names.shell).await?;
    let mut report = InstallReport::default();

    let mut fetches = JoinSet::new();
    for path in &settings.shell_assets {
        let Some(url) = settings.url_for(path) else {
            tracing::warn!(path, "shell asset is not a valid path");
            report.failed.push(path.clone());
            continue;
        };
        let fetcher = services.fetcher.clone();
        let path = path.clone();
        fetches.spawn(async move {
            let request = Request::get(url);
            let result = fetcher.fetch(&request, Credentials::Omit).await;
            (path, request, result)
        });
    }

    while let Some(joined) = fetches.join_next().await {
        let (path, request, result) = match joined {
            Ok(done) => done,
            Err(e) => {
                tracing::warn!(error = %e, "shell asset task failed");
                continue;
            }
        };

        match result {
            Ok(response) if response.is_ok() => {
                shell.put(&request, &response).await?;
                report.cached.push(path);
            }
            Ok(response) => {
                tracing::warn!(path, status = response.status, "skipping shell asset");
                report.failed.push(path);
            }
            Err(e) => {
                tracing::warn!(path, error = %e, "skipping shell asset");
                report.failed.push(path);
            }
        }
    }

    // Tasks finish in any order.
    report.cached.sort();
    report.failed.sort();

    let offline_url = settings
        .url_for(OFFLINE_PAGE_PATH)
        .ok_or_else(|| Error::InvalidUrl(format!("cannot resolve {OFFLINE_PAGE_PATH}")))?;
    shell.put(&Request::get(offline_url), &fallback::offline_page()).await?;

    tracing::info!(
        version = %settings.version,
        cached = report.cached.len(),
        failed = report.failed.len(),
        "shell cached"
    );
    Ok(report)
}

/// Delete every cache outside this version's generation and make sure the
/// current ones exist. Returns the deleted cache names.
pub async fn activate(services: &Services) -> Result<Vec<String>, Error> {
    let names = &services.settings.names;
    let deleted = services.caches.delete_caches_not_in(&names.all()).await?;
    for name in &deleted {
        tracing::info!(cache = %name, "deleted stale cache");
    }

    for name in names.all() {
        services.caches.open_cache(&name).await?;
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::testing::Harness;
    use novelsa_core::{CacheNames, Response};

    #[tokio::test]
    async fn test_partial_install() {
        let h = Harness::new().await;
        h.fetcher.respond(&h.url("/"), Response::text(200, "root"));
        h.fetcher.respond(&h.url("/index.html"), Response::text(200, "index"));
        h.fetcher.respond(&h.url("/styles.css"), Response::text(500, "broken"));
        h.fetcher.respond(&h.url("/main.js"), Response::text(200, "main()"));

        let report = install(&h.services).await.unwrap();
        assert_eq!(report.cached, vec!["/", "/index.html", "/main.js"]);
        assert_eq!(report.failed, vec!["/offline.html", "/styles.css"]);

        let shell = &h.services.settings.names.shell;
        for path in ["/", "/index.html", "/main.js", OFFLINE_PAGE_PATH] {
            assert!(h.services.caches.match_in(shell, &h.get(path)).await.unwrap().is_some(), "{path}");
        }
        assert!(h.services.caches.match_in(shell, &h.get("/styles.css")).await.unwrap().is_none());
        assert_eq!(h.fetcher.credentials_for(&h.url("/main.js")), Some(Credentials::Omit));
    }

    #[tokio::test]
    async fn test_install_with_network_down_still_stores_offline_page() {
        let h = Harness::new().await;
        h.fetcher.set_offline(true);

        let report = install(&h.services).await.unwrap();
        assert!(report.cached.is_empty());
        assert_eq!(report.failed.len(), h.services.settings.shell_assets.len());

        let page = h.services.caches.match_in(&h.services.settings.names.shell, &h.get(OFFLINE_PAGE_PATH)).await;
        assert_eq!(page.unwrap().unwrap().status, 200);
    }

    #[tokio::test]
    async fn test_activate_removes_previous_generation() {
        let h = Harness::new().await;
        let v1 = CacheNames::for_version("v1");
        for name in v1.all() {
            h.services.caches.open_cache(&name).await.unwrap();
        }
        h.services.caches.open_cache("unrelated").await.unwrap();

        let mut deleted = activate(&h.services).await.unwrap();
        deleted.sort();
        assert_eq!(deleted, vec!["api-v1", "images-v1", "shell-v1", "unrelated"]);

        let mut keys = h.services.caches.keys().await.unwrap();
        keys.sort();
        let mut expected = h.services.settings.names.all();
        expected.sort();
        assert_eq!(keys, expected);
    }
}
