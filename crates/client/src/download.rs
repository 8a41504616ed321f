//! Saving a novel for offline reading.

use crate::api::ApiClient;
use crate::fetch::resolve;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use novelsa_core::{Credentials, Error, OfflineStore, Request, StoredChapter};
use serde::{Deserialize, Serialize};

/// Outcome of one download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadReport {
    pub novel_id: String,
    pub chapters_saved: usize,
    pub chapters_failed: usize,
    pub cover_cached: bool,
}

/// Copies a novel, its chapters and its cover from the API into the store.
#[derive(Clone)]
pub struct NovelDownloader {
    api: ApiClient,
    store: OfflineStore,
}

impl NovelDownloader {
    pub fn new(api: ApiClient, store: OfflineStore) -> Self {
        Self { api, store }
    }

    /// Download a novel.
    ///
    /// Fails only if the novel itself cannot be fetched or stored. A chapter
    /// that cannot be fetched is skipped, and an unreachable cover is left
    /// uncached. Local reading progress survives a re-download.
    pub async fn download(&self, novel_id: &str) -> Result<DownloadReport, Error> {
        if novel_id.is_empty() {
            return Err(Error::InvalidInput("novel id must not be empty".to_string()));
        }

        let novel = self.api.get_novel(novel_id).await?;
        self.store.refresh_novel(&novel.to_stored()).await?;
        tracing::info!(novel = %novel.id, chapters = novel.chapters.len(), "saving novel for offline reading");

        let mut chapters: Vec<StoredChapter> = Vec::with_capacity(novel.chapters.len());
        let mut chapters_failed = 0;
        for chapter in &novel.chapters {
            if let Some(content) = chapter.embedded_content() {
                chapters.push(chapter.to_stored(&novel.id, content));
                continue;
            }

            match self.api.get_chapter(&novel.id, &chapter.id).await {
                Ok(full) => {
                    let content = full.content.unwrap_or_default();
                    chapters.push(chapter.to_stored(&novel.id, content));
                }
                Err(e) => {
                    tracing::warn!(novel = %novel.id, chapter = chapter.order, error = %e, "skipping chapter");
                    chapters_failed += 1;
                }
            }
        }

        if !chapters.is_empty() {
            self.store.save_chapters(&chapters).await?;
        }

        let cover_cached = match &novel.cover_url {
            Some(cover) if !cover.is_empty() => self.cache_cover(&novel.id, cover).await,
            _ => false,
        };

        Ok(DownloadReport { novel_id: novel.id, chapters_saved: chapters.len(), chapters_failed, cover_cached })
    }

    /// Refresh the stored summary of a novel, keeping local progress.
    pub async fn refresh(&self, novel_id: &str) -> Result<(), Error> {
        let novel = self.api.get_novel(novel_id).await?;
        self.store.refresh_novel(&novel.to_stored()).await
    }

    /// Delete the offline copy of a novel.
    pub async fn remove(&self, novel_id: &str) -> Result<bool, Error> {
        self.store.delete_novel(novel_id).await
    }

    async fn cache_cover(&self, novel_id: &str, cover: &str) -> bool {
        let url = match resolve(&self.api.origin(), cover) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(cover, error = %e, "invalid cover URL");
                return false;
            }
        };

        let request = Request::get(url.clone());
        let response = match self.api.fetcher().fetch(&request, Credentials::Omit).await {
            Ok(response) if response.is_ok() => response,
            Ok(response) => {
                tracing::warn!(url = %url, status = response.status, "cover not cached");
                return false;
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "cover not cached");
                return false;
            }
        };

        let mime = response.content_type().unwrap_or("image/png").to_string();
        let data = format!("data:{};base64,{}", mime, STANDARD.encode(&response.body));
        match self.store.cache_image(url.as_str(), novel_id, &data).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "failed to store cover");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Scripted, ScriptedFetcher};
    use novelsa_core::Response;
    use serde_json::json;
    use std::sync::Arc;
    use url::Url;

    const NOVEL: &str = "http://localhost:3000/api/novels/n1";

    async fn setup() -> (Arc<ScriptedFetcher>, OfflineStore, NovelDownloader) {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let store = OfflineStore::open_in_memory().await.unwrap();
        let origin = Url::parse("http://localhost:3000").unwrap();
        let api = ApiClient::new(fetcher.clone(), &origin, "/api").unwrap();
        (fetcher, store.clone(), NovelDownloader::new(api, store))
    }

    fn novel_body() -> serde_json::Value {
        json!({
            "success": true,
            "data": {
                "id": "n1",
                "authorName": "Alice",
                "title": "The Long Road",
                "coverUrl": "https://img.example.com/n1.png",
                "status": "APPROVED",
                "tags": ["Fantasy"],
                "chapters": [
                    { "id": "c1", "title": "One", "content": "first", "order": 1, "readCount": 1 },
                    { "id": "c2", "title": "Two", "order": 2, "readCount": 1 },
                    { "id": "c3", "title": "Three", "order": 3, "readCount": 1 }
                ]
            }
        })
    }

    #[tokio::test]
    async fn test_download_saves_novel_chapters_and_cover() {
        let (fetcher, store, downloader) = setup().await;
        fetcher.respond_json(NOVEL, 200, novel_body());
        fetcher.respond_json(
            "http://localhost:3000/api/novels/n1/chapters/c2",
            200,
            json!({ "success": true, "data": { "id": "c2", "title": "Two", "content": "second", "order": 2 } }),
        );
        fetcher.respond(
            "https://img.example.com/n1.png",
            Response::new(200, vec![1u8, 2, 3]).with_header("Content-Type", "image/png"),
        );

        let report = downloader.download("n1").await.unwrap();
        assert_eq!(report.chapters_saved, 2);
        assert_eq!(report.chapters_failed, 1);
        assert!(report.cover_cached);

        let novel = store.get_novel("n1").await.unwrap().unwrap();
        assert_eq!(novel.author, "Alice");
        assert_eq!(novel.total_chapters, 3);

        let chapters = store.get_chapters_by_novel("n1").await.unwrap();
        assert_eq!(chapters.iter().map(|c| c.content.as_str()).collect::<Vec<_>>(), vec!["first", "second"]);

        let cover = store.get_cached_image("https://img.example.com/n1.png").await.unwrap().unwrap();
        assert_eq!(cover, "data:image/png;base64,AQID");
        assert_eq!(fetcher.credentials_for("https://img.example.com/n1.png"), Some(Credentials::Omit));
    }

    #[tokio::test]
    async fn test_download_missing_novel_fails() {
        let (fetcher, store, downloader) = setup().await;
        fetcher.respond_json(NOVEL, 404, json!({ "success": false, "message": "Novel not found" }));

        assert!(downloader.download("n1").await.is_err());
        assert!(store.get_novel("n1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_download_keeps_progress() {
        let (fetcher, store, downloader) = setup().await;
        fetcher.respond_json(NOVEL, 200, novel_body());
        fetcher.on("https://img.example.com/n1.png", Scripted::Fail("offline".into()));

        downloader.download("n1").await.unwrap();
        store.record_progress("n1", "c1", 1, 0.5).await.unwrap();

        let report = downloader.download("n1").await.unwrap();
        assert!(!report.cover_cached);
        let novel = store.get_novel("n1").await.unwrap().unwrap();
        assert_eq!(novel.last_read_chapter, Some(1));
        assert!(novel.read_progress.is_some());
    }

    #[tokio::test]
    async fn test_remove() {
        let (fetcher, store, downloader) = setup().await;
        fetcher.respond_json(NOVEL, 200, novel_body());
        downloader.download("n1").await.unwrap();

        assert!(downloader.remove("n1").await.unwrap());
        assert!(store.get_chapters_by_novel("n1").await.unwrap().is_empty());
    }
}
