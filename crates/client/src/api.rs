//! Typed access to the upstream REST API.
//!
//! Bodies are decoded once, here, through [`ApiEnvelope`]; callers only see
//! DTOs or an error.

use crate::fetch::Fetcher;
use novelsa_core::{ApiEnvelope, Credentials, Error, NovelStatus, Request, StoredChapter, StoredNovel};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

/// Genre label for novels without tags.
pub const DEFAULT_GENRE: &str = "Other";

/// Author label for novels without an author name.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// A novel as returned by `GET /novels/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NovelDto {
    pub id: String,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub status: NovelStatus,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub chapters: Vec<ChapterDto>,
}

/// A chapter as embedded in a novel or returned by
/// `GET /novels/:id/chapters/:chapterId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterDto {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(alias = "chapterNumber")]
    pub order: u32,
    #[serde(default)]
    pub read_count: u64,
}

impl NovelDto {
    /// Summary record for the offline library.
    pub fn to_stored(&self) -> StoredNovel {
        let author = self
            .author_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_AUTHOR);

        let mut novel = StoredNovel::new(&self.id, &self.title, author);
        novel.description = self.description.clone();
        novel.cover_image = self.cover_url.clone().filter(|url| !url.is_empty());
        novel.status = self.status;
        novel.genre = self.tags.first().cloned().unwrap_or_else(|| DEFAULT_GENRE.to_string());
        novel.view_count = self.chapters.iter().map(|c| c.read_count).sum();
        novel.rating = self.rating.unwrap_or(0.0);
        novel.total_chapters = self.chapters.len() as u32;
        novel
    }
}

impl ChapterDto {
    /// Embedded content, if the listing carried a non-empty body.
    pub fn embedded_content(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.is_empty())
    }

    pub fn to_stored(&self, novel_id: &str, content: impl Into<String>) -> StoredChapter {
        StoredChapter::new(&self.id, novel_id, self.order, &self.title, content)
    }
}

/// Client for the novel resources of the REST API.
#[derive(Clone)]
pub struct ApiClient {
    fetcher: Arc<dyn Fetcher>,
    base: Url,
}

impl ApiClient {
    /// `origin` plus `api_prefix` (e.g. `/api`) form the base of every resource URL.
    pub fn new(fetcher: Arc<dyn Fetcher>, origin: &Url, api_prefix: &str) -> Result<Self, Error> {
        let base = origin
            .join(api_prefix)
            .map_err(|e| Error::InvalidUrl(format!("{origin}{api_prefix}: {e}")))?;
        Ok(Self { fetcher, base })
    }

    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.fetcher
    }

    pub fn origin(&self) -> Url {
        let mut origin = self.base.clone();
        origin.set_path("/");
        origin
    }

    /// URL of a resource below the API base, one path segment per element.
    pub fn resource_url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(format!("{} cannot be a base", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn get_novel(&self, novel_id: &str) -> Result<NovelDto, Error> {
        let url = self.resource_url(&["novels", novel_id])?;
        self.get_json(url).await
    }

    pub async fn get_chapter(&self, novel_id: &str, chapter_id: &str) -> Result<ChapterDto, Error> {
        let url = self.resource_url(&["novels", novel_id, "chapters", chapter_id])?;
        self.get_json(url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        let request = Request::get(url).with_header("Accept", "application/json");
        let response = self.fetcher.fetch(&request, Credentials::Include).await?;

        if !response.is_ok() {
            return Err(Error::HttpError(format!("status {} for {}", response.status, request.url)));
        }

        let envelope = ApiEnvelope::<T>::decode(&response.body)?;
        if envelope.is_from_cache() {
            tracing::debug!(url = %request.url, "API answered from offline data");
        }
        envelope.into_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn novel_json() -> serde_json::Value {
        json!({
            "id": "n1",
            "authorId": "u1",
            "authorName": "Alice",
            "title": "The Long Road",
            "description": "desc",
            "coverUrl": "https://img.example.com/n1.png",
            "status": "APPROVED",
            "tags": ["Fantasy", "Adventure"],
            "chapters": [
                { "id": "c1", "title": "One", "content": "first", "order": 1, "readCount": 10 },
                { "id": "c2", "title": "Two", "content": "", "order": 2, "readCount": 5 }
            ]
        })
    }

    #[test]
    fn test_novel_dto_to_stored() {
        let dto: NovelDto = serde_json::from_value(novel_json()).unwrap();
        let stored = dto.to_stored();
        assert_eq!(stored.author, "Alice");
        assert_eq!(stored.genre, "Fantasy");
        assert_eq!(stored.view_count, 15);
        assert_eq!(stored.total_chapters, 2);
        assert_eq!(stored.status, NovelStatus::Approved);
        assert_eq!(stored.read_progress, None);
        assert!(stored.from_cache);
    }

    #[test]
    fn test_novel_dto_defaults() {
        let dto: NovelDto = serde_json::from_value(json!({ "id": "n2", "title": "Bare" })).unwrap();
        let stored = dto.to_stored();
        assert_eq!(stored.author, UNKNOWN_AUTHOR);
        assert_eq!(stored.genre, DEFAULT_GENRE);
        assert_eq!(stored.cover_image, None);
    }

    #[test]
    fn test_chapter_dto_embedded_content() {
        let dto: NovelDto = serde_json::from_value(novel_json()).unwrap();
        assert_eq!(dto.chapters[0].embedded_content(), Some("first"));
        assert_eq!(dto.chapters[1].embedded_content(), None);
    }

    #[test]
    fn test_chapter_number_alias() {
        let dto: ChapterDto =
            serde_json::from_value(json!({ "id": "c3", "title": "Three", "chapterNumber": 3 })).unwrap();
        assert_eq!(dto.order, 3);
        assert_eq!(dto.to_stored("n1", "body").chapter_number, 3);
    }

    #[test]
    fn test_resource_url_encodes_segments() {
        struct Unused;
        #[async_trait::async_trait]
        impl Fetcher for Unused {
            async fn fetch(&self, _: &Request, _: Credentials) -> Result<novelsa_core::Response, Error> {
                Err(Error::Offline("unused".into()))
            }
        }

        let origin = Url::parse("http://localhost:3000").unwrap();
        let api = ApiClient::new(Arc::new(Unused), &origin, "/api").unwrap();
        let url = api.resource_url(&["novels", "a b", "chapters", "c1"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/novels/a%20b/chapters/c1");
        assert_eq!(api.origin().as_str(), "http://localhost:3000/");
    }
}
