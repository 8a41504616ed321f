//! Encoded images kept for offline display.

use super::{OfflineStore, now_millis, timestamp_at};
use crate::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

/// An image payload stored by URL.
///
/// `data` is either bare base64 or a `data:` URL; `size` is its length in bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedImage {
    pub url: String,
    pub novel_id: String,
    pub data: String,
    pub size: u64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub cached_at: DateTime<Utc>,
}

fn image_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CachedImage> {
    let size: i64 = row.get(3)?;
    Ok(CachedImage {
        url: row.get(0)?,
        novel_id: row.get(1)?,
        data: row.get(2)?,
        size: size.max(0) as u64,
        cached_at: timestamp_at(row, 4)?,
    })
}

impl OfflineStore {
    /// Upsert an encoded image by URL.
    pub async fn cache_image(&self, url: &str, novel_id: &str, data: &str) -> Result<(), Error> {
        if url.is_empty() {
            return Err(Error::InvalidInput("image url must not be empty".to_string()));
        }

        let url = url.to_string();
        let novel_id = novel_id.to_string();
        let data = data.to_string();
        let size = data.len() as i64;
        let cached_at = now_millis();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO offline_images (url, novel_id, data, size, cached_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(url) DO UPDATE SET
                        novel_id = excluded.novel_id,
                        data = excluded.data,
                        size = excluded.size,
                        cached_at = excluded.cached_at",
                    params![url, novel_id, data, size, cached_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// The encoded payload for an image URL, if stored.
    pub async fn get_cached_image(&self, url: &str) -> Result<Option<String>, Error> {
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let data = conn
                    .query_row("SELECT data FROM offline_images WHERE url = ?1", params![url], |row| row.get(0))
                    .optional()?;
                Ok(data)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn get_images_for_novel(&self, novel_id: &str) -> Result<Vec<CachedImage>, Error> {
        let novel_id = novel_id.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<CachedImage>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT url, novel_id, data, size, cached_at FROM offline_images
                     WHERE novel_id = ?1 ORDER BY cached_at ASC, url ASC",
                )?;
                let images = stmt
                    .query_map(params![novel_id], image_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(images)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_and_get_image() {
        let store = OfflineStore::open_in_memory().await.unwrap();
        store
            .cache_image("https://img.example.com/a.png", "n1", "data:image/png;base64,aGVsbG8=")
            .await
            .unwrap();

        let data = store.get_cached_image("https://img.example.com/a.png").await.unwrap();
        assert_eq!(data.as_deref(), Some("data:image/png;base64,aGVsbG8="));
        assert!(store.get_cached_image("https://img.example.com/b.png").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_image_size_and_upsert() {
        let store = OfflineStore::open_in_memory().await.unwrap();
        store.cache_image("https://img.example.com/a.png", "n1", "aGVsbG8=").await.unwrap();
        store.cache_image("https://img.example.com/a.png", "n1", "aGk=").await.unwrap();
        store.cache_image("https://img.example.com/b.png", "n2", "aGk=").await.unwrap();

        let images = store.get_images_for_novel("n1").await.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].data, "aGk=");
        assert_eq!(images[0].size, 4);
    }

    #[tokio::test]
    async fn test_cache_image_rejects_empty_url() {
        let store = OfflineStore::open_in_memory().await.unwrap();
        assert!(store.cache_image("", "n1", "aGk=").await.is_err());
    }
}
