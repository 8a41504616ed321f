//! Cache and entry operations.
//!
//! Provides opening, listing and deleting named caches, plus put/match of
//! request/response pairs inside them.

use super::connection::CacheStorage;
use crate::http::{Request, Response};
use crate::Error;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};
use url::Url;

/// A stored request/response pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub cache_name: String,
    pub method: String,
    pub url: Url,
    pub response: Response,
    pub stored_at: DateTime<Utc>,
}

/// Handle to one named cache, as returned by [`CacheStorage::open_cache`].
#[derive(Debug, Clone)]
pub struct Cache {
    name: String,
    storage: CacheStorage,
}

impl Cache {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn put(&self, request: &Request, response: &Response) -> Result<(), Error> {
        self.storage.put(&self.name, request, response).await
    }

    pub async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        self.storage.match_in(&self.name, request).await
    }

    pub async fn delete_entry(&self, request: &Request) -> Result<bool, Error> {
        self.storage.delete_entry(&self.name, request).await
    }

    pub async fn len(&self) -> Result<u64, Error> {
        self.storage.entry_count(&self.name).await
    }

    pub async fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len().await? == 0)
    }
}

const SELECT_ENTRY: &str = "SELECT e.cache_name, e.method, e.url, e.status, e.status_text, e.headers_json, e.body, e.stored_at
     FROM cache_entries e";

struct EntryRow {
    cache_name: String,
    method: String,
    url: String,
    status: u16,
    status_text: String,
    headers_json: String,
    body: Vec<u8>,
    stored_at: String,
}

impl EntryRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            cache_name: row.get(0)?,
            method: row.get(1)?,
            url: row.get(2)?,
            status: row.get(3)?,
            status_text: row.get(4)?,
            headers_json: row.get(5)?,
            body: row.get(6)?,
            stored_at: row.get(7)?,
        })
    }

    fn decode(self) -> Result<CachedResponse, Error> {
        let url = Url::parse(&self.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let headers: Vec<(String, String)> = serde_json::from_str(&self.headers_json)?;
        let stored_at = DateTime::parse_from_rfc3339(&self.stored_at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| Error::Decode(e.to_string()))?;

        Ok(CachedResponse {
            cache_name: self.cache_name,
            method: self.method,
            url,
            response: Response {
                status: self.status,
                status_text: self.status_text,
                headers,
                body: Bytes::from(self.body),
            },
            stored_at,
        })
    }
}

impl CacheStorage {
    /// Open a named cache, creating it if absent.
    pub async fn open_cache(&self, name: &str) -> Result<Cache, Error> {
        let cache_name = name.to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute("INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)", params![cache_name, now])?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(Cache { name: name.to_string(), storage: self.clone() })
    }

    /// Whether a cache with this name exists.
    pub async fn has(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists =
                    conn.query_row("SELECT EXISTS(SELECT 1 FROM caches WHERE name = ?1)", params![name], |row| {
                        row.get(0)
                    })?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Cache names in creation order.
    pub async fn keys(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM caches ORDER BY seq ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a cache and every entry in it.
    ///
    /// Returns false if no cache had this name.
    pub async fn delete(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM cache_entries WHERE cache_name = ?1", params![name])?;
                let deleted = tx.execute("DELETE FROM caches WHERE name = ?1", params![name])?;
                tx.commit()?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every cache whose name is not in `valid`.
    ///
    /// Returns the deleted names.
    pub async fn delete_caches_not_in(&self, valid: &[String]) -> Result<Vec<String>, Error> {
        let mut deleted = Vec::new();
        for name in self.keys().await? {
            if valid.contains(&name) {
                continue;
            }
            tracing::info!(cache = %name, "deleting stale cache");
            if self.delete(&name).await? {
                deleted.push(name);
            }
        }
        Ok(deleted)
    }

    /// Store a response for a request in the named cache.
    ///
    /// Uses UPSERT semantics: a later put for the same method and URL
    /// replaces the earlier one. Only `GET` requests can be cached.
    pub async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error> {
        if !request.is_get() {
            return Err(Error::InvalidInput(format!("cannot cache {} request for {}", request.method, request.url)));
        }

        let cache_name = name.to_string();
        let key_hash = request.cache_key();
        let method = request.method.to_ascii_uppercase();
        let mut url = request.url.clone();
        url.set_fragment(None);
        let url = url.to_string();
        let status = response.status;
        let status_text = response.status_text.clone();
        let headers_json = serde_json::to_string(&response.headers)?;
        let body = response.body.to_vec();
        let now = Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)",
                    params![cache_name, now],
                )?;
                tx.execute(
                    "INSERT INTO cache_entries (
                        cache_name, key_hash, method, url, status, status_text, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    ON CONFLICT(cache_name, key_hash) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        status_text = excluded.status_text,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![cache_name, key_hash, method, url, status, status_text, headers_json, body, now],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a request in one named cache.
    pub async fn match_entry_in(&self, name: &str, request: &Request) -> Result<Option<CachedResponse>, Error> {
        let name = name.to_string();
        let key_hash = request.cache_key();
        let row = self
            .conn
            .call(move |conn| -> Result<_, Error> {
                let row = conn
                    .query_row(
                        &format!("{SELECT_ENTRY} WHERE e.cache_name = ?1 AND e.key_hash = ?2"),
                        params![name, key_hash],
                        EntryRow::from_row,
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(Error::from)?;

        row.map(EntryRow::decode).transpose()
    }

    /// Look up a request in one named cache, returning only the response.
    pub async fn match_in(&self, name: &str, request: &Request) -> Result<Option<Response>, Error> {
        Ok(self.match_entry_in(name, request).await?.map(|entry| entry.response))
    }

    /// Look up a request across all caches in creation order.
    pub async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        let key_hash = request.cache_key();
        let row = self
            .conn
            .call(move |conn| -> Result<_, Error> {
                let row = conn
                    .query_row(
                        &format!(
                            "{SELECT_ENTRY} JOIN caches c ON c.name = e.cache_name
                             WHERE e.key_hash = ?1 ORDER BY c.seq ASC LIMIT 1"
                        ),
                        params![key_hash],
                        EntryRow::from_row,
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(Error::from)?;

        Ok(row.map(EntryRow::decode).transpose()?.map(|entry| entry.response))
    }

    /// Remove one request from the named cache.
    pub async fn delete_entry(&self, name: &str, request: &Request) -> Result<bool, Error> {
        let name = name.to_string();
        let key_hash = request.cache_key();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute(
                    "DELETE FROM cache_entries WHERE cache_name = ?1 AND key_hash = ?2",
                    params![name, key_hash],
                )?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in the named cache.
    pub async fn entry_count(&self, name: &str) -> Result<u64, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM cache_entries WHERE cache_name = ?1", params![name], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(url: &str) -> Request {
        Request::get(Url::parse(url).unwrap())
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let caches = CacheStorage::open_in_memory().await.unwrap();
        let req = get("http://localhost:3000/main.js");
        let resp = Response::text(200, "console.log(1)").with_header("Content-Type", "text/javascript");

        caches.put("shell-v1", &req, &resp).await.unwrap();

        let hit = caches.match_in("shell-v1", &req).await.unwrap().unwrap();
        assert_eq!(hit, resp);
        assert!(caches.match_in("images-v1", &req).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_rejects_non_get() {
        let caches = CacheStorage::open_in_memory().await.unwrap();
        let req = get("http://localhost:3000/api/novels").with_method("POST");
        let result = caches.put("api-v1", &req, &Response::text(200, "{}")).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_put_upserts() {
        let caches = CacheStorage::open_in_memory().await.unwrap();
        let req = get("http://localhost:3000/api/novels");

        caches.put("api-v1", &req, &Response::text(200, "old")).await.unwrap();
        caches.put("api-v1", &req, &Response::text(200, "new")).await.unwrap();

        assert_eq!(caches.entry_count("api-v1").await.unwrap(), 1);
        let hit = caches.match_in("api-v1", &req).await.unwrap().unwrap();
        assert_eq!(&hit.body[..], b"new");
    }

    #[tokio::test]
    async fn test_match_any_uses_creation_order() {
        let caches = CacheStorage::open_in_memory().await.unwrap();
        let req = get("http://localhost:3000/index.html");

        caches.open_cache("shell-v1").await.unwrap();
        caches.open_cache("api-v1").await.unwrap();
        caches.put("api-v1", &req, &Response::text(200, "from api")).await.unwrap();
        caches.put("shell-v1", &req, &Response::text(200, "from shell")).await.unwrap();

        let hit = caches.match_any(&req).await.unwrap().unwrap();
        assert_eq!(&hit.body[..], b"from shell");
    }

    #[tokio::test]
    async fn test_match_entry_metadata() {
        let caches = CacheStorage::open_in_memory().await.unwrap();
        let req = get("http://localhost:3000/cover.png#frag");
        caches.put("images-v1", &req, &Response::new(200, vec![1u8, 2, 3])).await.unwrap();

        let entry = caches.match_entry_in("images-v1", &req).await.unwrap().unwrap();
        assert_eq!(entry.cache_name, "images-v1");
        assert_eq!(entry.method, "GET");
        assert_eq!(entry.url.as_str(), "http://localhost:3000/cover.png");
        assert_eq!(&entry.response.body[..], &[1, 2, 3]);
    }

    #[tokio::test]
    async fn test_open_cache_is_listed_when_empty() {
        let caches = CacheStorage::open_in_memory().await.unwrap();
        let cache = caches.open_cache("images-v1").await.unwrap();
        assert_eq!(cache.name(), "images-v1");
        assert!(cache.is_empty().await.unwrap());
        assert_eq!(caches.keys().await.unwrap(), vec!["images-v1".to_string()]);
        assert!(caches.has("images-v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_caches_not_in() {
        let caches = CacheStorage::open_in_memory().await.unwrap();
        let req = get("http://localhost:3000/");
        for name in ["shell-v1", "images-v1", "shell-v2", "images-v2"] {
            caches.put(name, &req, &Response::text(200, name)).await.unwrap();
        }

        let valid = vec!["shell-v2".to_string(), "images-v2".to_string(), "api-v2".to_string()];
        let deleted = caches.delete_caches_not_in(&valid).await.unwrap();

        assert_eq!(deleted, vec!["shell-v1".to_string(), "images-v1".to_string()]);
        assert_eq!(caches.keys().await.unwrap(), vec!["shell-v2".to_string(), "images-v2".to_string()]);
        assert_eq!(caches.entry_count("shell-v1").await.unwrap(), 0);
        assert!(caches.match_in("shell-v2", &req).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cache_handle_delete_entry() {
        let caches = CacheStorage::open_in_memory().await.unwrap();
        let cache = caches.open_cache("shell-v1").await.unwrap();
        let req = get("http://localhost:3000/styles.css");
        cache.put(&req, &Response::text(200, "body{}")).await.unwrap();
        assert!(cache.match_request(&req).await.unwrap().is_some());

        assert!(cache.delete_entry(&req).await.unwrap());
        assert!(!cache.delete_entry(&req).await.unwrap());
        assert!(cache.match_request(&req).await.unwrap().is_none());
    }
}
