//! Novel summaries saved for offline reading.

use super::{OfflineStore, now_millis, timestamp_at};
use crate::Error;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::types::Type;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

/// Publication status of a novel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NovelStatus {
    #[default]
    Draft,
    Pending,
    Approved,
    Rejected,
}

impl NovelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for NovelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NovelStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(Self::Draft),
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(Error::InvalidInput(format!("unknown novel status: {other}"))),
        }
    }
}

/// A novel summary as kept in the offline library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredNovel {
    pub id: String,
    pub title: String,
    pub description: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub status: NovelStatus,
    pub genre: String,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub total_chapters: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_read_chapter: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_progress: Option<f64>,
    /// Refreshed on every save.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[schemars(with = "i64")]
    pub saved_at: DateTime<Utc>,
    /// Always true for records in the store.
    pub from_cache: bool,
}

impl StoredNovel {
    /// A fresh record with no reading progress.
    pub fn new(id: impl Into<String>, title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            author: author.into(),
            cover_image: None,
            status: NovelStatus::default(),
            genre: String::new(),
            view_count: 0,
            rating: 0.0,
            total_chapters: 0,
            last_read_chapter: None,
            read_progress: None,
            saved_at: Utc::now(),
            from_cache: true,
        }
    }
}

const SELECT_NOVEL: &str = "SELECT id, title, description, author, cover_image, status, genre, view_count, rating,
            total_chapters, last_read_chapter, read_progress, saved_at, from_cache
     FROM novels";

fn novel_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredNovel> {
    let status: String = row.get(5)?;
    let status = status
        .parse()
        .map_err(|e: Error| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, e.to_string().into()))?;
    let view_count: i64 = row.get(7)?;
    let view_count = u64::try_from(view_count).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(7, view_count))?;
    Ok(StoredNovel {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        author: row.get(3)?,
        cover_image: row.get(4)?,
        status,
        genre: row.get(6)?,
        view_count,
        rating: row.get(8)?,
        total_chapters: row.get(9)?,
        last_read_chapter: row.get(10)?,
        read_progress: row.get(11)?,
        saved_at: timestamp_at(row, 12)?,
        from_cache: row.get(13)?,
    })
}

impl OfflineStore {
    /// Upsert a novel by id, stamping `saved_at` to now and marking it cached.
    pub async fn save_novel(&self, novel: &StoredNovel) -> Result<(), Error> {
        if novel.id.is_empty() {
            return Err(Error::InvalidInput("novel id must not be empty".to_string()));
        }

        let view_count = i64::try_from(novel.view_count)
            .map_err(|_| Error::InvalidInput(format!("view count {} is out of range", novel.view_count)))?;
        let novel = novel.clone();
        let saved_at = now_millis();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO novels (id, title, description, author, cover_image, status, genre, view_count,
                                         rating, total_chapters, last_read_chapter, read_progress, saved_at, from_cache)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 1)
                     ON CONFLICT(id) DO UPDATE SET
                        title = excluded.title,
                        description = excluded.description,
                        author = excluded.author,
                        cover_image = excluded.cover_image,
                        status = excluded.status,
                        genre = excluded.genre,
                        view_count = excluded.view_count,
                        rating = excluded.rating,
                        total_chapters = excluded.total_chapters,
                        last_read_chapter = excluded.last_read_chapter,
                        read_progress = excluded.read_progress,
                        saved_at = excluded.saved_at,
                        from_cache = 1",
                    params![
                        novel.id,
                        novel.title,
                        novel.description,
                        novel.author,
                        novel.cover_image,
                        novel.status.as_str(),
                        novel.genre,
                        view_count,
                        novel.rating,
                        novel.total_chapters,
                        novel.last_read_chapter,
                        novel.read_progress,
                        saved_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Upsert the summary fields of a novel while keeping its reading progress.
    ///
    /// Used when the remote copy changed; a novel not yet stored is
    /// inserted with the progress carried by `novel`.
    pub async fn refresh_novel(&self, novel: &StoredNovel) -> Result<(), Error> {
        let Some(existing) = self.get_novel(&novel.id).await? else {
            return self.save_novel(novel).await;
        };

        let mut merged = novel.clone();
        merged.last_read_chapter = existing.last_read_chapter;
        merged.read_progress = existing.read_progress;
        self.save_novel(&merged).await
    }

    pub async fn get_novel(&self, id: &str) -> Result<Option<StoredNovel>, Error> {
        let id = id.to_string();
        self.conn
            .call(move |conn| -> Result<Option<StoredNovel>, Error> {
                let novel = conn
                    .query_row(&format!("{SELECT_NOVEL} WHERE id = ?1"), params![id], novel_from_row)
                    .optional()?;
                Ok(novel)
            })
            .await
            .map_err(Error::from)
    }

    /// Every stored novel, most recently saved first.
    pub async fn get_all_novels(&self) -> Result<Vec<StoredNovel>, Error> {
        self.search_novels(None, None).await
    }

    /// Novels matching author and/or genre exactly. No filter returns all.
    pub async fn search_novels(&self, author: Option<&str>, genre: Option<&str>) -> Result<Vec<StoredNovel>, Error> {
        let author = author.map(str::to_string);
        let genre = genre.map(str::to_string);
        self.conn
            .call(move |conn| -> Result<Vec<StoredNovel>, Error> {
                let mut stmt = conn.prepare(&format!(
                    "{SELECT_NOVEL}
                     WHERE (?1 IS NULL OR author = ?1) AND (?2 IS NULL OR genre = ?2)
                     ORDER BY saved_at DESC, id ASC"
                ))?;
                let novels = stmt
                    .query_map(params![author, genre], novel_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(novels)
            })
            .await
            .map_err(Error::from)
    }

    /// Remove a novel together with its chapters, images and read position.
    ///
    /// Runs in a single transaction. Returns false if the novel was absent;
    /// orphaned chapters and images are still removed in that case.
    pub async fn delete_novel(&self, id: &str) -> Result<bool, Error> {
        let id = id.to_string();
        let deleted = self
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM chapters WHERE novel_id = ?1", params![id])?;
                tx.execute("DELETE FROM offline_images WHERE novel_id = ?1", params![id])?;
                tx.execute("DELETE FROM read_positions WHERE novel_id = ?1", params![id])?;
                let deleted = tx.execute("DELETE FROM novels WHERE id = ?1", params![id])?;
                tx.commit()?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)?;

        tracing::debug!(deleted, "novel removed from offline store");
        Ok(deleted)
    }
}
