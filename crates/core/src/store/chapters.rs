//! Chapter bodies keyed by (novel id, chapter number).

use super::{OfflineStore, now_millis, timestamp_at};
use crate::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredChapter {
    pub id: String,
    pub novel_id: String,
    pub chapter_number: u32,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressed: Option<bool>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub saved_at: DateTime<Utc>,
    pub from_cache: bool,
}

impl StoredChapter {
    pub fn new(
        id: impl Into<String>, novel_id: impl Into<String>, chapter_number: u32, title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            novel_id: novel_id.into(),
            chapter_number,
            title: title.into(),
            content: content.into(),
            compressed: None,
            saved_at: Utc::now(),
            from_cache: true,
        }
    }
}

const SELECT_CHAPTER: &str =
    "SELECT id, novel_id, chapter_number, title, content, compressed, saved_at, from_cache FROM chapters";

const UPSERT_CHAPTER: &str =
    "INSERT INTO chapters (id, novel_id, chapter_number, title, content, compressed, saved_at, from_cache)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1)
     ON CONFLICT(novel_id, chapter_number) DO UPDATE SET
        id = excluded.id,
        title = excluded.title,
        content = excluded.content,
        compressed = excluded.compressed,
        saved_at = excluded.saved_at,
        from_cache = 1";

fn chapter_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredChapter> {
    Ok(StoredChapter {
        id: row.get(0)?,
        novel_id: row.get(1)?,
        chapter_number: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        compressed: row.get(5)?,
        saved_at: timestamp_at(row, 6)?,
        from_cache: row.get(7)?,
    })
}

fn validate(chapter: &StoredChapter) -> Result<(), Error> {
    if chapter.novel_id.is_empty() {
        return Err(Error::InvalidInput(format!("chapter {} has no novel id", chapter.id)));
    }
    Ok(())
}

impl OfflineStore {
    /// Upsert one chapter by (novel id, chapter number).
    pub async fn save_chapter(&self, chapter: &StoredChapter) -> Result<(), Error> {
        self.save_chapters(std::slice::from_ref(chapter)).await
    }

    /// Upsert a batch of chapters in one transaction.
    ///
    /// Either every chapter in the batch is stored or none is.
    pub async fn save_chapters(&self, chapters: &[StoredChapter]) -> Result<(), Error> {
        for chapter in chapters {
            validate(chapter)?;
        }
        if chapters.is_empty() {
            return Ok(());
        }

        let chapters = chapters.to_vec();
        let saved_at = now_millis();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(UPSERT_CHAPTER)?;
                    for c in &chapters {
                        stmt.execute(params![
                            c.id,
                            c.novel_id,
                            c.chapter_number,
                            c.title,
                            c.content,
                            c.compressed,
                            saved_at
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    pub async fn get_chapter(&self, novel_id: &str, chapter_number: u32) -> Result<Option<StoredChapter>, Error> {
        let novel_id = novel_id.to_string();
        self.conn
            .call(move |conn| -> Result<Option<StoredChapter>, Error> {
                let chapter = conn
                    .query_row(
                        &format!("{SELECT_CHAPTER} WHERE novel_id = ?1 AND chapter_number = ?2"),
                        params![novel_id, chapter_number],
                        chapter_from_row,
                    )
                    .optional()?;
                Ok(chapter)
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a chapter of a novel by its own id rather than its number.
    pub async fn find_chapter_by_id(&self, novel_id: &str, chapter_id: &str) -> Result<Option<StoredChapter>, Error> {
        let novel_id = novel_id.to_string();
        let chapter_id = chapter_id.to_string();
        self.conn
            .call(move |conn| -> Result<Option<StoredChapter>, Error> {
                let chapter = conn
                    .query_row(
                        &format!("{SELECT_CHAPTER} WHERE novel_id = ?1 AND id = ?2 LIMIT 1"),
                        params![novel_id, chapter_id],
                        chapter_from_row,
                    )
                    .optional()?;
                Ok(chapter)
            })
            .await
            .map_err(Error::from)
    }

    /// Every stored chapter of a novel in ascending chapter order.
    pub async fn get_chapters_by_novel(&self, novel_id: &str) -> Result<Vec<StoredChapter>, Error> {
        let novel_id = novel_id.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<StoredChapter>, Error> {
                let mut stmt = conn.prepare(&format!("{SELECT_CHAPTER} WHERE novel_id = ?1 ORDER BY chapter_number ASC"))?;
                let chapters = stmt
                    .query_map(params![novel_id], chapter_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(chapters)
            })
            .await
            .map_err(Error::from)
    }

    /// Remove every chapter of a novel. Returns the number removed.
    pub async fn delete_chapters_for_novel(&self, novel_id: &str) -> Result<u64, Error> {
        let novel_id = novel_id.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let removed = conn.execute("DELETE FROM chapters WHERE novel_id = ?1", params![novel_id])?;
                Ok(removed as u64)
            })
            .await
            .map_err(Error::from)
    }
}
