//! Reading positions, one per novel.

use super::{OfflineStore, now_millis, timestamp_at};
use crate::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::OptionalExtension;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadPosition {
    pub novel_id: String,
    pub chapter_id: String,
    pub chapter_number: u32,
    pub scroll_position: f64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub read_at: DateTime<Utc>,
}

impl ReadPosition {
    pub fn new(novel_id: impl Into<String>, chapter_id: impl Into<String>, chapter_number: u32) -> Self {
        Self {
            novel_id: novel_id.into(),
            chapter_id: chapter_id.into(),
            chapter_number,
            scroll_position: 0.0,
            read_at: Utc::now(),
        }
    }

    pub fn with_scroll(mut self, scroll_position: f64) -> Self {
        self.scroll_position = scroll_position;
        self
    }
}

const UPSERT_POSITION: &str = "INSERT INTO read_positions (novel_id, chapter_id, chapter_number, scroll_position, read_at)
     VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT(novel_id) DO UPDATE SET
        chapter_id = excluded.chapter_id,
        chapter_number = excluded.chapter_number,
        scroll_position = excluded.scroll_position,
        read_at = excluded.read_at";

impl OfflineStore {
    /// Upsert the resume point of a novel, stamping `read_at` to now.
    pub async fn save_read_position(&self, position: &ReadPosition) -> Result<(), Error> {
        let p = position.clone();
        let read_at = now_millis();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    UPSERT_POSITION,
                    params![p.novel_id, p.chapter_id, p.chapter_number, p.scroll_position, read_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    pub async fn get_read_position(&self, novel_id: &str) -> Result<Option<ReadPosition>, Error> {
        let novel_id = novel_id.to_string();
        self.conn
            .call(move |conn| -> Result<Option<ReadPosition>, Error> {
                let position = conn
                    .query_row(
                        "SELECT novel_id, chapter_id, chapter_number, scroll_position, read_at
                         FROM read_positions WHERE novel_id = ?1",
                        params![novel_id],
                        |row| {
                            Ok(ReadPosition {
                                novel_id: row.get(0)?,
                                chapter_id: row.get(1)?,
                                chapter_number: row.get(2)?,
                                scroll_position: row.get(3)?,
                                read_at: timestamp_at(row, 4)?,
                            })
                        },
                    )
                    .optional()?;
                Ok(position)
            })
            .await
            .map_err(Error::from)
    }

    /// Record that a chapter was opened in the reader.
    ///
    /// In one transaction: saves the read position, then sets the novel's
    /// `read_progress` to `(index + 1) / stored * 100` and `last_read_chapter`,
    /// where `index` is the chapter's position among the stored chapters.
    /// Saving progress refreshes `saved_at`. Returns the new percentage, or
    /// `None` if the chapter is not stored.
    pub async fn record_progress(
        &self, novel_id: &str, chapter_id: &str, chapter_number: u32, scroll_position: f64,
    ) -> Result<Option<f64>, Error> {
        let novel_id = novel_id.to_string();
        let chapter_id = chapter_id.to_string();
        let now = now_millis();
        self.conn
            .call(move |conn| -> Result<Option<f64>, Error> {
                let tx = conn.transaction()?;
                tx.execute(UPSERT_POSITION, params![novel_id, chapter_id, chapter_number, scroll_position, now])?;

                let (stored, index): (i64, i64) = tx.query_row(
                    "SELECT COUNT(*),
                            COALESCE(SUM(CASE WHEN chapter_number < ?2 THEN 1 ELSE 0 END), 0)
                     FROM chapters WHERE novel_id = ?1",
                    params![novel_id, chapter_number],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;
                let present: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM chapters WHERE novel_id = ?1 AND chapter_number = ?2)",
                    params![novel_id, chapter_number],
                    |row| row.get(0),
                )?;

                let progress = if present && stored > 0 {
                    let progress = (index + 1) as f64 / stored as f64 * 100.0;
                    tx.execute(
                        "UPDATE novels SET read_progress = ?2, last_read_chapter = ?3, saved_at = ?4 WHERE id = ?1",
                        params![novel_id, progress, chapter_number, now],
                    )?;
                    Some(progress)
                } else {
                    None
                };

                tx.commit()?;
                Ok(progress)
            })
            .await
            .map_err(Error::from)
    }
}
