//! Storage accounting and retention.

use super::OfflineStore;
use crate::Error;
use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// Space used by the offline store against its quota.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    pub usage: u64,
    pub quota: u64,
    pub percent_used: f64,
    pub novels_count: u64,
    /// Chapters belonging to stored novels.
    pub chapters_count: u64,
}

/// What a retention pass removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub novels_removed: u64,
    pub chapters_removed: u64,
}

impl OfflineStore {
    pub async fn get_storage_info(&self) -> Result<StorageInfo, Error> {
        let quota = self.quota_bytes;
        let (usage, novels_count, chapters_count) = self
            .conn
            .call(|conn| -> Result<(i64, i64, i64), Error> {
                let page_count: i64 = conn.query_row("PRAGMA page_count", [], |row| row.get(0))?;
                let page_size: i64 = conn.query_row("PRAGMA page_size", [], |row| row.get(0))?;
                let novels: i64 = conn.query_row("SELECT COUNT(*) FROM novels", [], |row| row.get(0))?;
                let chapters: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM chapters c WHERE EXISTS (SELECT 1 FROM novels n WHERE n.id = c.novel_id)",
                    [],
                    |row| row.get(0),
                )?;
                Ok((page_count * page_size, novels, chapters))
            })
            .await
            .map_err(Error::from)?;

        let usage = usage.max(0) as u64;
        let percent_used = if quota > 0 { usage as f64 / quota as f64 * 100.0 } else { 0.0 };

        Ok(StorageInfo {
            usage,
            quota,
            percent_used,
            novels_count: novels_count.max(0) as u64,
            chapters_count: chapters_count.max(0) as u64,
        })
    }

    /// Remove novels saved more than `days` days ago, with their chapters.
    pub async fn cleanup_old_data(&self, days: u32) -> Result<CleanupReport, Error> {
        let cutoff = Utc::now() - Duration::days(i64::from(days));
        self.cleanup_saved_before(cutoff).await
    }

    /// Remove novels whose `saved_at` is older than `cutoff`.
    ///
    /// A removed novel takes its chapters, images and read position with it.
    /// Chapters of a kept novel stay regardless of their own age; only
    /// chapters with no parent novel are swept. Runs in a single transaction.
    pub async fn cleanup_saved_before(&self, cutoff: DateTime<Utc>) -> Result<CleanupReport, Error> {
        let cutoff = cutoff.timestamp_millis();
        let report = self
            .conn
            .call(move |conn| -> Result<CleanupReport, Error> {
                let tx = conn.transaction()?;
                let stale = "SELECT id FROM novels WHERE saved_at < ?1";
                let mut chapters_removed =
                    tx.execute(&format!("DELETE FROM chapters WHERE novel_id IN ({stale})"), params![cutoff])?;
                tx.execute(&format!("DELETE FROM offline_images WHERE novel_id IN ({stale})"), params![cutoff])?;
                tx.execute(&format!("DELETE FROM read_positions WHERE novel_id IN ({stale})"), params![cutoff])?;
                let novels_removed = tx.execute("DELETE FROM novels WHERE saved_at < ?1", params![cutoff])?;
                chapters_removed +=
                    tx.execute("DELETE FROM chapters WHERE novel_id NOT IN (SELECT id FROM novels)", [])?;
                tx.commit()?;

                Ok(CleanupReport { novels_removed: novels_removed as u64, chapters_removed: chapters_removed as u64 })
            })
            .await
            .map_err(Error::from)?;

        tracing::info!(
            novels = report.novels_removed,
            chapters = report.chapters_removed,
            "cleaned up old offline data"
        );
        Ok(report)
    }

    /// Empty every collection.
    pub async fn clear_all(&self) -> Result<(), Error> {
        self.conn
            .call(|conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute_batch(
                    "DELETE FROM chapters;
                     DELETE FROM offline_images;
                     DELETE FROM read_positions;
                     DELETE FROM sync_queue;
                     DELETE FROM novels;",
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
