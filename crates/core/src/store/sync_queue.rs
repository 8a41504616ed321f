//! Operations deferred while offline.

use super::{OfflineStore, now_millis};
use crate::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SyncOperation {
    Update,
    Delete,
    Download,
}

impl SyncOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Download => "download",
        }
    }
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncOperation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "download" => Ok(Self::Download),
            other => Err(Error::Decode(format!("unknown sync operation: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Pending,
    Complete,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Complete => "complete",
        }
    }
}

/// An operation to enqueue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOperation {
    #[serde(rename = "type")]
    pub operation: SyncOperation,
    pub novel_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl PendingOperation {
    pub fn new(operation: SyncOperation, novel_id: impl Into<String>) -> Self {
        Self { operation, novel_id: novel_id.into(), data: None }
    }
}

/// A queued operation with its identity and status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncQueueEntry {
    pub id: i64,
    #[serde(rename = "type")]
    pub operation: SyncOperation,
    pub novel_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub status: SyncStatus,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub completed_at: Option<DateTime<Utc>>,
}

struct QueueRow {
    id: i64,
    operation: String,
    novel_id: String,
    data_json: Option<String>,
    status: String,
    queued_at: i64,
    completed_at: Option<i64>,
}

impl QueueRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            operation: row.get(1)?,
            novel_id: row.get(2)?,
            data_json: row.get(3)?,
            status: row.get(4)?,
            queued_at: row.get(5)?,
            completed_at: row.get(6)?,
        })
    }

    fn decode(self) -> Result<SyncQueueEntry, Error> {
        let data = self.data_json.as_deref().map(serde_json::from_str).transpose()?;
        let status = if self.status == SyncStatus::Complete.as_str() { SyncStatus::Complete } else { SyncStatus::Pending };
        let to_time = |ms: i64| DateTime::from_timestamp_millis(ms).ok_or_else(|| Error::Decode(format!("bad timestamp {ms}")));

        Ok(SyncQueueEntry {
            id: self.id,
            operation: self.operation.parse()?,
            novel_id: self.novel_id,
            data,
            status,
            timestamp: to_time(self.queued_at)?,
            completed_at: self.completed_at.map(to_time).transpose()?,
        })
    }
}

impl OfflineStore {
    /// Append an operation with status pending. Returns its id.
    pub async fn queue_sync(&self, operation: &PendingOperation) -> Result<i64, Error> {
        if operation.novel_id.is_empty() {
            return Err(Error::InvalidInput("sync operation needs a novel id".to_string()));
        }

        let kind = operation.operation.as_str();
        let novel_id = operation.novel_id.clone();
        let data_json = operation.data.as_ref().map(serde_json::to_string).transpose()?;
        let queued_at = now_millis();
        let id = self
            .conn
            .call(move |conn| -> Result<i64, Error> {
                conn.execute(
                    "INSERT INTO sync_queue (operation, novel_id, data_json, status, queued_at)
                     VALUES (?1, ?2, ?3, 'pending', ?4)",
                    params![kind, novel_id, data_json, queued_at],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(Error::from)?;

        tracing::debug!(id, operation = kind, "queued sync operation");
        Ok(id)
    }

    /// Pending operations in the order they were queued.
    pub async fn get_sync_queue(&self) -> Result<Vec<SyncQueueEntry>, Error> {
        let rows = self
            .conn
            .call(|conn| -> Result<Vec<QueueRow>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, operation, novel_id, data_json, status, queued_at, completed_at
                     FROM sync_queue WHERE status = 'pending' ORDER BY id ASC",
                )?;
                let rows = stmt
                    .query_map([], QueueRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        rows.into_iter().map(QueueRow::decode).collect()
    }

    /// Mark a queued operation complete.
    ///
    /// Returns false if no operation had this id; that is not an error.
    pub async fn mark_sync_complete(&self, id: i64) -> Result<bool, Error> {
        let completed_at = now_millis();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let updated = conn.execute(
                    "UPDATE sync_queue SET status = 'complete', completed_at = ?2 WHERE id = ?1",
                    params![id, completed_at],
                )?;
                Ok(updated > 0)
            })
            .await
            .map_err(Error::from)
    }
}
