//! Structured offline store for novels, chapters and reading state.
//!
//! Five independent collections live in one SQLite database:
//!
//! - `novels`: denormalized novel summaries, indexed by author, genre and save time
//! - `chapters`: chapter bodies keyed by (novel id, chapter number)
//! - `read_positions`: one resume point per novel
//! - `offline_images`: encoded cover art keyed by URL
//! - `sync_queue`: operations deferred while offline
//!
//! Every operation surfaces storage errors unchanged; fallback decisions
//! belong to the caller.

pub mod chapters;
pub mod connection;
pub mod images;
pub mod novels;
pub mod positions;
pub mod storage;
pub mod sync_queue;

pub use chapters::StoredChapter;
pub use connection::OfflineStore;
pub use images::CachedImage;
pub use novels::{NovelStatus, StoredNovel};
pub use positions::ReadPosition;
pub use storage::{CleanupReport, StorageInfo};
pub use sync_queue::{PendingOperation, SyncOperation, SyncQueueEntry, SyncStatus};

use chrono::{DateTime, Utc};
use tokio_rusqlite::rusqlite;

/// Read a millisecond timestamp column.
pub(crate) fn timestamp_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let millis: i64 = row.get(idx)?;
    DateTime::from_timestamp_millis(millis).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, millis))
}

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
