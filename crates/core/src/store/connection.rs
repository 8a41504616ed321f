//! Offline store connection management.
//!
//! The store is an explicitly constructed service object: open it once,
//! clone the handle into whatever needs it, close it on shutdown.

use crate::Error;
use crate::migrations::{self, STORE_MIGRATIONS};
use std::path::Path;
use tokio_rusqlite::Connection;

/// Default quota reported when none is configured (512 MiB).
pub const DEFAULT_QUOTA_BYTES: u64 = 512 * 1024 * 1024;

/// Offline store handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations
/// on a background thread.
#[derive(Clone, Debug)]
pub struct OfflineStore {
    pub(crate) conn: Connection,
    pub(crate) quota_bytes: u64,
}

impl OfflineStore {
    /// Open the store at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies performance pragmas,
    /// and runs any pending (additive) schema migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    /// Open an in-memory store for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode=WAL;
                 PRAGMA synchronous=NORMAL;
                 PRAGMA temp_store=MEMORY;",
            )?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        migrations::run(&conn, STORE_MIGRATIONS).await?;
        tracing::debug!("offline store ready");

        Ok(Self { conn, quota_bytes: DEFAULT_QUOTA_BYTES })
    }

    /// Set the quota reported by [`OfflineStore::get_storage_info`].
    pub fn with_quota(mut self, quota_bytes: u64) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    /// Close the underlying connection.
    pub async fn close(self) -> Result<(), Error> {
        self.conn.close().await.map_err(Error::from)
    }
}
