//! Draining operations that were deferred while offline.

use novelsa_client::NovelDownloader;
use novelsa_core::{Error, OfflineStore, SyncOperation, SyncQueueEntry};
use serde::Serialize;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub processed: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Replays pending sync queue entries against the API.
pub struct SyncProcessor {
    store: OfflineStore,
    downloader: NovelDownloader,
    /// One drain at a time; a second signal waits for the first.
    running: Mutex<()>,
}

impl SyncProcessor {
    pub fn new(store: OfflineStore, downloader: NovelDownloader) -> Self {
        Self { store, downloader, running: Mutex::new(()) }
    }

    /// Process every pending entry in queue order. Entries that fail stay
    /// pending for the next run.
    ///
    /// # Errors
    ///
    /// Returns an error only if the queue itself cannot be read.
    pub async fn process(&self) -> Result<SyncReport, Error> {
        let _running = self.running.lock().await;
        let pending = self.store.get_sync_queue().await?;
        let mut report = SyncReport::default();

        for entry in pending {
            report.processed += 1;
            match self.apply(&entry).await {
                Ok(()) => match self.store.mark_sync_complete(entry.id).await {
                    Ok(_) => report.completed += 1,
                    Err(e) => {
                        tracing::warn!(id = entry.id, error = %e, "failed to mark sync entry complete");
                        report.failed += 1;
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        id = entry.id,
                        operation = %entry.operation,
                        novel_id = %entry.novel_id,
                        error = %e,
                        "sync entry failed, leaving it pending"
                    );
                    report.failed += 1;
                }
            }
        }

        if report.processed > 0 {
            tracing::info!(processed = report.processed, completed = report.completed, failed = report.failed, "sync queue drained");
        }
        Ok(report)
    }

    async fn apply(&self, entry: &SyncQueueEntry) -> Result<(), Error> {
        match entry.operation {
            SyncOperation::Download => self.downloader.download(&entry.novel_id).await.map(|_| ()),
            SyncOperation::Update => self.downloader.refresh(&entry.novel_id).await,
            SyncOperation::Delete => self.downloader.remove(&entry.novel_id).await.map(|_| ()),
        }
    }
}
