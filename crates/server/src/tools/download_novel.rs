//! download_novel tool implementation.
//!
//! Saves a novel for offline reading now, or queues the download for the
//! next sync.

use novelsa_client::NovelDownloader;
use novelsa_core::{Error, OfflineStore, PendingOperation, SyncOperation};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the download_novel tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DownloadNovelParams {
    /// The novel to download.
    pub novel_id: String,

    /// Only append a `download` entry to the sync queue (default: false).
    #[serde(default)]
    pub queue_only: Option<bool>,
}

/// Output from the download_novel tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct DownloadNovelOutput {
    pub novel_id: String,
    /// Sync queue entry id when the download was deferred.
    pub queued_id: Option<i64>,
    pub chapters_saved: usize,
    pub chapters_failed: usize,
    pub cover_cached: bool,
}

/// Implementation of the download_novel tool.
pub async fn download_impl(
    store: &OfflineStore, downloader: &NovelDownloader, params: DownloadNovelParams,
) -> Result<CallToolResult, McpError> {
    let novel_id = params.novel_id.trim();
    if novel_id.is_empty() {
        return Err(Error::InvalidInput("novel_id must not be empty".to_string()).into());
    }

    let output = if params.queue_only.unwrap_or(false) {
        let id = store.queue_sync(&PendingOperation::new(SyncOperation::Download, novel_id)).await?;
        tracing::info!(novel_id, queue_id = id, "download queued");
        DownloadNovelOutput { novel_id: novel_id.to_string(), queued_id: Some(id), ..Default::default() }
    } else {
        let report = downloader.download(novel_id).await?;
        DownloadNovelOutput {
            novel_id: report.novel_id,
            queued_id: None,
            chapters_saved: report.chapters_saved,
            chapters_failed: report.chapters_failed,
            cover_cached: report.cover_cached,
        }
    };

    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
