//! sync_pending tool implementation.
//!
//! Runs the deferred-operation queue on the active worker.

use novelsa_core::Error;
use novelsa_worker::Registration;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the sync_pending tool (none).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SyncPendingParams {}

/// Implementation of the sync_pending tool.
pub async fn sync_impl(registration: &Registration, _params: SyncPendingParams) -> Result<CallToolResult, McpError> {
    let report = registration.sync_pending().await?;
    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::context;
    use novelsa_core::{PendingOperation, StoredNovel, SyncOperation};

    #[tokio::test]
    async fn test_sync_runs_queue() {
        let (ctx, _) = context().await;
        ctx.store.save_novel(&StoredNovel::new("n1", "Gone", "Mai")).await.unwrap();
        ctx.store.queue_sync(&PendingOperation::new(SyncOperation::Delete, "n1")).await.unwrap();

        let result = sync_impl(&ctx.registration, SyncPendingParams::default()).await.unwrap();
        let text = result.content[0].as_text().unwrap().text.clone();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["completed"], 1);
        assert!(ctx.store.get_novel("n1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_no_active_worker() {
        let registration = Registration::new();
        assert!(sync_impl(&registration, SyncPendingParams::default()).await.is_err());
    }
}
