//! cleanup_old_data tool implementation.
//!
//! Removes novels that have not been saved or read within the given window.

use novelsa_core::{Error, OfflineStore};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the cleanup_old_data tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CleanupParams {
    /// Remove novels saved more than this many days ago (default from config).
    #[serde(default)]
    pub days: Option<u32>,
}

/// Implementation of the cleanup_old_data tool.
pub async fn cleanup_impl(
    store: &OfflineStore, default_days: u32, params: CleanupParams,
) -> Result<CallToolResult, McpError> {
    let days = params.days.unwrap_or(default_days);
    if days == 0 {
        return Err(Error::InvalidInput("days must be at least 1".to_string()).into());
    }

    let report = store.cleanup_old_data(days).await?;
    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_zero_days() {
        let store = OfflineStore::open_in_memory().await.unwrap();
        assert!(cleanup_impl(&store, 30, CleanupParams { days: Some(0) }).await.is_err());
    }

    #[tokio::test]
    async fn test_uses_default_days() {
        let store = OfflineStore::open_in_memory().await.unwrap();
        let result = cleanup_impl(&store, 30, CleanupParams::default()).await.unwrap();
        let text = result.content[0].as_text().unwrap().text.clone();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["novelsRemoved"], 0);
    }
}
