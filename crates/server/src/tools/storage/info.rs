//! storage_info tool implementation.

use novelsa_core::{Error, OfflineStore};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the storage_info tool (none).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct StorageInfoParams {}

/// Implementation of the storage_info tool.
pub async fn info_impl(store: &OfflineStore, _params: StorageInfoParams) -> Result<CallToolResult, McpError> {
    let info = store.get_storage_info().await?;
    let json = serde_json::to_string_pretty(&info)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
