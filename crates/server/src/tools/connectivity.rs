//! connectivity tool implementation.
//!
//! Reports connectivity and update state, and lets the host flip the
//! connection or apply a waiting update.

use novelsa_client::{ConnectivityController, ControllerState, UpdateAction};
use novelsa_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the connectivity tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ConnectivityParams {
    /// New connection state. Going back online triggers a sync.
    #[serde(default)]
    pub online: Option<bool>,

    /// Activate a waiting worker version.
    #[serde(default)]
    pub apply_update: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectivityOutput {
    #[serde(flatten)]
    pub state: ControllerState,
    /// Whether the page should reload to pick up a new worker version.
    pub reload: bool,
}

/// Implementation of the connectivity tool.
pub async fn connectivity_impl(
    controller: &ConnectivityController, params: ConnectivityParams,
) -> Result<CallToolResult, McpError> {
    if let Some(online) = params.online {
        controller.set_online(online).await;
    }

    let reload = if params.apply_update.unwrap_or(false) {
        controller.apply_update().await == UpdateAction::Reload
    } else {
        false
    };

    let output = ConnectivityOutput { state: controller.state(), reload };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
