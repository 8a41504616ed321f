//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::context::OfflineContext;
use crate::tools::{
    CleanupParams, ConnectivityParams, DownloadNovelParams, LibrarySearchParams, OfflineFetchParams,
    StorageInfoParams, SyncPendingParams, cleanup_impl, connectivity_impl, download_impl, info_impl,
    library_search_impl, offline_fetch_impl, sync_impl,
};
use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for novelsa-offline.
#[derive(Clone)]
pub struct NovelsaOfflineServer {
    tool_router: ToolRouter<Self>,
    context: Arc<OfflineContext>,
}

/// Tool router implementation using the #[tool_router] macro.
#[tool_router]
impl NovelsaOfflineServer {
    /// Create a new server handler over a started context.
    pub fn new(context: OfflineContext) -> Self {
        Self { tool_router: Self::tool_router(), context: Arc::new(context) }
    }

    /// Route a request through the offline interception layer.
    #[tool(
        description = "Fetch a URL the way the offline-first app would: through the active worker's cache and fallback strategies. Non-GET requests go straight to the network."
    )]
    async fn offline_fetch(&self, params: Parameters<OfflineFetchParams>) -> Result<CallToolResult, McpError> {
        offline_fetch_impl(&self.context, params.0).await
    }

    #[tool(description = "List novels saved for offline reading, optionally filtered by author and genre.")]
    async fn library_search(&self, params: Parameters<LibrarySearchParams>) -> Result<CallToolResult, McpError> {
        library_search_impl(&self.context.store, params.0).await
    }

    #[tool(description = "Report offline storage usage, quota, and novel/chapter counts.")]
    async fn storage_info(&self, params: Parameters<StorageInfoParams>) -> Result<CallToolResult, McpError> {
        info_impl(&self.context.store, params.0).await
    }

    #[tool(description = "Delete offline novels (with their chapters, images, and reading positions) not saved or read within N days.")]
    async fn cleanup_old_data(&self, params: Parameters<CleanupParams>) -> Result<CallToolResult, McpError> {
        cleanup_impl(&self.context.store, self.context.config.cleanup_days, params.0).await
    }

    #[tool(description = "Download a novel and its chapters for offline reading, or queue the download for the next sync.")]
    async fn download_novel(&self, params: Parameters<DownloadNovelParams>) -> Result<CallToolResult, McpError> {
        download_impl(&self.context.store, &self.context.downloader, params.0).await
    }

    #[tool(description = "Process operations queued while offline (downloads, updates, deletions).")]
    async fn sync_pending(&self, params: Parameters<SyncPendingParams>) -> Result<CallToolResult, McpError> {
        sync_impl(&self.context.registration, params.0).await
    }

    #[tool(description = "Show connectivity and worker update state. Optionally set online/offline or apply a waiting update.")]
    async fn connectivity(&self, params: Parameters<ConnectivityParams>) -> Result<CallToolResult, McpError> {
        connectivity_impl(&self.context.controller, params.0).await
    }
}

impl ServerHandler for NovelsaOfflineServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "novelsa-offline".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
