//! library_search tool implementation.
//!
//! Lists novels saved for offline reading, optionally filtered.

use novelsa_core::{Error, OfflineStore, StoredNovel};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the library_search tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct LibrarySearchParams {
    /// Exact author label to match.
    #[serde(default)]
    pub author: Option<String>,

    /// Exact genre to match.
    #[serde(default)]
    pub genre: Option<String>,
}

/// Output from the library_search tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LibrarySearchOutput {
    pub count: usize,
    pub novels: Vec<StoredNovel>,
}

/// Implementation of the library_search tool.
pub async fn library_search_impl(store: &OfflineStore, params: LibrarySearchParams) -> Result<CallToolResult, McpError> {
    let author = params.author.as_deref().filter(|a| !a.is_empty());
    let genre = params.genre.as_deref().filter(|g| !g.is_empty());
    let novels = store.search_novels(author, genre).await?;

    let output = LibrarySearchOutput { count: novels.len(), novels };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
