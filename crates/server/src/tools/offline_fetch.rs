//! offline_fetch tool implementation.
//!
//! Sends one request through the active worker, the way the page would see it.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use novelsa_client::Fetcher;
use novelsa_client::fetch::resolve;
use novelsa_core::{Credentials, Destination, Error, Request, Response};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::context::OfflineContext;

/// Parameters for the offline_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OfflineFetchParams {
    /// Absolute URL, or a path relative to the app origin.
    pub url: String,

    /// Request destination (document, image, script, style, font, empty).
    #[serde(default)]
    pub destination: Option<Destination>,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,
}

/// Output from the offline_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OfflineFetchOutput {
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    /// `utf8` or `base64`.
    pub body_encoding: String,
    pub body: String,
    /// False when the worker let the request go to the network untouched.
    pub intercepted: bool,
}

/// Implementation of the offline_fetch tool.
pub async fn offline_fetch_impl(ctx: &OfflineContext, params: OfflineFetchParams) -> Result<CallToolResult, McpError> {
    let origin = ctx.config.origin_url().map_err(|e| Error::InvalidInput(e.to_string()))?;
    let url = resolve(&origin, &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

    let mut request = Request::get(url).with_destination(params.destination.unwrap_or_default());
    if let Some(method) = params.method.filter(|m| !m.trim().is_empty()) {
        request = request.with_method(method.trim().to_ascii_uppercase());
    }

    let (response, intercepted) = match ctx.registration.handle(&request).await {
        Some(response) => (response, true),
        None => (ctx.fetcher.fetch(&request, Credentials::SameOrigin).await?, false),
    };

    let output = to_output(&request, response, intercepted);
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn to_output(request: &Request, response: Response, intercepted: bool) -> OfflineFetchOutput {
    let (body_encoding, body) = match std::str::from_utf8(&response.body) {
        Ok(text) => ("utf8", text.to_string()),
        Err(_) => ("base64", STANDARD.encode(&response.body)),
    };

    OfflineFetchOutput {
        url: request.url.to_string(),
        status: response.status,
        status_text: response.status_text,
        headers: response.headers,
        body_encoding: body_encoding.to_string(),
        body,
        intercepted,
    }
}
