//! Static responses used when every other tier has failed.

use novelsa_core::Response;
use serde_json::json;

/// Transparent 1x1 PNG.
pub const PLACEHOLDER_PNG: [u8; 67] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, 0x00, 0x00, 0x00,
    0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49,
    0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00,
    0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

const OFFLINE_PAGE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Offline</title>
  <style>
    * { margin: 0; padding: 0; }
    body {
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
      background: #0f172a;
      color: #fff;
      display: flex;
      align-items: center;
      justify-content: center;
      height: 100vh;
    }
    .container { text-align: center; max-width: 400px; padding: 20px; }
    h1 { font-size: 32px; margin-bottom: 16px; }
    p { color: #cbd5e1; line-height: 1.6; margin-bottom: 24px; }
    a {
      display: inline-block;
      background: #f59e0b;
      color: #0f172a;
      padding: 12px 24px;
      border-radius: 6px;
      text-decoration: none;
      font-weight: 600;
    }
  </style>
</head>
<body>
  <div class="container">
    <h1>You are offline</h1>
    <p>This page needs an internet connection.</p>
    <p>Novels you downloaded are still available to read.</p>
    <a href="/offline-library">Go to the offline library</a>
  </div>
</body>
</html>
"#;

/// The offline document stored at install time.
pub fn offline_page() -> Response {
    Response::new(200, OFFLINE_PAGE_HTML).with_header("Content-Type", "text/html; charset=utf-8")
}

/// Last resort for navigations when not even the offline document is cached.
pub fn page_unavailable() -> Response {
    Response::text(503, "Offline - Offline page not cached")
}

/// Structured API miss with the `offline` marker.
pub fn api_offline() -> Response {
    Response::json(503, &json!({ "error": "Offline - No cached data available", "offline": true }))
}

pub fn placeholder_image() -> Response {
    Response::new(200, PLACEHOLDER_PNG.to_vec()).with_header("Content-Type", "image/png")
}

pub fn shell_not_found() -> Response {
    Response::text(404, "Not found")
}

pub fn external_offline() -> Response {
    Response::text(503, "Offline")
}
