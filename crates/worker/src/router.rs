//! Request classification.

use crate::settings::WorkerSettings;
use novelsa_core::{Destination, Request};

/// Which strategy answers a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Not intercepted; the request goes to the network untouched.
    Passthrough,
    Page,
    Api,
    Image,
    Shell,
    External,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Passthrough => "passthrough",
            Route::Page => "page",
            Route::Api => "api",
            Route::Image => "image",
            Route::Shell => "shell",
            Route::External => "external",
        }
    }
}

/// Classify a request. First match wins:
///
/// 1. non-`GET` or non-http(s): passthrough
/// 2. same-origin document navigation: page
/// 3. same-origin path under the API prefix: api
/// 4. image destination, any origin: image
/// 5. same-origin script, style or font: shell
/// 6. everything else: external
pub fn classify(settings: &WorkerSettings, request: &Request) -> Route {
    if !request.is_get() || !matches!(request.url.scheme(), "http" | "https") {
        return Route::Passthrough;
    }

    let same_origin = settings.is_same_origin(&request.url);

    if same_origin && request.destination == Destination::Document {
        Route::Page
    } else if same_origin && settings.is_api_path(request.path()) {
        Route::Api
    } else if request.destination == Destination::Image {
        Route::Image
    } else if same_origin && request.destination.is_shell_asset() {
        Route::Shell
    } else {
        Route::External
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use novelsa_core::AppConfig;
    use url::Url;

    fn settings() -> WorkerSettings {
        WorkerSettings::from_config(&AppConfig::default()).unwrap()
    }

    fn request(url: &str, destination: Destination) -> Request {
        Request::get(Url::parse(url).unwrap()).with_destination(destination)
    }

    #[test]
    fn test_non_get_passes_through() {
        let req = request("http://localhost:3000/api/novels", Destination::Empty).with_method("post");
        assert_eq!(classify(&settings(), &req), Route::Passthrough);
    }

    #[test]
    fn test_non_http_scheme_passes_through() {
        let req = request("chrome-extension://abc/script.js", Destination::Script);
        assert_eq!(classify(&settings(), &req), Route::Passthrough);
    }

    #[test]
    fn test_classification_order() {
        let s = settings();
        assert_eq!(classify(&s, &request("http://localhost:3000/library", Destination::Document)), Route::Page);
        assert_eq!(classify(&s, &request("http://localhost:3000/api/novels", Destination::Document)), Route::Page);
        assert_eq!(classify(&s, &request("http://localhost:3000/api/novels/n1", Destination::Empty)), Route::Api);
        assert_eq!(classify(&s, &request("http://localhost:3000/api/cover.png", Destination::Image)), Route::Api);
        assert_eq!(classify(&s, &request("http://localhost:3000/img/a.png", Destination::Image)), Route::Image);
        assert_eq!(classify(&s, &request("http://localhost:3000/main.js", Destination::Script)), Route::Shell);
        assert_eq!(classify(&s, &request("http://localhost:3000/styles.css", Destination::Style)), Route::Shell);
        assert_eq!(classify(&s, &request("http://localhost:3000/font.woff2", Destination::Font)), Route::Shell);
        assert_eq!(classify(&s, &request("http://localhost:3000/manifest.json", Destination::Empty)), Route::External);
    }

    #[test]
    fn test_cross_origin() {
        let s = settings();
        assert_eq!(classify(&s, &request("https://cdn.example.com/a.png", Destination::Image)), Route::Image);
        assert_eq!(classify(&s, &request("https://cdn.example.com/lib.js", Destination::Script)), Route::External);
        assert_eq!(classify(&s, &request("https://api.example.com/api/x", Destination::Empty)), Route::External);
    }
}
