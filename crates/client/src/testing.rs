//! Scripted [`Fetcher`] for exercising offline behavior without a network.

use crate::fetch::Fetcher;
use async_trait::async_trait;
use novelsa_core::{Credentials, Error, Request, Response};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// What the fake network does for one URL.
#[derive(Debug, Clone)]
pub enum Scripted {
    Respond(Response),
    /// Respond after a delay.
    Delay(Duration, Response),
    /// Transport failure with this message.
    Fail(String),
    /// Never resolve.
    Hang,
}

/// A fake network keyed by absolute URL.
///
/// Unscripted URLs fail as if the connection was refused. Every call is
/// recorded with the credentials mode it was made with.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    routes: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<Vec<(String, Credentials)>>,
    offline: AtomicBool,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, url: &str, scripted: Scripted) -> &Self {
        if let Ok(mut routes) = self.routes.lock() {
            routes.insert(url.to_string(), scripted);
        }
        self
    }

    pub fn respond(&self, url: &str, response: Response) -> &Self {
        self.on(url, Scripted::Respond(response))
    }

    pub fn respond_json(&self, url: &str, status: u16, body: serde_json::Value) -> &Self {
        self.respond(url, Response::json(status, &body))
    }

    /// Make every request fail regardless of its script.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// URLs requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.iter().map(|(url, _)| url.clone()).collect())
            .unwrap_or_default()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls().iter().filter(|u| u.as_str() == url).count()
    }

    /// Credentials mode of the most recent request to `url`.
    pub fn credentials_for(&self, url: &str) -> Option<Credentials> {
        self.calls
            .lock()
            .ok()?
            .iter()
            .rev()
            .find(|(u, _)| u == url)
            .map(|(_, c)| *c)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &Request, credentials: Credentials) -> Result<Response, Error> {
        let mut url = request.url.clone();
        url.set_fragment(None);
        let key = url.to_string();

        if let Ok(mut calls) = self.calls.lock() {
            calls.push((key.clone(), credentials));
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::HttpError(format!("network error: offline ({key})")));
        }

        let scripted = self.routes.lock().ok().and_then(|routes| routes.get(&key).cloned());
        match scripted {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Delay(delay, response)) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            Some(Scripted::Fail(message)) => Err(Error::HttpError(message)),
            Some(Scripted::Hang) => std::future::pending().await,
            None => Err(Error::HttpError(format!("network error: connection refused ({key})"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[tokio::test]
    async fn test_scripted_and_unscripted() {
        let fetcher = ScriptedFetcher::new();
        fetcher.respond("http://localhost:3000/a", Response::text(200, "hello"));

        let hit = Request::get(Url::parse("http://localhost:3000/a#frag").unwrap());
        let response = fetcher.fetch(&hit, Credentials::Include).await.unwrap();
        assert_eq!(&response.body[..], b"hello");

        let miss = Request::get(Url::parse("http://localhost:3000/b").unwrap());
        assert!(fetcher.fetch(&miss, Credentials::Omit).await.is_err());

        assert_eq!(fetcher.calls().len(), 2);
        assert_eq!(fetcher.credentials_for("http://localhost:3000/a"), Some(Credentials::Include));
    }

    #[tokio::test]
    async fn test_offline_overrides_script() {
        let fetcher = ScriptedFetcher::new();
        fetcher.respond("http://localhost:3000/a", Response::text(200, "hello"));
        fetcher.set_offline(true);

        let request = Request::get(Url::parse("http://localhost:3000/a").unwrap());
        assert!(fetcher.fetch(&request, Credentials::SameOrigin).await.is_err());
        assert_eq!(fetcher.call_count("http://localhost:3000/a"), 1);
    }
}
