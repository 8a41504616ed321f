//! Named, versioned response caches with SQLite backend.
//!
//! This module is the cache manager of the interception layer. It supports:
//!
//! - Independently named caches (shell, images, API) per layer version
//! - Content-addressed entries keyed by SHA-256 of method and URL
//! - Matching in one named cache or across all of them
//! - Wholesale deletion of stale cache generations on activation
//!
//! Entries are opaque request/response pairs; nothing here knows about
//! novels or chapters.

pub mod connection;
pub mod entries;
pub mod names;

pub use connection::CacheStorage;
pub use entries::{Cache, CachedResponse};
pub use names::CacheNames;
