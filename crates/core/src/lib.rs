//! Core types and shared functionality for the novelsa offline layer.
//!
//! This crate provides:
//! - Named, versioned response caches with SQLite backend
//! - The structured offline store for novels, chapters and reading state
//! - HTTP request/response model and the typed API envelope
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod messages;
pub mod migrations;
pub mod store;

pub use cache::{CacheNames, CacheStorage, CachedResponse};
pub use config::{AppConfig, ConfigError};
pub use envelope::ApiEnvelope;
pub use error::Error;
pub use http::{Credentials, Destination, Request, Response};
pub use messages::{ControlMessage, LifecycleEvent, MessagePort, WorkerState};
pub use store::{
    CachedImage, CleanupReport, NovelStatus, OfflineStore, PendingOperation, ReadPosition, StorageInfo, StoredChapter,
    StoredNovel, SyncOperation, SyncQueueEntry, SyncStatus,
};
