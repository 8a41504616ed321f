//! MCP tool implementations.
//!
//! This module contains all tools exposed by the novelsa-offline server.

pub mod connectivity;
pub mod download_novel;
pub mod library_search;
pub mod offline_fetch;
pub mod storage;
pub mod sync_pending;

pub use connectivity::{ConnectivityParams, connectivity_impl};
pub use download_novel::{DownloadNovelParams, download_impl};
pub use library_search::{LibrarySearchParams, library_search_impl};
pub use offline_fetch::{OfflineFetchParams, offline_fetch_impl};
pub use storage::{CleanupParams, StorageInfoParams, cleanup_impl, info_impl};
pub use sync_pending::{SyncPendingParams, sync_impl};
