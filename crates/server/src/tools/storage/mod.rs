//! Storage accounting tools for the offline store.

pub mod cleanup;
pub mod info;

pub use cleanup::{CleanupParams, cleanup_impl};
pub use info::{StorageInfoParams, info_impl};
