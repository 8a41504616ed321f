//! Page-side code for the novelsa offline layer.
//!
//! This crate provides the network seam shared with the interception layer,
//! typed access to the REST API, the offline downloader, and the
//! connectivity/update controller.

pub mod api;
pub mod controller;
pub mod download;
pub mod fetch;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use api::{ApiClient, ChapterDto, NovelDto};
pub use controller::{ConnectivityController, ControllerState, UpdateAction, WorkerStatus};
pub use download::{DownloadReport, NovelDownloader};
pub use fetch::{FetchConfig, Fetcher, HttpFetcher};
