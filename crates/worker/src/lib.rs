//! The request interception layer of the novelsa offline cache.
//!
//! A [`Registration`] holds the installed [`OfflineWorker`] versions. The
//! active worker classifies each intercepted request with [`router::classify`]
//! and answers it with one of five fetch strategies, falling back from the
//! network to the named caches, the structured offline store and finally a
//! static response.

pub mod fallback;
pub mod lifecycle;
pub mod registration;
pub mod router;
pub mod routes;
pub mod settings;
pub mod strategies;
pub mod sync;
pub mod worker;

pub use lifecycle::InstallReport;
pub use registration::Registration;
pub use router::{Route, classify};
pub use routes::{NovelResource, OfflineRoutes};
pub use settings::WorkerSettings;
pub use strategies::{FetchStrategy, Services};
pub use sync::{SyncProcessor, SyncReport};
pub use worker::OfflineWorker;
