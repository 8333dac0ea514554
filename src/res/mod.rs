//! The resource `Service` provides a standardized interface to load data asynchronously
//! from various storage backends, and to manage the lifetime of the loaded resources.
//!
//! # Uri
//!
//! Every resource is identified by an `Uri` like `schema://path/to/resource.ext`. The
//! schema picks the `Mount` that stores the bytes, and the extension picks the `Loader`
//! that parses them. Resources that are referenced by other resources are usually
//! written relative to their parent and expanded with `Uri::expand`, while resources
//! embedded in a file are named with `Uri::merge`, e.g. `mem://models/crate#mesh0`.
//!
//! # Mount
//!
//! A `Mount` is a storage backend with a pretty simple interface: enumerate, read, write
//! and delete. `MemoryMount` keeps files in memory and `Directory` exposes a directory of
//! the local host filesystem. It should be easy to add backends with features like
//! compression, encryption or loading from web servers.
//!
//! # Loading
//!
//! ```sh
//! Service::load -> Cache::get_or_create -> loader queue -> loader thread
//!     (Mount::read, Loader::load) -> parser queue -> Service::on_tick (finalize)
//! ```
//!
//! `load` never blocks. It returns a `Tracker` immediately, and the first request of a
//! resource queues a load operation that runs on one of the loader threads. Parsed
//! resources are handed back to the owning thread, which finalizes them in `on_tick`
//! once all of their dependencies have finished. Finalization is the only place
//! allowed to mark a resource `Loaded`, so it's safe to postpone thread-unsafe work like
//! uploading to GPU to `Asset::on_create`.
//!
//! Failures never propagate across threads. A resource that could not be found or
//! parsed ends up in the `Failed` state and stays in its cache until it's reloaded,
//! unloaded or pruned. Consumers should check the status before use, and fall back
//! to a placeholder for failed resources.
//!
//! # Ownership & Lifetime
//!
//! Resources are reference-counted with `Tracker`s. Every resource type has its own
//! `Cache`, which keeps the resources alive until they are unloaded or pruned. Pruning
//! evicts the finished resources that nobody else tracks anymore.

pub mod cache;
pub mod loader;
pub mod resource;
pub mod scope;
pub mod service;
pub mod uri;
pub mod vfs;

pub mod prelude {
    pub use super::cache::Cache;
    pub use super::loader::Loader;
    pub use super::resource::{AnyResource, Asset, Resource, Status, Tracker};
    pub use super::scope::Scope;
    pub use super::service::{Service, ServiceShared};
    pub use super::uri::Uri;
    pub use super::vfs::{Directory, Item, ItemKind, MemoryMount, Mount};
    pub use super::ServiceParams;
}

use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Setup parameters of the resource `Service`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceParams {
    /// The number of loader threads.
    pub threads: usize,
    /// The initial memory limit in bytes of every resource cache.
    pub memory_limit: u64,
}

impl Default for ServiceParams {
    fn default() -> Self {
        ServiceParams {
            threads: 2,
            memory_limit: 256 * 1024 * 1024,
        }
    }
}

impl ServiceParams {
    /// Parses parameters from a JSON document. Missing fields keep their defaults.
    pub fn from_json<T: AsRef<str>>(json: T) -> Result<Self> {
        Ok(serde_json::from_str(json.as_ref())?)
    }
}
