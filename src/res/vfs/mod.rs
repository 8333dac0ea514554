//! Storage backends bound to URI schemas.

pub mod dir;
pub use self::dir::Directory;

pub mod memory;
pub use self::memory::MemoryMount;

use serde::{Deserialize, Serialize};

use crate::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    File,
    Directory,
}

/// A entry listed by `Mount::enumerate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub kind: ItemKind,
    /// Size in bytes, zero for directories.
    pub size: u64,
    /// Last modification time in seconds since UNIX epoch.
    pub mtime: u64,
}

/// A storage backend that could be mounted with a schema. Paths are the `path` part of
/// an URI, everything after `schema://`.
///
/// Mounts are shared with the loader threads, so every operation might be invoked
/// concurrently.
pub trait Mount: Send + Sync + 'static {
    /// Lists the entries directly under `path`.
    fn enumerate(&self, path: &str) -> Vec<Item>;

    /// Reads the whole file at `path`. An empty buffer means the file does not exist.
    fn read(&self, path: &str) -> Vec<u8>;

    /// Creates or replaces the file at `path`.
    fn write(&self, path: &str, bytes: &[u8]) -> Result<()>;

    /// Deletes the file or directory at `path`.
    fn delete(&self, path: &str) -> Result<()>;
}
