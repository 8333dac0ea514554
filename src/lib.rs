//! # What is This?
//!
//! `crayon-res` is the asynchronous content pipeline of the crayon framework. It resolves
//! resource identifiers into bytes through pluggable mounts, parses them on background
//! threads with loaders registered by file extension, and hands finished resources back
//! to the owning thread for finalization.
//!
//! Resources that reference other resources (a model and its textures, for example) are
//! gated on their dependencies, and every resource type gets its own thread-safe,
//! de-duplicating cache with eviction support.
//!
//! See the [`res`](res/index.html) module for an overview of the moving parts.

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

pub mod errors;
pub mod res;
pub mod utils;

pub mod prelude {
    pub use crate::errors::{Error, Result};
    pub use crate::res::prelude::*;
}
