use std::sync::Arc;

use smallvec::SmallVec;

use super::resource::{Asset, AnyResource, Resource, Tracker};
use super::uri::Uri;

/// A `Scope` tracks one in-flight load operation: the resource being loaded and the
/// resources it depends on.
///
/// It's created when the resource gets queued and dropped once `poll` reports that the
/// resource, and everything it depends on, is ready. Loaders receive the scope of the
/// resource they are parsing, and must `mark` the child resources they request.
pub struct Scope {
    target: Arc<dyn AnyResource>,
    dependencies: SmallVec<[Arc<dyn AnyResource>; 4]>,
    parsed: bool,
}

impl Scope {
    pub fn new(target: Arc<dyn AnyResource>) -> Self {
        Scope {
            target,
            dependencies: SmallVec::new(),
            parsed: false,
        }
    }

    /// The key of the resource being loaded.
    #[inline]
    pub fn key(&self) -> &Uri {
        self.target.key()
    }

    #[inline]
    pub fn target(&self) -> &Arc<dyn AnyResource> {
        &self.target
    }

    /// Gets the resource being loaded as `Tracker<T>`. Returns `None` if it's not a
    /// `Resource<T>`.
    pub fn target_as<T: Asset>(&self) -> Option<Tracker<T>> {
        self.target.clone().into_any().downcast::<Resource<T>>().ok()
    }

    /// Records a resource that must finish before the target could be finalized.
    pub fn mark(&mut self, dependency: Arc<dyn AnyResource>) {
        self.dependencies.push(dependency);
    }

    #[inline]
    pub fn dependencies(&self) -> &[Arc<dyn AnyResource>] {
        &self.dependencies
    }

    /// Returns true once the target has been parsed (or finished otherwise), and every
    /// marked dependency has finished. Never blocks.
    pub fn poll(&self) -> bool {
        (self.parsed || self.target.has_finished())
            && self.dependencies.iter().all(|v| v.has_finished())
    }

    #[inline]
    pub(crate) fn set_parsed(&mut self) {
        self.parsed = true;
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("target", self.target.key())
            .field("dependencies", &self.dependencies.len())
            .field("parsed", &self.parsed)
            .finish()
    }
}
