//! Loadable resources and their lifecycle status.
//!
//! A resource moves through a tiny state machine:
//!
//! ```sh
//! Idle -> Queued -> { Loaded, Failed }
//!   ^                     |
//!   +------ reload -------+
//! ```
//!
//! `Idle -> Queued` is a compare-and-swap, which is the single point that guarantees at
//! most one in-flight load per resource. Loader threads may only fail a resource; the
//! `Loaded` transition is reserved to the owning thread.

use std::any::Any;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::uri::Uri;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Idle = 0,
    Queued = 1,
    Loaded = 2,
    Failed = 3,
}

impl Status {
    #[inline]
    fn from_u8(v: u8) -> Status {
        match v {
            0 => Status::Idle,
            1 => Status::Queued,
            2 => Status::Loaded,
            _ => Status::Failed,
        }
    }

    /// Returns true for the terminal states.
    #[inline]
    pub fn is_finished(self) -> bool {
        self == Status::Loaded || self == Status::Failed
    }
}

/// The payload of a resource type. It's default-constructed when the resource enters
/// its cache, and populated by a `Loader` on a loader thread.
pub trait Asset: Default + Send + Sync + 'static {
    /// Invoked on the owning thread once this asset and all its dependencies have
    /// finished loading. Thread-unsafe work (e.g. uploading to GPU) belongs here.
    fn on_create(&mut self) {}

    /// Invoked on the owning thread after this asset has been removed from its cache.
    fn on_delete(&mut self) {}
}

/// Shared ownership handle of a resource.
pub type Tracker<T> = Arc<Resource<T>>;

/// A loadable, cacheable unit of content with a lifecycle status.
pub struct Resource<T: Asset> {
    key: Uri,
    status: AtomicU8,
    value: RwLock<T>,
}

impl<T: Asset> Resource<T> {
    pub fn new<U: Into<Uri>>(key: U) -> Self {
        Resource {
            key: key.into(),
            status: AtomicU8::new(Status::Idle as u8),
            value: RwLock::new(T::default()),
        }
    }

    #[inline]
    pub fn key(&self) -> &Uri {
        &self.key
    }

    #[inline]
    pub fn status(&self) -> Status {
        Status::from_u8(self.status.load(Ordering::Acquire))
    }

    #[inline]
    pub fn has_finished(&self) -> bool {
        self.status().is_finished()
    }

    /// Locks the payload for reading. Consumers should check `status` before treating
    /// the payload as ready.
    ///
    /// A loader that panicked while holding the payload leaves it poisoned. The lock is
    /// recovered here, the resource itself has been marked `Failed` already.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<T> {
        self.value.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the payload for writing.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<T> {
        self.value.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    pub(crate) fn transition(&self, from: Status, to: Status) -> bool {
        self.status
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    #[inline]
    pub(crate) fn set_status(&self, status: Status) {
        self.status.store(status as u8, Ordering::Release);
    }

    /// Moves a finished resource back to `Idle`. Returns false if it's still in flight
    /// or someone else reset it first.
    pub(crate) fn reset(&self) -> bool {
        let status = self.status();
        status.is_finished() && self.transition(status, Status::Idle)
    }
}

impl<T: Asset + std::fmt::Debug> std::fmt::Debug for Resource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("key", &self.key)
            .field("status", &self.status())
            .finish()
    }
}

mod private {
    pub trait Sealed {}
}

impl<T: Asset> private::Sealed for Resource<T> {}

/// Type-erased view of a `Resource<T>`, which is what scopes keep track of.
pub trait AnyResource: private::Sealed + Send + Sync + 'static {
    fn key(&self) -> &Uri;

    fn status(&self) -> Status;

    fn has_finished(&self) -> bool {
        self.status().is_finished()
    }

    /// Converts into `Arc<dyn Any>` so it could be downcasted into `Tracker<T>`.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    #[doc(hidden)]
    fn transition(&self, from: Status, to: Status) -> bool;

    #[doc(hidden)]
    fn set_status(&self, status: Status);

    #[doc(hidden)]
    fn on_create(&self);

    #[doc(hidden)]
    fn on_delete(&self);
}

impl<T: Asset> AnyResource for Resource<T> {
    #[inline]
    fn key(&self) -> &Uri {
        Resource::key(self)
    }

    #[inline]
    fn status(&self) -> Status {
        Resource::status(self)
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    #[inline]
    fn transition(&self, from: Status, to: Status) -> bool {
        Resource::transition(self, from, to)
    }

    #[inline]
    fn set_status(&self, status: Status) {
        Resource::set_status(self, status)
    }

    fn on_create(&self) {
        self.write().on_create();
    }

    fn on_delete(&self) {
        self.write().on_delete();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Default)]
    struct Blob(Vec<u8>);

    impl Asset for Blob {}

    #[test]
    fn queue_only_once() {
        let resource = Resource::<Blob>::new("mem://a.bin");
        assert_eq!(resource.status(), Status::Idle);
        assert!(resource.transition(Status::Idle, Status::Queued));
        assert!(!resource.transition(Status::Idle, Status::Queued));
        assert_eq!(resource.status(), Status::Queued);
        assert!(!resource.has_finished());
    }

    #[test]
    fn reset_requires_terminal_state() {
        let resource = Resource::<Blob>::new("mem://a.bin");
        assert!(!resource.reset());

        resource.set_status(Status::Queued);
        assert!(!resource.reset());
        assert_eq!(resource.status(), Status::Queued);

        resource.set_status(Status::Failed);
        assert!(resource.has_finished());
        assert!(resource.reset());
        assert_eq!(resource.status(), Status::Idle);

        resource.set_status(Status::Loaded);
        assert!(resource.reset());
    }

    #[test]
    fn poisoned_payload() {
        let resource: Tracker<Blob> = Arc::new(Resource::new("mem://a.bin"));

        let cloned = resource.clone();
        let result = std::thread::spawn(move || {
            let mut blob = cloned.write();
            blob.0.push(1);
            panic!("malformed");
        })
        .join();

        assert!(result.is_err());
        assert_eq!(resource.read().0, vec![1]);

        resource.write().0.clear();
        AnyResource::on_delete(&*resource);
        assert!(resource.read().0.is_empty());
    }

    #[test]
    fn downcast() {
        let resource: Tracker<Blob> = Arc::new(Resource::new("mem://a.bin"));
        resource.write().0.push(1);

        let erased: Arc<dyn AnyResource> = resource.clone();
        assert_eq!(erased.key().url(), "mem://a.bin");

        let typed = erased.into_any().downcast::<Resource<Blob>>().ok().unwrap();
        assert!(Arc::ptr_eq(&typed, &resource));
        assert_eq!(typed.read().0, vec![1]);
    }
}
