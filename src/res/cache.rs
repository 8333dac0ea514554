//! # Cache
//!
//! The `Cache` is a thread-safe registry of all the resources of one type, indexed by
//! their absolute URIs.
//!
//! ## De-duplication
//!
//! There is at most one resource for every URI. Concurrent requests of the same URI
//! converge on the same `Tracker`, and since only the first request could move the
//! resource out of `Idle`, on the same load operation.
//!
//! ## Ownership & Lifetime
//!
//! Resources are reference-counted. The cache keeps one reference of its own, a
//! resource is said to be _tracked_ as long as someone else holds another one. Entries
//! could only leave the cache after they finished loading, so nothing is ever evicted
//! while a loader thread is working on it.
//!
//! ## Memory Budget
//!
//! The cache only does the bookkeeping of memory limit and usage. It's up to loaders and
//! the owner of the cache to consult the numbers, and to prune when needed.

use std::sync::{Arc, Mutex};

use crate::utils::prelude::FastHashMap;

use super::resource::{Asset, Resource, Tracker};
use super::uri::Uri;

/// Returns true if someone besides the cache holds `resource`.
#[inline]
fn tracked<T: Asset>(resource: &Tracker<T>) -> bool {
    Arc::strong_count(resource) > 1
}

pub struct Cache<T: Asset> {
    payload: Mutex<Payload<T>>,
}

struct Payload<T: Asset> {
    items: FastHashMap<Uri, Tracker<T>>,
    memory_limit: u64,
    memory_usage: u64,
}

impl<T: Asset> Cache<T> {
    /// Creates a new and empty `Cache` with memory limit in bytes.
    pub fn new(memory_limit: u64) -> Self {
        let payload = Payload {
            items: FastHashMap::default(),
            memory_limit,
            memory_usage: 0,
        };

        Cache {
            payload: Mutex::new(payload),
        }
    }

    /// Gets the resource associated with `key`. If there is none and `create_if_needed`
    /// is set, a new `Idle` resource is inserted and returned.
    pub fn get_or_create(&self, key: &Uri, create_if_needed: bool) -> Option<Tracker<T>> {
        if create_if_needed {
            Some(self.get_or_insert(key))
        } else {
            self.payload.lock().unwrap().items.get(key.url()).cloned()
        }
    }

    pub(crate) fn get_or_insert(&self, key: &Uri) -> Tracker<T> {
        let mut payload = self.payload.lock().unwrap();

        if let Some(v) = payload.items.get(key.url()) {
            return v.clone();
        }

        let resource = Arc::new(Resource::new(key.clone()));
        payload
            .items
            .insert(resource.key().clone(), resource.clone());
        resource
    }

    /// Removes the resource associated with `key` if it has finished loading. Returns
    /// false if there is no such entry or it is still in flight.
    pub fn remove(&self, key: &Uri) -> bool {
        let mut payload = self.payload.lock().unwrap();

        let finished = payload
            .items
            .get(key.url())
            .map(|v| v.has_finished())
            .unwrap_or(false);

        if finished {
            payload.items.remove(key.url());
        }

        finished
    }

    /// Evicts every finished resource that is not tracked anymore, or every finished
    /// resource if `force` is set. `on_evict` is invoked before each removal.
    ///
    /// Returns the number of evicted resources.
    pub fn prune<F>(&self, force: bool, mut on_evict: F) -> usize
    where
        F: FnMut(&Tracker<T>),
    {
        let mut payload = self.payload.lock().unwrap();
        let len = payload.items.len();

        payload.items.retain(|_, v| {
            let evict = v.has_finished() && (force || !tracked(v));
            if evict {
                on_evict(v);
            }

            !evict
        });

        len - payload.items.len()
    }

    /// Returns true if someone besides this cache holds the resource of `key`.
    pub fn is_tracked(&self, key: &Uri) -> bool {
        self.payload
            .lock()
            .unwrap()
            .items
            .get(key.url())
            .map(tracked)
            .unwrap_or(false)
    }

    #[inline]
    pub fn contains(&self, key: &Uri) -> bool {
        self.payload.lock().unwrap().items.contains_key(key.url())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.payload.lock().unwrap().items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn set_memory_limit(&self, bytes: u64) {
        self.payload.lock().unwrap().memory_limit = bytes;
    }

    #[inline]
    pub fn memory_limit(&self) -> u64 {
        self.payload.lock().unwrap().memory_limit
    }

    #[inline]
    pub fn set_memory_usage(&self, bytes: u64) {
        self.payload.lock().unwrap().memory_usage = bytes;
    }

    #[inline]
    pub fn memory_usage(&self) -> u64 {
        self.payload.lock().unwrap().memory_usage
    }
}
