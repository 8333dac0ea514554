use std::any::{Any, TypeId};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, RwLock};
use std::thread;

use inlinable_string::InlinableString;

use crate::errors::{Error, Result};
use crate::utils::prelude::FastHashMap;

use super::cache::Cache;
use super::loader::Loader;
use super::resource::{AnyResource, Asset, Status, Tracker};
use super::scope::Scope;
use super::uri::Uri;
use super::vfs::{Item, Mount};
use super::ServiceParams;

/// The `Service` takes care of loading resources asynchronously through pluggable
/// mounts and loaders.
///
/// It owns the loader threads and must stay on the owning thread, which drives the
/// finalization of resources with `on_tick`. The thread-safe parts are exposed as
/// `ServiceShared`, which this type dereferences to.
pub struct Service {
    shared: Arc<ServiceShared>,
    threads: Vec<thread::JoinHandle<()>>,
}

impl Service {
    /// Creates a new `Service` and spawns its loader threads.
    pub fn new(params: ServiceParams) -> Result<Self> {
        if params.threads == 0 {
            bail!("Resource service requires at least one loader thread.");
        }

        let mut service = Service {
            shared: Arc::new(ServiceShared::new(&params)),
            threads: Vec::with_capacity(params.threads),
        };

        for i in 0..params.threads {
            let shared = service.shared.clone();
            let handle = thread::Builder::new()
                .name(format!("crayon-res-loader-{}", i))
                .spawn(move || shared.on_loader_thread())?;

            service.threads.push(handle);
        }

        info!(
            "Creates resource service with {} loader threads.",
            params.threads
        );

        Ok(service)
    }

    /// Returns the multi-thread friendly parts of `Service`.
    #[inline]
    pub fn shared(&self) -> Arc<ServiceShared> {
        self.shared.clone()
    }

    /// Mounts a storage backend with `schema`.
    ///
    /// Mounts and loaders are meant to be registered during setup. Loader threads look
    /// them up for every request, so changing them while loads are in flight affects
    /// those loads.
    pub fn add_mount<T, M>(&mut self, schema: T, mount: M) -> Result<()>
    where
        T: AsRef<str>,
        M: Mount,
    {
        let schema = schema.as_ref();
        let mut mounts = self.shared.mounts.write().unwrap();

        if mounts.contains_key(schema) {
            bail!("Schema '{}' has been mounted already.", schema);
        }

        info!("Mounts schema {}://.", schema);
        mounts.insert(schema.into(), Arc::new(mount));
        Ok(())
    }

    pub fn remove_mount<T: AsRef<str>>(&mut self, schema: T) -> bool {
        let schema = schema.as_ref();
        let removed = self.shared.mounts.write().unwrap().remove(schema).is_some();
        if removed {
            info!("Unmounts schema {}://.", schema);
        }

        removed
    }

    /// Registers `loader` for all of its extensions.
    pub fn add_loader<L: Loader>(&mut self, loader: L) -> Result<()> {
        let loader = Arc::new(loader);
        let extensions: Vec<String> = loader
            .extensions()
            .iter()
            .map(|v| v.to_ascii_lowercase())
            .collect();

        let mut loaders = self.shared.loaders.write().unwrap();
        for v in &extensions {
            if loaders.contains_key(v.as_str()) {
                bail!("Loader of extension '{}' has been registered already.", v);
            }
        }

        for v in extensions {
            info!("Registers loader of extension '{}'.", v);
            loaders.insert(v.as_str().into(), loader.clone());
        }

        Ok(())
    }

    pub fn remove_loader<T: AsRef<str>>(&mut self, extension: T) -> bool {
        let extension = extension.as_ref().to_ascii_lowercase();
        self.shared
            .loaders
            .write()
            .unwrap()
            .remove(extension.as_str())
            .is_some()
    }

    /// Finalizes every parsed resource whose dependencies have finished, and returns
    /// how many of them have been finalized. The others are left for the next tick.
    ///
    /// Unlike a frame callback, this takes no elapsed time. Nothing in the pipeline
    /// depends on time, so callers simply tick once per frame or poll loop.
    pub fn on_tick(&mut self) -> usize {
        let ready = {
            let mut parsers = self.shared.parser_queue.lock().unwrap();
            let mut ready = Vec::new();

            let mut i = 0;
            while i < parsers.len() {
                if parsers[i].poll() {
                    ready.push(parsers.swap_remove(i));
                } else {
                    i += 1;
                }
            }

            ready
        };

        let num = ready.len();
        for scope in ready {
            self.shared.on_asset_create(scope);
        }

        num
    }

    /// Removes `asset` from its cache and tears it down. Does nothing if `asset` is still
    /// in flight, or is not the cached resource of its key anymore.
    pub fn unload<T: Asset>(&mut self, asset: &Tracker<T>) -> bool {
        let cache = self.shared.cache::<T>();

        let cached = cache
            .get_or_create(asset.key(), false)
            .map(|v| Arc::ptr_eq(&v, asset))
            .unwrap_or(false);

        if !cached || !cache.remove(asset.key()) {
            return false;
        }

        self.shared.on_asset_delete(&**asset);
        true
    }

    /// Evicts finished resources of type `T` that nobody tracks anymore, or every
    /// finished resource if `force` is set. Returns the number of evicted resources.
    pub fn prune<T: Asset>(&mut self, force: bool) -> usize {
        let mut evicted = Vec::new();
        let num = self
            .shared
            .cache::<T>()
            .prune(force, |v| evicted.push(v.clone()));

        for v in evicted {
            self.shared.on_asset_delete(&*v);
        }

        num
    }

    /// Stops the loader threads and blocks until all of them exit. Parses in progress
    /// run to completion and could still be finalized with `on_tick`. Queued requests,
    /// and every request made after teardown, end up `Failed`.
    pub fn on_teardown(&mut self) {
        if self.threads.is_empty() {
            return;
        }

        let abandoned = {
            let mut queue = self.shared.loader_queue.lock().unwrap();
            self.shared.stop.store(true, Ordering::Release);
            queue.drain(..).collect::<Vec<_>>()
        };

        for scope in abandoned {
            scope.target().set_status(Status::Failed);
            drop(scope);
            self.shared.in_flight.fetch_sub(1, Ordering::AcqRel);
        }

        self.shared.loader_signal.notify_all();

        for v in self.threads.drain(..) {
            if v.join().is_err() {
                warn!("Loader thread exits with panic.");
            }
        }

        info!("Resource service has been torn down.");
    }
}

impl Drop for Service {
    fn drop(&mut self) {
        self.on_teardown();
    }
}

impl std::ops::Deref for Service {
    type Target = ServiceShared;

    fn deref(&self) -> &Self::Target {
        &self.shared
    }
}

/// The thread-safe parts of `Service`, shared with loader threads and loaders.
pub struct ServiceShared {
    mounts: RwLock<FastHashMap<InlinableString, Arc<dyn Mount>>>,
    loaders: RwLock<FastHashMap<InlinableString, Arc<dyn Loader>>>,
    caches: RwLock<FastHashMap<TypeId, Arc<dyn Any + Send + Sync>>>,

    loader_queue: Mutex<Vec<Scope>>,
    loader_signal: Condvar,
    parser_queue: Mutex<Vec<Scope>>,

    stop: AtomicBool,
    in_flight: AtomicUsize,
    memory_limit: u64,
}

impl ServiceShared {
    fn new(params: &ServiceParams) -> Self {
        ServiceShared {
            mounts: RwLock::new(FastHashMap::default()),
            loaders: RwLock::new(FastHashMap::default()),
            caches: RwLock::new(FastHashMap::default()),
            loader_queue: Mutex::new(Vec::new()),
            loader_signal: Condvar::new(),
            parser_queue: Mutex::new(Vec::new()),
            stop: AtomicBool::new(false),
            in_flight: AtomicUsize::new(0),
            memory_limit: params.memory_limit,
        }
    }

    /// Gets the cache of resource type `T`, creating it on first use.
    pub fn cache<T: Asset>(&self) -> Arc<Cache<T>> {
        let id = TypeId::of::<T>();

        let cache = self.caches.read().unwrap().get(&id).cloned();
        let cache = match cache {
            Some(v) => v,
            None => self
                .caches
                .write()
                .unwrap()
                .entry(id)
                .or_insert_with(|| -> Arc<dyn Any + Send + Sync> {
                    Arc::new(Cache::<T>::new(self.memory_limit))
                })
                .clone(),
        };

        match cache.downcast::<Cache<T>>() {
            Ok(v) => v,
            Err(_) => unreachable!(),
        }
    }

    /// Loads a resource asynchronously. This method never blocks; it returns the cached
    /// resource immediately, which might still be in flight.
    ///
    /// With a `parent` scope, `key` is resolved relative to the parent resource, and the
    /// parent will not be finalized before this resource finishes.
    ///
    /// Requests made after `Service::on_teardown` fail immediately.
    pub fn load<T, U>(&self, key: U, parent: Option<&mut Scope>) -> Tracker<T>
    where
        T: Asset,
        U: Into<Uri>,
    {
        let mut key = key.into();
        if let Some(ref scope) = parent {
            key = Uri::expand(&key, scope.key());
        }

        let asset = self.cache::<T>().get_or_insert(&key);
        self.on_asset_load(asset.clone(), parent);
        asset
    }

    /// Reloads a finished resource in place. All the holders keep their handles. Does
    /// nothing if `asset` is still in flight.
    pub fn reload<T: Asset>(&self, asset: &Tracker<T>) -> bool {
        if !asset.reset() {
            return false;
        }

        debug!("Reloads {}.", asset.key());
        self.on_asset_load(asset.clone(), None);
        true
    }

    /// Returns the number of resources that have been queued but not finished yet.
    #[inline]
    pub fn pending(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Reads the file at `uri` synchronously. An empty buffer is returned if the file or
    /// its mount does not exist.
    pub fn find(&self, uri: &Uri) -> Vec<u8> {
        match self.mount(uri.schema()) {
            Some(mount) => mount.read(uri.path()),
            None => Vec::new(),
        }
    }

    /// Writes `bytes` to the file at `uri` synchronously.
    pub fn save(&self, uri: &Uri, bytes: &[u8]) -> bool {
        let mount = match self.mount(uri.schema()) {
            Some(mount) => mount,
            None => return false,
        };

        match mount.write(uri.path(), bytes) {
            Ok(_) => true,
            Err(err) => {
                warn!("Failed to save {}. {}", uri, err);
                false
            }
        }
    }

    /// Deletes the file or directory at `uri` synchronously.
    pub fn delete(&self, uri: &Uri) -> bool {
        let mount = match self.mount(uri.schema()) {
            Some(mount) => mount,
            None => return false,
        };

        match mount.delete(uri.path()) {
            Ok(_) => true,
            Err(err) => {
                warn!("Failed to delete {}. {}", uri, err);
                false
            }
        }
    }

    /// Copies a file, possibly across mounts.
    pub fn copy(&self, src: &Uri, dst: &Uri) -> bool {
        let bytes = self.find(src);
        !bytes.is_empty() && self.save(dst, &bytes)
    }

    pub fn enumerate(&self, uri: &Uri) -> Vec<Item> {
        match self.mount(uri.schema()) {
            Some(mount) => mount.enumerate(uri.path()),
            None => Vec::new(),
        }
    }

    fn mount(&self, schema: &str) -> Option<Arc<dyn Mount>> {
        self.mounts.read().unwrap().get(schema).cloned()
    }

    fn loader(&self, extension: &str) -> Option<Arc<dyn Loader>> {
        let extension = extension.to_ascii_lowercase();
        self.loaders
            .read()
            .unwrap()
            .get(extension.as_str())
            .cloned()
    }

    fn on_asset_load(&self, asset: Arc<dyn AnyResource>, parent: Option<&mut Scope>) {
        if let Some(scope) = parent {
            scope.mark(asset.clone());
        }

        if asset.transition(Status::Idle, Status::Queued) {
            let mut queue = self.loader_queue.lock().unwrap();

            if self.stop.load(Ordering::Acquire) {
                warn!("Failed to load {}. Resource service has been torn down.", asset.key());
                asset.set_status(Status::Failed);
                return;
            }

            debug!("Queues {}.", asset.key());
            self.in_flight.fetch_add(1, Ordering::AcqRel);
            queue.push(Scope::new(asset));
            self.loader_signal.notify_one();
        }
    }

    fn on_asset_create(&self, scope: Scope) {
        let target = scope.target();
        target.on_create();
        target.set_status(Status::Loaded);
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
        debug!("Finalizes {}.", target.key());
    }

    fn on_asset_delete(&self, asset: &dyn AnyResource) {
        debug!("Deletes {}.", asset.key());
        asset.on_delete();
    }

    fn on_loader_thread(&self) {
        trace!("Loader thread {:?} starts.", thread::current().name());

        loop {
            let scope = {
                let mut queue = self.loader_queue.lock().unwrap();
                while queue.is_empty() && !self.stop.load(Ordering::Acquire) {
                    queue = self.loader_signal.wait(queue).unwrap();
                }

                if self.stop.load(Ordering::Acquire) {
                    break;
                }

                match queue.pop() {
                    Some(v) => v,
                    None => continue,
                }
            };

            trace!("Parses {} on {:?}.", scope.key(), thread::current().name());
            self.on_loader_parse(scope);
        }

        trace!("Loader thread {:?} stops.", thread::current().name());
    }

    fn on_loader_parse(&self, mut scope: Scope) {
        match self.parse(&mut scope) {
            Ok(()) => {
                scope.set_parsed();
                self.parser_queue.lock().unwrap().push(scope);
            }
            Err(err) => {
                warn!("Failed to load {}. {}", scope.key(), err);
                scope.target().set_status(Status::Failed);
                drop(scope);
                self.in_flight.fetch_sub(1, Ordering::AcqRel);
            }
        }
    }

    fn parse(&self, scope: &mut Scope) -> ::std::result::Result<(), Error> {
        let key = scope.key().clone();

        let loader = self
            .loader(key.extension())
            .ok_or_else(|| Error::LoaderNotFound(key.extension().to_owned()))?;

        let mount = self
            .mount(key.schema())
            .ok_or_else(|| Error::MountNotFound(key.schema().to_owned()))?;

        let bytes = mount.read(key.path());
        if bytes.is_empty() {
            return Err(Error::NotFound(key.to_string()));
        }

        match panic::catch_unwind(AssertUnwindSafe(|| loader.load(self, scope, &bytes))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(Error::Malformed(key.to_string(), err)),
            Err(_) => Err(Error::Malformed(
                key.to_string(),
                format_err!("loader panicked"),
            )),
        }
    }
}
