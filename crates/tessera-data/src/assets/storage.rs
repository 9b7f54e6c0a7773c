// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A concurrent, generation-checked cache of loaded resources.

use super::LoadError;
use dashmap::{mapref::entry::Entry, DashMap};
use parking_lot::RwLock;
use std::hash::{BuildHasher, Hash};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tessera_core::asset::{Asset, ResourceHandle};
use tessera_core::tasks::TaskPool;

/// A function that builds the resource reserved under a handle.
pub type Loader<T> = Arc<dyn Fn(ResourceHandle<T>) -> Result<T, LoadError> + Send + Sync>;

/// When a newly reserved resource is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Run the loader on the calling thread before returning the handle.
    Immediate,
    /// Run the loader on the worker pool; the handle resolves once it finishes.
    #[default]
    Deferred,
}

/// Hashes `value` with fixed seeds, so equal content always maps to the same
/// cache key within a build.
pub fn content_hash<H: Hash + ?Sized>(value: &H) -> u64 {
    let state = ahash::RandomState::with_seeds(
        0x243f_6a88_85a3_08d3,
        0x1319_8a2e_0370_7344,
        0xa409_3822_299f_31d0,
        0x082e_fa98_ec4e_6c89,
    );
    BuildHasher::hash_one(&state, value)
}

/// Storage for one reserved resource.
struct Slot<T: Asset> {
    generation: u32,
    value: RwLock<Option<Arc<T>>>,
    loader: Option<Loader<T>>,
}

impl<T: Asset> Slot<T> {
    fn new(generation: u32, loader: Option<Loader<T>>) -> Self {
        Self {
            generation,
            value: RwLock::new(None),
            loader,
        }
    }

    fn publish(&self, value: T) {
        *self.value.write() = Some(Arc::new(value));
    }
}

/// Runs the slot's loader and publishes the result. A failure leaves the
/// previously published value, if any, in place.
fn run_loader<T: Asset>(name: &str, handle: ResourceHandle<T>, slot: &Slot<T>) {
    let Some(loader) = slot.loader.as_ref() else {
        return;
    };
    match loader(handle) {
        Ok(value) => slot.publish(value),
        Err(err) => log::error!("ResourceCache<{name}>: failed to load {handle:?}: {err}"),
    }
}

/// A central, concurrent cache for one type of resource `T`.
///
/// Resources are keyed by a 64-bit content hash. The first request for a
/// hash reserves a slot, hands out a [`ResourceHandle`] and runs the loader
/// exactly once; later requests for the same hash return the same handle.
/// Callers only ever hold handles; [`ResourceCache::get_resource`] hands out
/// a shared `Arc` of the currently published object.
///
/// [`ResourceCache::clear`] bumps the cache generation. Every handle issued
/// before the clear then resolves to `None`, without enumerating them.
pub struct ResourceCache<T: Asset> {
    name: &'static str,
    pool: Arc<TaskPool>,
    // Current generation, the validation floor. Starts at 1.
    generation: AtomicU32,
    next_index: AtomicU32,
    by_hash: DashMap<u64, ResourceHandle<T>>,
    slots: DashMap<u32, Arc<Slot<T>>>,
    // Reservation holds it shared, `clear` exclusive.
    epoch: RwLock<()>,
}

impl<T: Asset> ResourceCache<T> {
    /// Creates an empty cache whose deferred loads run on `pool`.
    ///
    /// `name` only appears in log messages.
    pub fn new(name: &'static str, pool: Arc<TaskPool>) -> Self {
        Self {
            name,
            pool,
            generation: AtomicU32::new(1),
            next_index: AtomicU32::new(0),
            by_hash: DashMap::new(),
            slots: DashMap::new(),
            epoch: RwLock::new(()),
        }
    }

    /// The current generation. Only handles of this generation resolve.
    pub fn generation(&self) -> u32 {
        self.generation.load(Ordering::Acquire)
    }

    /// Number of reserved slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no slot is reserved.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the handle for `hash`, reserving a slot and starting `loader`
    /// if the hash has not been seen since the last clear.
    ///
    /// Concurrent calls with the same hash all return the same handle, and
    /// only the call that reserved the slot runs the loader. With
    /// [`LoadMode::Immediate`] that call returns after the loader finished;
    /// the others never block.
    pub fn get_handle<F>(&self, hash: u64, mode: LoadMode, loader: F) -> ResourceHandle<T>
    where
        F: Fn(ResourceHandle<T>) -> Result<T, LoadError> + Send + Sync + 'static,
    {
        let (handle, slot) = {
            let _epoch = self.epoch.read();
            match self.by_hash.entry(hash) {
                Entry::Occupied(entry) => return *entry.get(),
                Entry::Vacant(entry) => {
                    let generation = self.generation.load(Ordering::Acquire);
                    let index = self.next_index.fetch_add(1, Ordering::Relaxed);
                    let handle = ResourceHandle::new(index, generation);
                    let loader: Loader<T> = Arc::new(loader);
                    let slot = Arc::new(Slot::new(generation, Some(loader)));
                    self.slots.insert(index, slot.clone());
                    entry.insert(handle);
                    (handle, slot)
                }
            }
        };

        self.schedule(handle, slot, mode);
        handle
    }

    fn schedule(&self, handle: ResourceHandle<T>, slot: Arc<Slot<T>>, mode: LoadMode) {
        match mode {
            LoadMode::Immediate => run_loader(self.name, handle, &slot),
            LoadMode::Deferred => {
                let name = self.name;
                self.pool.spawn(move || run_loader(name, handle, &slot));
            }
        }
    }

    /// Publishes an already built object under `hash` and returns its handle.
    ///
    /// If the hash is already reserved, its object is replaced and the
    /// existing handle is returned.
    pub fn insert(&self, hash: u64, value: T) -> ResourceHandle<T> {
        let _epoch = self.epoch.read();
        match self.by_hash.entry(hash) {
            Entry::Occupied(entry) => {
                let handle = *entry.get();
                if let Some(slot) = self.slots.get(&handle.index()) {
                    slot.publish(value);
                }
                handle
            }
            Entry::Vacant(entry) => {
                let generation = self.generation.load(Ordering::Acquire);
                let index = self.next_index.fetch_add(1, Ordering::Relaxed);
                let handle = ResourceHandle::new(index, generation);
                let slot = Slot::new(generation, None);
                slot.publish(value);
                self.slots.insert(index, Arc::new(slot));
                entry.insert(handle);
                handle
            }
        }
    }

    /// Returns the handle reserved for `hash`, without loading anything.
    pub fn find(&self, hash: u64) -> Option<ResourceHandle<T>> {
        self.by_hash.get(&hash).map(|entry| *entry)
    }

    /// Returns the published object, or `None` if the handle is stale, the
    /// load has not finished, or the load failed.
    pub fn get_resource(&self, handle: ResourceHandle<T>) -> Option<Arc<T>> {
        if handle.generation() != self.generation() {
            return None;
        }
        let slot = self.slots.get(&handle.index())?;
        if slot.generation != handle.generation() {
            return None;
        }
        let value = slot.value.read().clone();
        value
    }

    /// Returns `true` if `handle` currently resolves to an object.
    pub fn is_ready(&self, handle: ResourceHandle<T>) -> bool {
        self.get_resource(handle).is_some()
    }

    /// Every currently published object, in no particular order.
    pub fn resources(&self) -> Vec<Arc<T>> {
        self.slots
            .iter()
            .filter_map(|entry| entry.value.read().clone())
            .collect()
    }

    /// Invalidates every issued handle and releases every object.
    ///
    /// Objects still referenced through an `Arc` obtained earlier stay alive
    /// until those references are dropped. Loads still running publish into
    /// released slots and are discarded.
    pub fn clear(&self) {
        let _epoch = self.epoch.write();
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.by_hash.clear();
        self.slots.clear();
        self.next_index.store(0, Ordering::Relaxed);
        log::debug!(
            "ResourceCache<{}>: cleared, generation is now {generation}",
            self.name
        );
    }

    /// Runs every stored loader again and swaps the new objects in.
    ///
    /// Readers keep the previous object until the new one is published.
    /// Objects added with [`ResourceCache::insert`] have no loader and are
    /// left as they are.
    pub fn reload(&self, mode: LoadMode) {
        let slots: Vec<(u32, Arc<Slot<T>>)> = self
            .slots
            .iter()
            .filter(|entry| entry.loader.is_some())
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        log::debug!(
            "ResourceCache<{}>: reloading {} resources",
            self.name,
            slots.len()
        );
        for (index, slot) in slots {
            let handle = ResourceHandle::new(index, slot.generation);
            self.schedule(handle, slot, mode);
        }
    }
}
