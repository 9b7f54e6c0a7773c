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

//! Concurrency tests of the resource cache.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use tessera_core::asset::{Asset, ResourceHandle};
use tessera_core::tasks::TaskPool;
use tessera_data::{LoadError, LoadMode, ResourceCache};

#[derive(Debug)]
struct Texture {
    id: u32,
}

impl Asset for Texture {}

fn setup() -> (Arc<TaskPool>, Arc<ResourceCache<Texture>>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let pool = Arc::new(TaskPool::new(4).unwrap());
    let cache = Arc::new(ResourceCache::new("texture", pool.clone()));
    (pool, cache)
}

#[test]
fn test_concurrent_get_handle_runs_loader_once() {
    let (pool, cache) = setup();
    let calls = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(8));

    let threads: Vec<_> = (0..8)
        .map(|_| {
            let cache = cache.clone();
            let calls = calls.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                cache.get_handle(42, LoadMode::Deferred, move |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Texture { id: 42 })
                })
            })
        })
        .collect();

    let handles: Vec<ResourceHandle<Texture>> =
        threads.into_iter().map(|t| t.join().unwrap()).collect();
    pool.wait_idle();

    assert!(handles.iter().all(|h| *h == handles[0]));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.get_resource(handles[0]).map(|t| t.id), Some(42));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_distinct_hashes_get_distinct_handles_under_contention() {
    let (pool, cache) = setup();
    let threads: Vec<_> = (0..8u64)
        .map(|t| {
            let cache = cache.clone();
            thread::spawn(move || {
                (0..16u64)
                    .map(|i| {
                        let hash = (t * 16 + i) % 32;
                        cache.get_handle(hash, LoadMode::Immediate, move |_| {
                            Ok(Texture { id: hash as u32 })
                        })
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }
    pool.wait_idle();

    assert_eq!(cache.len(), 32);
    for hash in 0..32u64 {
        let handle = cache.find(hash).unwrap();
        assert_eq!(cache.get_resource(handle).map(|t| t.id), Some(hash as u32));
    }
}

#[test]
fn test_handles_issued_before_clear_stay_invalid() {
    let (pool, cache) = setup();
    let before: Vec<_> = (0..10u64)
        .map(|h| cache.get_handle(h, LoadMode::Deferred, move |_| Ok(Texture { id: h as u32 })))
        .collect();
    pool.wait_idle();
    cache.clear();

    // Reserve the same hashes again, reusing slot indices.
    let after: Vec<_> = (0..10u64)
        .map(|h| cache.get_handle(h, LoadMode::Immediate, move |_| Ok(Texture { id: h as u32 })))
        .collect();

    for (old, new) in before.iter().zip(&after) {
        assert!(cache.get_resource(*old).is_none());
        assert_ne!(old, new);
        assert!(cache.get_resource(*new).is_some());
    }
}

#[test]
fn test_readers_keep_old_object_during_reload() {
    let (pool, cache) = setup();
    let version = Arc::new(AtomicUsize::new(0));
    let v = version.clone();
    let handle = cache.get_handle(1, LoadMode::Immediate, move |_| {
        Ok(Texture {
            id: v.fetch_add(1, Ordering::SeqCst) as u32,
        })
    });
    let held = cache.get_resource(handle).unwrap();
    cache.reload(LoadMode::Deferred);
    pool.wait_idle();

    assert_eq!(held.id, 0);
    assert_eq!(cache.get_resource(handle).map(|t| t.id), Some(1));
}

#[test]
fn test_loader_error_is_not_fatal() {
    let (_pool, cache) = setup();
    let handle = cache.get_handle(3, LoadMode::Immediate, |_| {
        Err(LoadError::NotFound("missing.dds".into()))
    });
    assert!(!cache.is_ready(handle));
    assert_eq!(cache.find(3), Some(handle));
}
