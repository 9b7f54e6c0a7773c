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

//! A fixed-size worker pool for frame preparation and background loads.
//!
//! Three kinds of work run on the pool:
//!
//! - data-parallel rayon work (culling, clustering, sorting), entered through
//!   [`TaskPool::install`];
//! - fire-and-forget jobs such as deferred resource loads ([`TaskPool::spawn`]),
//!   tracked so that [`TaskPool::wait_idle`] can drain them at shutdown;
//! - structured tasks whose result is collected later ([`TaskPool::submit`]
//!   and [`TaskPool::join_all`]).

use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// An error raised by the worker pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The underlying thread pool could not be built.
    PoolCreation(String),
    /// A submitted task panicked before producing its result.
    Panicked,
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::PoolCreation(msg) => write!(f, "Failed to create worker pool: {msg}"),
            TaskError::Panicked => write!(f, "A worker task panicked."),
        }
    }
}

impl std::error::Error for TaskError {}

/// Counts spawned jobs that have not finished yet.
#[derive(Default)]
struct PendingJobs {
    count: Mutex<usize>,
    idle: Condvar,
}

/// Decrements the pending count when a job ends, including by unwinding.
struct PendingGuard(Arc<PendingJobs>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let mut count = self.0.count.lock();
        *count -= 1;
        if *count == 0 {
            self.0.idle.notify_all();
        }
    }
}

/// A handle to the result of a task started with [`TaskPool::submit`].
#[must_use = "a task handle does nothing unless joined"]
pub struct TaskHandle<R> {
    receiver: Receiver<Result<R, TaskError>>,
}

impl<R> TaskHandle<R> {
    /// Blocks until the task finishes and returns its result.
    pub fn join(self) -> Result<R, TaskError> {
        self.receiver.recv().unwrap_or(Err(TaskError::Panicked))
    }

    /// Returns the result if the task has already finished.
    pub fn try_join(&self) -> Option<Result<R, TaskError>> {
        self.receiver.try_recv().ok()
    }
}

/// A fixed-size pool of named worker threads backed by `rayon`.
pub struct TaskPool {
    pool: rayon::ThreadPool,
    pending: Arc<PendingJobs>,
}

impl fmt::Debug for TaskPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskPool")
            .field("threads", &self.pool.current_num_threads())
            .field("pending", &*self.pending.count.lock())
            .finish()
    }
}

impl TaskPool {
    /// Creates a pool with `threads` workers (at least one).
    ///
    /// Workers are named `tessera-worker-{i}`. A panic in a spawned job is
    /// logged and does not bring the pool down.
    pub fn new(threads: usize) -> Result<Self, TaskError> {
        let threads = threads.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("tessera-worker-{i}"))
            .panic_handler(|_| log::error!("TaskPool: a spawned job panicked"))
            .build()
            .map_err(|e| TaskError::PoolCreation(e.to_string()))?;
        log::info!("TaskPool: started {threads} worker threads");
        Ok(Self {
            pool,
            pending: Arc::new(PendingJobs::default()),
        })
    }

    /// Number of worker threads.
    pub fn thread_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Number of spawned jobs that have not finished.
    pub fn pending_jobs(&self) -> usize {
        *self.pending.count.lock()
    }

    /// Runs `job` on a worker without waiting for it.
    pub fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        *self.pending.count.lock() += 1;
        let guard = PendingGuard(self.pending.clone());
        self.pool.spawn(move || {
            let _guard = guard;
            job();
        });
    }

    /// Runs `task` on a worker and returns a handle to its result.
    ///
    /// A panic inside the task is caught and reported by
    /// [`TaskHandle::join`] as [`TaskError::Panicked`].
    pub fn submit<R, F>(&self, task: F) -> TaskHandle<R>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        let (sender, receiver): (Sender<Result<R, TaskError>>, _) = crossbeam_channel::bounded(1);
        self.spawn(move || {
            let result = catch_unwind(AssertUnwindSafe(task)).map_err(|_| {
                log::error!("TaskPool: a submitted task panicked");
                TaskError::Panicked
            });
            // The handle may have been dropped; the result is then discarded.
            let _ = sender.send(result);
        });
        TaskHandle { receiver }
    }

    /// Waits for every handle and returns the results in order.
    ///
    /// All tasks are joined even when one fails; the first failure is returned.
    pub fn join_all<R>(
        &self,
        handles: impl IntoIterator<Item = TaskHandle<R>>,
    ) -> Result<Vec<R>, TaskError> {
        let results: Vec<Result<R, TaskError>> =
            handles.into_iter().map(TaskHandle::join).collect();
        results.into_iter().collect()
    }

    /// Runs `op` inside the pool so that rayon parallel iterators used by it
    /// execute on this pool's workers.
    pub fn install<R, OP>(&self, op: OP) -> R
    where
        R: Send,
        OP: FnOnce() -> R + Send,
    {
        self.pool.install(op)
    }

    /// Blocks until every spawned job, including submitted tasks, has finished.
    pub fn wait_idle(&self) {
        let mut count = self.pending.count.lock();
        while *count > 0 {
            self.pending.idle.wait(&mut count);
        }
    }
}
