//! Bounded worker pools for the comparison phase.
//!
//! # Overview
//!
//! Comparison runs on two pools at once:
//!
//! - [`WorkerPool`] (outer): one task per size group. Tasks run on named
//!   worker threads, and each task's completion callback runs later on the
//!   thread that owns the pool with `&mut` access to the aggregation state.
//!   Results are therefore accumulated without locks.
//! - [`IoPool`] (inner): a rayon pool shared by every outer task. It bounds
//!   the number of simultaneous file reads across all groups.
//!
//! The outer pool is built on std threads rather than rayon so that an outer
//! task blocked in [`IoPool::map`] never steals and runs other outer tasks.
//!
//! # Example
//!
//! ```
//! use pardupes::pool::WorkerPool;
//!
//! let mut pool = WorkerPool::new("sum", 2, 0u64).unwrap();
//! for n in 1..=10u64 {
//!     pool.submit(move || n * n, |total, square| *total += square).unwrap();
//! }
//! pool.wait_until_complete().unwrap();
//! assert_eq!(pool.into_state(), 385);
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use rayon::prelude::*;

/// Errors from the worker pools.
#[derive(thiserror::Error, Debug)]
pub enum PoolError {
    /// Worker threads could not be started.
    #[error("Failed to start worker pool '{name}': {reason}")]
    Spawn {
        /// Pool name
        name: String,
        /// Underlying failure
        reason: String,
    },

    /// A task panicked; the rest of the submitted work still ran.
    #[error("Worker task panicked: {0}")]
    TaskPanicked(String),

    /// Every worker thread exited while tasks were outstanding.
    #[error("Worker pool '{0}' lost its workers")]
    Disconnected(String),
}

type Task<R> = Box<dyn FnOnce() -> R + Send>;
type Callback<R, S> = Box<dyn FnOnce(&mut S, R)>;

struct Completion<R> {
    id: u64,
    outcome: Result<R, String>,
}

/// Worker threads and the sending half of their job queue.
///
/// Dropping it closes the queue and joins the threads once queued jobs have
/// run.
struct Workers<R> {
    name: String,
    jobs: Option<Sender<(u64, Task<R>)>>,
    handles: Vec<JoinHandle<()>>,
}

impl<R> Workers<R> {
    fn send(&self, id: u64, task: Task<R>) -> bool {
        self.jobs
            .as_ref()
            .is_some_and(|jobs| jobs.send((id, task)).is_ok())
    }
}

impl<R> Drop for Workers<R> {
    fn drop(&mut self) {
        self.jobs = None;
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                log::warn!("Worker thread in pool '{}' exited abnormally", self.name);
            }
        }
    }
}

/// Fixed-size pool whose completion callbacks run on the owning thread.
///
/// At most `threads + queue_depth` tasks are outstanding at once;
/// [`submit`](Self::submit) blocks and retires finished tasks until a slot
/// frees up.
pub struct WorkerPool<R: Send + 'static, S> {
    // Dropped first so queued jobs can still report their results.
    workers: Workers<R>,
    results: Receiver<Completion<R>>,
    callbacks: HashMap<u64, Callback<R, S>>,
    capacity: usize,
    next_id: u64,
    first_panic: Option<String>,
    state: S,
}

impl<R: Send + 'static, S> WorkerPool<R, S> {
    /// Start `threads` workers around the given aggregation state.
    ///
    /// The queue depth defaults to `threads`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Spawn`] if a worker thread cannot be created.
    pub fn new(name: &str, threads: usize, state: S) -> Result<Self, PoolError> {
        let threads = threads.max(1);
        let (job_tx, job_rx) = mpsc::channel::<(u64, Task<R>)>();
        let (result_tx, result_rx) = mpsc::channel::<Completion<R>>();
        let job_rx = Arc::new(Mutex::new(job_rx));

        let mut workers = Workers {
            name: name.to_string(),
            jobs: Some(job_tx),
            handles: Vec::with_capacity(threads),
        };
        for idx in 0..threads {
            let jobs = Arc::clone(&job_rx);
            let results = result_tx.clone();
            let handle = std::thread::Builder::new()
                .name(format!("{name}-{idx}"))
                .spawn(move || worker_loop(&jobs, &results))
                .map_err(|e| PoolError::Spawn {
                    name: name.to_string(),
                    reason: e.to_string(),
                })?;
            workers.handles.push(handle);
        }
        log::debug!("Started worker pool '{}' with {} threads", name, threads);

        Ok(Self {
            workers,
            results: result_rx,
            callbacks: HashMap::new(),
            capacity: threads * 2,
            next_id: 0,
            first_panic: None,
            state,
        })
    }

    /// Set how many tasks may wait beyond the ones running.
    #[must_use]
    pub fn with_queue_depth(mut self, queue_depth: usize) -> Self {
        self.capacity = self.workers.handles.len() + queue_depth;
        self
    }

    /// Number of tasks submitted whose callback has not run yet.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.callbacks.len()
    }

    /// Maximum number of outstanding tasks.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Submit a task and the callback that consumes its result.
    ///
    /// Blocks while the pool is at capacity, running the callbacks of
    /// finished tasks in the meantime.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Disconnected`] if the workers are gone.
    pub fn submit<T, C>(&mut self, task: T, on_complete: C) -> Result<(), PoolError>
    where
        T: FnOnce() -> R + Send + 'static,
        C: FnOnce(&mut S, R) + 'static,
    {
        while self.callbacks.len() >= self.capacity {
            self.retire_one()?;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.callbacks.insert(id, Box::new(on_complete));

        if !self.workers.send(id, Box::new(task)) {
            self.callbacks.remove(&id);
            return Err(PoolError::Disconnected(self.workers.name.clone()));
        }
        Ok(())
    }

    /// Run callbacks for every task that has already finished, without
    /// blocking.
    pub fn poll(&mut self) {
        while let Ok(completion) = self.results.try_recv() {
            self.complete(completion);
        }
    }

    /// Block until every submitted task and its callback have finished.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::TaskPanicked`] with the first panic message if any
    /// task panicked since the last call, after all other work has finished.
    pub fn wait_until_complete(&mut self) -> Result<(), PoolError> {
        while !self.callbacks.is_empty() {
            self.retire_one()?;
        }
        match self.first_panic.take() {
            Some(message) => Err(PoolError::TaskPanicked(message)),
            None => Ok(()),
        }
    }

    /// Shared access to the aggregation state.
    #[must_use]
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Exclusive access to the aggregation state.
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Stop the workers and return the aggregation state.
    ///
    /// Callbacks of tasks still outstanding are not run.
    pub fn into_state(self) -> S {
        let Self { workers, state, .. } = self;
        drop(workers);
        state
    }

    fn retire_one(&mut self) -> Result<(), PoolError> {
        let completion = self
            .results
            .recv()
            .map_err(|_| PoolError::Disconnected(self.workers.name.clone()))?;
        self.complete(completion);
        Ok(())
    }

    fn complete(&mut self, completion: Completion<R>) {
        let Some(callback) = self.callbacks.remove(&completion.id) else {
            return;
        };
        match completion.outcome {
            Ok(result) => callback(&mut self.state, result),
            Err(message) => {
                log::error!("Task in pool '{}' panicked: {}", self.workers.name, message);
                self.first_panic.get_or_insert(message);
            }
        }
    }
}

fn worker_loop<R>(jobs: &Mutex<Receiver<(u64, Task<R>)>>, results: &Sender<Completion<R>>) {
    loop {
        let job = jobs.lock().unwrap_or_else(PoisonError::into_inner).recv();
        let Ok((id, task)) = job else { break };
        let outcome = panic::catch_unwind(AssertUnwindSafe(task)).map_err(panic_message);
        if results.send(Completion { id, outcome }).is_err() {
            break;
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Shared rayon pool bounding concurrent file reads.
#[derive(Debug)]
pub struct IoPool {
    pool: rayon::ThreadPool,
}

impl IoPool {
    /// Build a pool of `threads` read workers.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Spawn`] if rayon cannot start the threads.
    pub fn new(threads: usize) -> Result<Self, PoolError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|idx| format!("pardupes-io-{idx}"))
            .build()
            .map_err(|e| PoolError::Spawn {
                name: "io".to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { pool })
    }

    /// Number of read workers.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Apply `f` to every item inside the pool; results keep input order.
    pub fn map<T, U, F>(&self, items: Vec<T>, f: F) -> Vec<U>
    where
        T: Send,
        U: Send,
        F: Fn(T) -> U + Send + Sync,
    {
        self.pool.install(|| items.into_par_iter().map(f).collect())
    }
}
