//! A single supervised OS thread.
//!
//! # Responsibilities
//! - Spawn a named thread that repeatedly invokes a runnable
//! - Stop cooperatively and join
//! - Optionally rendezvous with the spawning thread after the first iteration
//!
//! # Design Decisions
//! - Configuration lives behind a mutex so a worker can be shared by
//!   reference between the controlling thread and service hooks
//! - The spawned thread only holds an `Arc` of the flags it needs, never
//!   the `Worker` itself, so dropping the worker is always safe
//! - Start and stop on one worker must not overlap (caller contract)

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};

use crate::observability::metrics;
use crate::sync::Synchronizer;
use crate::worker::ThreadRegistry;

/// Unit of work executed by a worker thread.
///
/// Returns `false` when there is nothing left to do.
pub trait Runnable: Send + Sync {
    fn run(&self) -> bool;
}

impl<F> Runnable for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn run(&self) -> bool {
        self()
    }
}

pub(crate) type Callback = Arc<dyn Fn() + Send + Sync>;
pub(crate) type StopCallback = Arc<dyn Fn() -> bool + Send + Sync>;

#[derive(Default)]
struct WorkerHooks {
    runnable: Option<Arc<dyn Runnable>>,
    setup: Option<Callback>,
    teardown: Option<Callback>,
    stop: Option<StopCallback>,
    registry: Option<Arc<ThreadRegistry>>,
}

#[derive(Debug, Default)]
struct WorkerFlags {
    started: AtomicBool,
    running: AtomicBool,
    start_pending: AtomicBool,
    thread_id: Mutex<Option<ThreadId>>,
    synchro: Synchronizer,
}

impl WorkerFlags {
    /// Release a synchronized starter, at most once per start.
    fn release_starter(&self) {
        if self.start_pending.swap(false, Ordering::SeqCst) {
            self.synchro.sync();
        }
    }
}

/// Lets a runnable release a synchronized starter before its first
/// iteration completes, e.g. before blocking on a pause.
#[derive(Debug, Clone)]
pub(crate) struct StartSignal {
    flags: Arc<WorkerFlags>,
}

impl StartSignal {
    pub(crate) fn release(&self) {
        self.flags.release_starter();
    }
}

/// Owns at most one thread looping over a runnable.
pub struct Worker {
    flags: Arc<WorkerFlags>,
    hooks: Mutex<WorkerHooks>,
    thread: Mutex<Option<JoinHandle<()>>>,
    name: Mutex<String>,
}

impl Worker {
    /// Create a worker with nothing to run yet.
    pub fn new() -> Self {
        Self {
            flags: Arc::new(WorkerFlags::default()),
            hooks: Mutex::new(WorkerHooks::default()),
            thread: Mutex::new(None),
            name: Mutex::new(String::new()),
        }
    }

    pub fn with_runnable(runnable: Arc<dyn Runnable>) -> Self {
        let worker = Self::new();
        worker.set_runnable(runnable);
        worker
    }

    pub fn with_method<F>(method: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        let worker = Self::new();
        worker.set_method(method);
        worker
    }

    /// Run `runnable` on the next start. Replaces any previous method.
    pub fn set_runnable(&self, runnable: Arc<dyn Runnable>) {
        self.hooks().runnable = Some(runnable);
    }

    /// Run `method` on the next start. Replaces any previous runnable.
    pub fn set_method<F>(&self, method: F)
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.set_runnable(Arc::new(method));
    }

    /// Called on the worker thread before the first iteration.
    pub fn set_callback_setup<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.hooks().setup = Some(Arc::new(callback));
    }

    /// Called on the worker thread right before it exits.
    pub fn set_callback_teardown<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.hooks().teardown = Some(Arc::new(callback));
    }

    /// Called on the stopping thread once stop is requested, before the join.
    ///
    /// Use it to interrupt a runnable that blocks. Its result is folded
    /// into the return value of [`Worker::stop_worker`].
    pub fn set_callback_stop<F>(&self, callback: F)
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.hooks().stop = Some(Arc::new(callback));
    }

    /// Register worker threads in `registry` while they live.
    pub fn set_thread_registry(&self, registry: Arc<ThreadRegistry>) {
        self.hooks().registry = Some(registry);
    }

    /// Spawn the worker thread.
    ///
    /// Returns `true` if already started. Returns `false` when nothing is
    /// configured to run or the thread cannot be spawned, leaving no
    /// thread handle behind.
    pub fn start_worker(&self, name: &str) -> bool {
        self.spawn(name, false)
    }

    /// Spawn the worker thread and wait until it completed its first
    /// iteration.
    pub fn start_sync_worker(&self, name: &str) -> bool {
        if self.is_worker_started() {
            return true;
        }
        self.flags.synchro.init_sync(2);
        let ret = self.spawn(name, true);
        if ret {
            self.flags.synchro.sync();
        }
        self.flags.synchro.reset();
        ret
    }

    /// Request termination and join the thread.
    ///
    /// No-op returning `true` when not started. Must not be called from the
    /// worker thread itself: that call is refused, returns `false` and
    /// leaves the worker untouched.
    pub fn stop_worker(&self) -> bool {
        if self.is_own_thread() {
            tracing::error!(worker = %self.worker_name(), "Worker cannot be stopped from its own thread");
            return false;
        }
        if !self.flags.started.swap(false, Ordering::SeqCst) {
            return true;
        }

        let stop = self.hooks().stop.clone();
        let mut ret = stop.map_or(true, |callback| callback());

        let handle = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!(worker = %self.worker_name(), "Worker thread panicked");
                ret = false;
            }
        }
        ret
    }

    /// `true` while the thread loop is executing.
    pub fn is_worker_running(&self) -> bool {
        self.flags.running.load(Ordering::SeqCst)
    }

    /// `true` from a successful start until the next stop, even if the
    /// loop already finished by itself.
    pub fn is_worker_started(&self) -> bool {
        self.flags.started.load(Ordering::SeqCst)
    }

    /// Name given to the last started thread.
    pub fn worker_name(&self) -> String {
        self.name.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn start_signal(&self) -> StartSignal {
        StartSignal {
            flags: Arc::clone(&self.flags),
        }
    }

    fn is_own_thread(&self) -> bool {
        *self.flags.thread_id.lock().unwrap_or_else(PoisonError::into_inner) == Some(thread::current().id())
    }

    fn hooks(&self) -> MutexGuard<'_, WorkerHooks> {
        self.hooks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn(&self, name: &str, synchronised: bool) -> bool {
        if self.flags.started.swap(true, Ordering::SeqCst) {
            return true;
        }

        let (runnable, setup, teardown, registry) = {
            let hooks = self.hooks();
            (
                hooks.runnable.clone(),
                hooks.setup.clone(),
                hooks.teardown.clone(),
                hooks.registry.clone(),
            )
        };
        let Some(runnable) = runnable else {
            self.flags.started.store(false, Ordering::SeqCst);
            tracing::error!(worker = %name, "Cannot start worker: nothing to run");
            return false;
        };

        // A loop that ended by itself leaves a finished handle behind.
        self.join_stale();

        *self.name.lock().unwrap_or_else(PoisonError::into_inner) = name.to_string();
        self.flags.running.store(true, Ordering::SeqCst);
        self.flags.start_pending.store(synchronised, Ordering::SeqCst);

        let flags = Arc::clone(&self.flags);
        let thread_name = name.to_string();
        let spawned = thread::Builder::new().name(name.to_string()).spawn(move || {
            *flags.thread_id.lock().unwrap_or_else(PoisonError::into_inner) = Some(thread::current().id());
            let _running = RunningGuard(&flags);
            if let Some(registry) = &registry {
                registry.register_current(&thread_name);
            }
            tracing::debug!(worker = %thread_name, "Worker thread started");
            if let Some(setup) = &setup {
                setup();
            }

            let rendezvous = FirstIteration(&flags);
            while flags.started.load(Ordering::SeqCst) {
                let more = runnable.run();
                flags.release_starter();
                if !more {
                    break;
                }
            }
            drop(rendezvous);

            if let Some(teardown) = &teardown {
                teardown();
            }
            if let Some(registry) = &registry {
                registry.unregister_current();
            }
            tracing::debug!(worker = %thread_name, "Worker thread exiting");
            metrics::record_worker_thread("exited");
        });

        match spawned {
            Ok(handle) => {
                *self.thread.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
                metrics::record_worker_thread("spawned");
                true
            }
            Err(e) => {
                self.flags.start_pending.store(false, Ordering::SeqCst);
                self.flags.running.store(false, Ordering::SeqCst);
                self.flags.started.store(false, Ordering::SeqCst);
                tracing::error!(worker = %name, error = %e, "Failed to spawn worker thread");
                metrics::record_worker_thread("spawn_failed");
                false
            }
        }
    }

    fn join_stale(&self) {
        let stale = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = stale {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

impl Default for Worker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("name", &self.worker_name())
            .field("started", &self.is_worker_started())
            .field("running", &self.is_worker_running())
            .finish()
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if self.is_own_thread() {
            // Last owner is the worker thread: end the loop, leave it detached.
            self.flags.started.store(false, Ordering::SeqCst);
        } else {
            self.stop_worker();
        }
    }
}

/// Clears the running flag when the thread body exits, panics included.
struct RunningGuard<'a>(&'a WorkerFlags);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::SeqCst);
    }
}

/// Releases a synchronized starter on drop if the loop never completed
/// an iteration or the runnable panicked, so the starter is never left
/// blocked.
struct FirstIteration<'a>(&'a WorkerFlags);

impl Drop for FirstIteration<'_> {
    fn drop(&mut self) {
        self.0.release_starter();
    }
}
