//! Fixed-frequency worker with pause/resume.
//!
//! # Tick
//! ```text
//! paused? release a synchronized starter, then wait while paused
//!     → sleep max(0, interval - (now - last tick start))   (interrupted by stop)
//!     → still active and not paused? step()
//! ```
//!
//! # Design Decisions
//! - Each tick is one iteration of the underlying `Worker`, so a
//!   synchronized start returns after the first step ran, or as soon as
//!   the thread is up when it starts paused
//! - First tick fires immediately; a step slower than the interval makes
//!   the next tick fire with no sleep, ticks never queue up
//! - Frequency changes apply from the next sleep on
//! - An in-progress step is never interrupted

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::observability::metrics;
use crate::sync::Waitable;
use crate::worker::worker::StartSignal;
use crate::worker::{Clock, Runnable, SteadyClock, ThreadRegistry, Worker};

struct StepState {
    interval_nanos: AtomicU64,
    active: AtomicBool,
    paused: AtomicBool,
    ticks: AtomicU64,
    pause_waitable: Waitable,
    sleep_waitable: Waitable,
    last_tick: Mutex<Option<Duration>>,
    step: Mutex<Option<Arc<dyn Runnable>>>,
    name: Mutex<String>,
    clock: Arc<dyn Clock>,
    start_signal: StartSignal,
}

impl StepState {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn interval(&self) -> Duration {
        Duration::from_nanos(self.interval_nanos.load(Ordering::SeqCst))
    }

    fn tick(&self) -> bool {
        if self.is_paused() {
            self.start_signal.release();
        }
        self.pause_waitable
            .wait(|| !self.is_paused() || !self.is_active());
        if !self.is_active() {
            return false;
        }

        let mut last_tick = lock(&self.last_tick);
        if let Some(last) = *last_tick {
            let elapsed = self.clock.now().saturating_sub(last);
            let sleep = self.interval().saturating_sub(elapsed);
            if !sleep.is_zero() {
                self.sleep_waitable.wait_for(sleep, || !self.is_active());
            }
        }
        if !self.is_active() {
            return false;
        }
        if self.is_paused() {
            return true;
        }
        *last_tick = Some(self.clock.now());
        drop(last_tick);

        let Some(step) = lock(&self.step).clone() else {
            return false;
        };
        self.ticks.fetch_add(1, Ordering::SeqCst);
        metrics::record_step_tick(&lock(&self.name));
        step.run()
    }

    fn wake(&self) {
        {
            let _guard = self.pause_waitable.guard();
            self.pause_waitable.notify_all();
        }
        let _guard = self.sleep_waitable.guard();
        self.sleep_waitable.notify_all();
    }
}

/// Worker invoking a step function at a configurable frequency.
pub struct StepWorker {
    worker: Worker,
    state: Arc<StepState>,
}

impl StepWorker {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SteadyClock::new()))
    }

    /// Create a step worker measuring step durations with `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let worker = Worker::new();
        let state = Arc::new(StepState {
            interval_nanos: AtomicU64::new(0),
            active: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            ticks: AtomicU64::new(0),
            pause_waitable: Waitable::new(),
            sleep_waitable: Waitable::new(),
            last_tick: Mutex::new(None),
            step: Mutex::new(None),
            name: Mutex::new(String::new()),
            clock,
            start_signal: worker.start_signal(),
        });
        let tick_state = Arc::clone(&state);
        worker.set_method(move || tick_state.tick());
        Self { worker, state }
    }

    pub fn with_method<F>(method: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        let worker = Self::new();
        worker.set_method(method);
        worker
    }

    /// Step function. Returning `false` ends the worker loop.
    pub fn set_runnable(&self, runnable: Arc<dyn Runnable>) {
        *lock(&self.state.step) = Some(runnable);
    }

    pub fn set_method<F>(&self, method: F)
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.set_runnable(Arc::new(method));
    }

    /// Set the step frequency in Hz. Rejects zero, negative and
    /// non-finite values.
    pub fn set_frequency(&self, hz: f64) -> bool {
        if !hz.is_finite() || hz <= 0.0 {
            tracing::error!(frequency = hz, "Step worker frequency must be positive");
            return false;
        }
        let nanos = (1e9 / hz).round().clamp(1.0, u64::MAX as f64) as u64;
        self.state.interval_nanos.store(nanos, Ordering::SeqCst);
        true
    }

    /// Configured frequency in Hz, 0 when unset.
    pub fn frequency(&self) -> f64 {
        match self.state.interval_nanos.load(Ordering::SeqCst) {
            0 => 0.0,
            nanos => 1e9 / nanos as f64,
        }
    }

    /// Time between two tick starts.
    pub fn interval(&self) -> Duration {
        self.state.interval()
    }

    /// Called on the worker thread before the first tick.
    pub fn set_callback_setup<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.worker.set_callback_setup(callback);
    }

    /// Called on the worker thread right before it exits.
    pub fn set_callback_teardown<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.worker.set_callback_teardown(callback);
    }

    /// Called on the stopping thread after the loop was woken, before the join.
    pub fn set_callback_stop<F>(&self, callback: F)
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.worker.set_callback_stop(callback);
    }

    pub fn set_thread_registry(&self, registry: Arc<ThreadRegistry>) {
        self.worker.set_thread_registry(registry);
    }

    /// Spawn the stepping thread. Fails if no frequency is configured.
    pub fn start_worker(&self, name: &str) -> bool {
        self.start(name, false)
    }

    /// Spawn the stepping thread and wait for the first tick, or only for
    /// the thread to come up when paused.
    pub fn start_sync_worker(&self, name: &str) -> bool {
        self.start(name, true)
    }

    /// Stop stepping, interrupting any sleep or pause, and join.
    pub fn stop_worker(&self) -> bool {
        {
            let _guard = self.state.pause_waitable.guard();
            self.state.active.store(false, Ordering::SeqCst);
        }
        self.state.wake();
        self.worker.stop_worker()
    }

    /// Suspend stepping after the current tick.
    pub fn pause_worker(&self) {
        let _guard = self.state.pause_waitable.guard();
        self.state.paused.store(true, Ordering::SeqCst);
    }

    /// Resume stepping immediately.
    pub fn resume_worker(&self) {
        let _guard = self.state.pause_waitable.guard();
        self.state.paused.store(false, Ordering::SeqCst);
        self.state.pause_waitable.notify_all();
    }

    pub fn is_paused(&self) -> bool {
        self.state.is_paused()
    }

    pub fn is_worker_running(&self) -> bool {
        self.worker.is_worker_running()
    }

    pub fn is_worker_started(&self) -> bool {
        self.worker.is_worker_started()
    }

    /// Number of steps executed since creation.
    pub fn ticks(&self) -> u64 {
        self.state.ticks.load(Ordering::SeqCst)
    }

    fn start(&self, name: &str, synchronised: bool) -> bool {
        if self.worker.is_worker_started() {
            return true;
        }
        if self.state.interval_nanos.load(Ordering::SeqCst) == 0 {
            tracing::error!(worker = %name, "Step worker has no frequency configured");
            return false;
        }

        *lock(&self.state.last_tick) = None;
        *lock(&self.state.name) = name.to_string();
        self.state.active.store(true, Ordering::SeqCst);

        let started = if synchronised {
            self.worker.start_sync_worker(name)
        } else {
            self.worker.start_worker(name)
        };
        if !started {
            self.state.active.store(false, Ordering::SeqCst);
        }
        started
    }
}

impl Default for StepWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StepWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepWorker")
            .field("worker", &self.worker)
            .field("frequency", &self.frequency())
            .field("paused", &self.is_paused())
            .field("ticks", &self.ticks())
            .finish()
    }
}

impl Drop for StepWorker {
    fn drop(&mut self) {
        // Wake the loop first so the worker's own drop can join.
        self.stop_worker();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
