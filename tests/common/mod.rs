//! Shared hooks and timing helpers for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use service_lifecycle::service::{ServiceHooks, ThreadStarter};
use service_lifecycle::sync::Waitable;

/// Poll `predicate` every millisecond until it holds or `timeout` passes.
pub fn wait_until<F>(timeout: Duration, mut predicate: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if predicate() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    predicate()
}

/// Hooks counting every call, with switchable failures.
#[derive(Debug, Default)]
pub struct CountingHooks {
    pub running: AtomicBool,
    pub setups: AtomicUsize,
    pub inits: AtomicUsize,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub resets: AtomicUsize,
    pub fail_start: AtomicBool,
}

impl CountingHooks {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn set_fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }
}

impl ServiceHooks for CountingHooks {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn on_setup(&self) -> bool {
        self.setups.fetch_add(1, Ordering::SeqCst);
        true
    }

    fn on_init(&self) -> bool {
        self.inits.fetch_add(1, Ordering::SeqCst);
        true
    }

    fn on_start(&self) -> bool {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_start.load(Ordering::SeqCst) {
            return false;
        }
        self.running.store(true, Ordering::SeqCst);
        true
    }

    fn on_stop(&self) -> bool {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
        true
    }

    fn on_reset(&self) -> bool {
        self.resets.fetch_add(1, Ordering::SeqCst);
        true
    }
}

/// Threaded hooks spawning one background thread per start.
///
/// The thread sleeps briefly before notifying, so a synchronised start
/// that returns early is observable.
pub struct SpawningHooks {
    starter: ThreadStarter,
    pub spawned: AtomicUsize,
    pub notified: Arc<AtomicUsize>,
    stop: Arc<AtomicBool>,
    signal: Arc<Waitable>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SpawningHooks {
    pub fn new(starter: ThreadStarter) -> Self {
        Self {
            starter,
            spawned: AtomicUsize::new(0),
            notified: Arc::new(AtomicUsize::new(0)),
            stop: Arc::new(AtomicBool::new(false)),
            signal: Arc::new(Waitable::new()),
            handle: Mutex::new(None),
        }
    }

    pub fn spawned(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }

    pub fn notified(&self) -> usize {
        self.notified.load(Ordering::SeqCst)
    }
}

impl ServiceHooks for SpawningHooks {
    fn is_running(&self) -> bool {
        self.handle.lock().unwrap().is_some()
    }

    fn on_start(&self) -> bool {
        self.stop.store(false, Ordering::SeqCst);
        self.spawned.fetch_add(1, Ordering::SeqCst);
        let starter = self.starter.clone();
        let notified = Arc::clone(&self.notified);
        let stop = Arc::clone(&self.stop);
        let signal = Arc::clone(&self.signal);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            notified.fetch_add(1, Ordering::SeqCst);
            starter.notify_service_thread_started();
            signal.wait(|| stop.load(Ordering::SeqCst));
        });
        *self.handle.lock().unwrap() = Some(handle);
        true
    }

    fn on_stop(&self) -> bool {
        {
            let _guard = self.signal.guard();
            self.stop.store(true, Ordering::SeqCst);
            self.signal.notify_all();
        }
        match self.handle.lock().unwrap().take() {
            Some(handle) => handle.join().is_ok(),
            None => true,
        }
    }
}
