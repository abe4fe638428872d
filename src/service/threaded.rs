//! Service whose start hook spawns threads and returns.
//!
//! With synchronised start, `start()` returns only after every spawned
//! thread has called [`ThreadStarter::notify_service_thread_started`].

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::lifecycle::{Operation, ServiceController, ThreadedServiceController};
use crate::observability::metrics;
use crate::service::basic::ServiceHooks;
use crate::service::core::ServiceCore;
use crate::service::observer::ServiceStateSubscription;
use crate::service::Service;
use crate::sync::Synchronizer;

/// Handle the spawned threads use to report that they are up.
#[derive(Debug, Clone)]
pub struct ThreadStarter {
    synchro: Arc<Synchronizer>,
}

impl ThreadStarter {
    /// Join the start rendezvous. No-op unless a synchronised start is in
    /// progress.
    pub fn notify_service_thread_started(&self) {
        self.synchro.sync();
    }
}

/// Threaded service over a [`ThreadedServiceController`].
#[derive(Debug)]
pub struct ThreadedService<H> {
    core: ServiceCore,
    hooks: H,
    synchro: Arc<Synchronizer>,
    synchronised: AtomicBool,
    nb_threads: AtomicUsize,
}

impl<H: ServiceHooks> ThreadedService<H> {
    /// `build` receives the handle the spawned threads notify through.
    pub fn new<F>(name: &str, build: F) -> Self
    where
        F: FnOnce(ThreadStarter) -> H,
    {
        let synchro = Arc::new(Synchronizer::new());
        let starter = ThreadStarter {
            synchro: Arc::clone(&synchro),
        };
        Self {
            core: ServiceCore::with_controller(name, ThreadedServiceController::new()),
            hooks: build(starter),
            synchro,
            synchronised: AtomicBool::new(false),
            nb_threads: AtomicUsize::new(1),
        }
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn set_start_synchronised(&self, active: bool) {
        self.synchronised.store(active, Ordering::SeqCst);
    }

    pub fn start_synchronised(&self) -> bool {
        self.synchronised.load(Ordering::SeqCst)
    }

    /// Number of threads `on_start` spawns, used by synchronised start.
    pub fn set_service_nb_thread(&self, nb: usize) {
        self.nb_threads.store(nb, Ordering::SeqCst);
    }

    pub fn service_nb_thread(&self) -> usize {
        self.nb_threads.load(Ordering::SeqCst)
    }

    pub fn notify_service_thread_started(&self) {
        self.synchro.sync();
    }

    fn start_threads(&self) -> bool {
        let synchronised = self.start_synchronised();
        if synchronised {
            self.synchro.init_sync(self.service_nb_thread() + 1);
        }
        let started = self.hooks.on_start();
        if synchronised {
            if started {
                self.synchro.sync();
            }
            self.synchro.reset();
        }
        started
    }
}

impl<H: ServiceHooks> Service for ThreadedService<H> {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn setup(&self) -> bool {
        self.core.run_operation(Operation::Setup, || self.hooks.on_setup())
    }

    fn init(&self) -> bool {
        self.core.run_operation(Operation::Init, || self.hooks.on_init())
    }

    fn start(&self) -> bool {
        let started = self.core.run_operation(Operation::Start, || self.start_threads());
        metrics::record_service_running(self.core.name(), self.hooks.is_running());
        started
    }

    fn stop(&self) -> bool {
        let stopped = self.core.run_operation(Operation::Stop, || self.hooks.on_stop());
        metrics::record_service_running(self.core.name(), self.hooks.is_running());
        stopped
    }

    fn reset(&self) -> bool {
        self.core.run_operation(Operation::Reset, || self.hooks.on_reset())
    }

    fn is_running(&self) -> bool {
        self.hooks.is_running()
    }

    fn service_ctrl(&self) -> Option<&dyn ServiceController> {
        self.core.controller()
    }

    fn service_state(&self) -> ServiceStateSubscription {
        self.core.subscribe()
    }
}
