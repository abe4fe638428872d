//! Service whose start hook blocks for its whole activity.
//!
//! `start()` does not return until `on_start` returns, which is normally
//! when another thread calls `stop()`. Other threads use [`Readiness`] to
//! learn when the activity is actually under way.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::lifecycle::{BlockingServiceController, Operation, ServiceController};
use crate::observability::metrics;
use crate::service::basic::ServiceHooks;
use crate::service::core::ServiceCore;
use crate::service::observer::ServiceStateSubscription;
use crate::service::Service;
use crate::sync::Waitable;

#[derive(Debug, Default)]
struct ReadinessState {
    ready: AtomicBool,
    waitable: Waitable,
}

/// Ready flag shared between a blocking service and its hooks.
///
/// The hooks call [`Readiness::service_set_ready`] from inside `on_start`
/// once the activity is live.
#[derive(Debug, Clone, Default)]
pub struct Readiness {
    state: Arc<ReadinessState>,
}

impl Readiness {
    pub fn service_set_ready(&self) {
        let _guard = self.state.waitable.guard();
        self.state.ready.store(true, Ordering::SeqCst);
        self.state.waitable.notify_all();
    }

    pub fn is_ready(&self) -> bool {
        self.state.ready.load(Ordering::SeqCst)
    }

    /// Wait until ready. Returns `false` if `timeout` elapsed first.
    pub fn wait_ready(&self, timeout: Duration) -> bool {
        let state = &self.state;
        state.waitable.wait_for(timeout, || state.ready.load(Ordering::SeqCst))
    }

    fn clear(&self) {
        let _guard = self.state.waitable.guard();
        self.state.ready.store(false, Ordering::SeqCst);
    }
}

/// Blocking service over a [`BlockingServiceController`].
#[derive(Debug)]
pub struct BlockingService<H> {
    core: ServiceCore,
    hooks: H,
    readiness: Readiness,
    wait_stop: AtomicBool,
    starting: AtomicBool,
    start_done: Waitable,
}

impl<H: ServiceHooks> BlockingService<H> {
    /// `build` receives the readiness handle the hooks signal through.
    pub fn new<F>(name: &str, build: F) -> Self
    where
        F: FnOnce(Readiness) -> H,
    {
        let readiness = Readiness::default();
        Self {
            core: ServiceCore::with_controller(name, BlockingServiceController::new()),
            hooks: build(readiness.clone()),
            readiness,
            wait_stop: AtomicBool::new(false),
            starting: AtomicBool::new(false),
            start_done: Waitable::new(),
        }
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Make `stop()` also wait until the blocked `start()` has returned.
    pub fn set_service_wait_stop(&self, active: bool) {
        self.wait_stop.store(active, Ordering::SeqCst);
    }

    pub fn service_set_ready(&self) {
        self.readiness.service_set_ready();
    }

    pub fn wait_ready(&self, timeout: Duration) -> bool {
        self.readiness.wait_ready(timeout)
    }

    pub fn is_ready(&self) -> bool {
        self.readiness.is_ready()
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness.clone()
    }

    fn set_starting(&self, starting: bool) {
        let _guard = self.start_done.guard();
        self.starting.store(starting, Ordering::SeqCst);
        self.start_done.notify_all();
    }
}

impl<H: ServiceHooks> Service for BlockingService<H> {
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
        let started = self.core.run_operation(Operation::Start, || {
            self.readiness.clear();
            self.set_starting(true);
            metrics::record_service_running(self.core.name(), true);
            let ran = self.hooks.on_start();
            self.readiness.clear();
            self.set_starting(false);
            ran
        });
        metrics::record_service_running(self.core.name(), self.hooks.is_running());
        started
    }

    fn stop(&self) -> bool {
        let stopped = self.core.run_operation(Operation::Stop, || self.hooks.on_stop());
        if stopped && self.wait_stop.load(Ordering::SeqCst) {
            self.start_done.wait(|| !self.starting.load(Ordering::SeqCst));
        }
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
