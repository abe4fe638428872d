//! Threaded service running its work at a fixed frequency on a
//! [`StepWorker`].

use std::fmt;
use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::lifecycle::ServiceController;
use crate::service::basic::ServiceHooks;
use crate::service::observer::ServiceStateSubscription;
use crate::service::threaded::ThreadedService;
use crate::service::Service;
use crate::worker::{StepWorker, ThreadRegistry};

/// Work performed by a [`StepWorkerService`].
///
/// `on_work_setup` and `on_work_teardown` run on the stepping thread,
/// `on_work_stop` on the thread calling `stop()`.
pub trait StepWorkHooks: Send + Sync + 'static {
    fn on_work_setup(&self) {}

    /// One step. Returning `false` ends the stepping loop.
    fn on_work_start(&self) -> bool;

    fn on_work_stop(&self) -> bool {
        true
    }

    fn on_work_teardown(&self) {}
}

struct StepDriver<H> {
    name: String,
    work: Arc<H>,
    step_worker: StepWorker,
}

impl<H: StepWorkHooks> ServiceHooks for StepDriver<H> {
    fn is_running(&self) -> bool {
        self.step_worker.is_worker_running()
    }

    fn on_start(&self) -> bool {
        self.step_worker.start_worker(&self.name)
    }

    fn on_stop(&self) -> bool {
        self.step_worker.stop_worker()
    }
}

/// Service whose activity is [`StepWorkHooks::on_work_start`] called at
/// the configured frequency.
pub struct StepWorkerService<H> {
    service: ThreadedService<StepDriver<H>>,
}

impl<H: StepWorkHooks> StepWorkerService<H> {
    pub fn new(name: &str, work: H) -> Self {
        Self::with_step_worker(name, work, StepWorker::new())
    }

    /// Build over a caller-provided step worker, e.g. one with a custom
    /// clock.
    pub fn with_step_worker(name: &str, work: H, step_worker: StepWorker) -> Self {
        let work = Arc::new(work);
        let service = ThreadedService::new(name, |starter| {
            let step = Arc::clone(&work);
            step_worker.set_method(move || step.on_work_start());
            let setup = Arc::clone(&work);
            step_worker.set_callback_setup(move || {
                setup.on_work_setup();
                starter.notify_service_thread_started();
            });
            let teardown = Arc::clone(&work);
            step_worker.set_callback_teardown(move || teardown.on_work_teardown());
            let stopper = Arc::clone(&work);
            step_worker.set_callback_stop(move || stopper.on_work_stop());
            StepDriver {
                name: name.to_string(),
                work,
                step_worker,
            }
        });
        service.set_service_nb_thread(1);
        Self { service }
    }

    pub fn work(&self) -> &H {
        &self.service.hooks().work
    }

    pub fn step_worker(&self) -> &StepWorker {
        &self.service.hooks().step_worker
    }

    /// Returns `false` and keeps the previous frequency when `hz` is not
    /// strictly positive.
    pub fn set_step_frequency(&self, hz: f64) -> bool {
        self.step_worker().set_frequency(hz)
    }

    pub fn frequency(&self) -> f64 {
        self.step_worker().frequency()
    }

    pub fn set_start_synchronised(&self, active: bool) {
        self.service.set_start_synchronised(active);
    }

    pub fn set_thread_registry(&self, registry: Arc<ThreadRegistry>) {
        self.step_worker().set_thread_registry(registry);
    }

    pub fn pause_work(&self) {
        self.step_worker().pause_worker();
    }

    pub fn resume_work(&self) {
        self.step_worker().resume_worker();
    }

    pub fn is_paused(&self) -> bool {
        self.step_worker().is_paused()
    }

    /// Steps executed so far.
    pub fn ticks(&self) -> u64 {
        self.step_worker().ticks()
    }

    /// Apply frequency, start mode and pause state from `config`.
    ///
    /// Safe while running: a new frequency applies from the next sleep.
    pub fn apply_config(&self, config: &ServiceConfig) -> bool {
        if !self.set_step_frequency(config.frequency_hz) {
            return false;
        }
        self.set_start_synchronised(config.start_synchronised);
        if config.start_paused {
            self.pause_work();
        } else if self.is_paused() {
            self.resume_work();
        }
        tracing::debug!(
            service = %self.name(),
            frequency_hz = config.frequency_hz,
            paused = config.start_paused,
            "Applied service configuration"
        );
        true
    }
}

impl<H: StepWorkHooks> Service for StepWorkerService<H> {
    fn name(&self) -> &str {
        self.service.name()
    }

    fn setup(&self) -> bool {
        self.service.setup()
    }

    fn init(&self) -> bool {
        self.service.init()
    }

    fn start(&self) -> bool {
        self.service.start()
    }

    fn stop(&self) -> bool {
        self.service.stop()
    }

    fn reset(&self) -> bool {
        self.service.reset()
    }

    fn is_running(&self) -> bool {
        self.service.is_running()
    }

    fn service_ctrl(&self) -> Option<&dyn ServiceController> {
        self.service.service_ctrl()
    }

    fn service_state(&self) -> ServiceStateSubscription {
        self.service.service_state()
    }
}

impl<H: StepWorkHooks> fmt::Debug for StepWorkerService<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let driver = self.service.hooks();
        f.debug_struct("StepWorkerService")
            .field("name", &driver.name)
            .field("step_worker", &driver.step_worker)
            .finish()
    }
}
