//! Threaded service running its work on a single [`Worker`] thread.

use std::fmt;
use std::sync::Arc;

use crate::lifecycle::ServiceController;
use crate::service::basic::ServiceHooks;
use crate::service::observer::ServiceStateSubscription;
use crate::service::threaded::ThreadedService;
use crate::service::Service;
use crate::worker::{ThreadRegistry, Worker};

/// Work performed by a [`WorkerService`].
pub trait WorkHooks: Send + Sync + 'static {
    /// Body of the worker thread. Called again while it returns `true`.
    fn on_work_start(&self) -> bool;

    /// Called on `stop()`, before the worker thread is joined. Must make
    /// `on_work_start` return `false` soon.
    fn on_work_stop(&self) -> bool {
        true
    }
}

struct WorkerDriver<H> {
    name: String,
    work: Arc<H>,
    worker: Worker,
}

impl<H: WorkHooks> ServiceHooks for WorkerDriver<H> {
    fn is_running(&self) -> bool {
        self.worker.is_worker_running()
    }

    fn on_start(&self) -> bool {
        self.worker.start_worker(&self.name)
    }

    fn on_stop(&self) -> bool {
        self.worker.stop_worker()
    }
}

/// Service whose activity is one worker thread executing
/// [`WorkHooks::on_work_start`].
pub struct WorkerService<H> {
    service: ThreadedService<WorkerDriver<H>>,
}

impl<H: WorkHooks> WorkerService<H> {
    pub fn new(name: &str, work: H) -> Self {
        let work = Arc::new(work);
        let service = ThreadedService::new(name, |starter| {
            let worker = Worker::new();
            let body = Arc::clone(&work);
            worker.set_method(move || body.on_work_start());
            worker.set_callback_setup(move || starter.notify_service_thread_started());
            let stopper = Arc::clone(&work);
            worker.set_callback_stop(move || stopper.on_work_stop());
            WorkerDriver {
                name: name.to_string(),
                work,
                worker,
            }
        });
        service.set_service_nb_thread(1);
        Self { service }
    }

    pub fn work(&self) -> &H {
        &self.service.hooks().work
    }

    pub fn worker(&self) -> &Worker {
        &self.service.hooks().worker
    }

    /// Make `start()` return only once the worker thread is up.
    pub fn set_start_synchronised(&self, active: bool) {
        self.service.set_start_synchronised(active);
    }

    pub fn set_thread_registry(&self, registry: Arc<ThreadRegistry>) {
        self.worker().set_thread_registry(registry);
    }
}

impl<H: WorkHooks> Service for WorkerService<H> {
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

impl<H: WorkHooks> fmt::Debug for WorkerService<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let driver = self.service.hooks();
        f.debug_struct("WorkerService")
            .field("name", &driver.name)
            .field("worker", &driver.worker)
            .finish()
    }
}
