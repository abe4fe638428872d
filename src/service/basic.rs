//! Generic service driven by user hooks.

use crate::lifecycle::{Operation, ServiceController};
use crate::observability::metrics;
use crate::service::core::ServiceCore;
use crate::service::observer::ServiceStateSubscription;
use crate::service::Service;

/// User behavior of a service.
///
/// Every hook defaults to success; only `is_running` must be provided.
pub trait ServiceHooks: Send + Sync {
    fn is_running(&self) -> bool;

    fn on_setup(&self) -> bool {
        true
    }

    fn on_init(&self) -> bool {
        true
    }

    fn on_start(&self) -> bool {
        true
    }

    fn on_stop(&self) -> bool {
        true
    }

    fn on_reset(&self) -> bool {
        true
    }
}

/// A service that routes each lifecycle operation to its hooks.
///
/// Without a controller every operation reaches the hook.
#[derive(Debug)]
pub struct BasicService<H> {
    core: ServiceCore,
    hooks: H,
}

impl<H: ServiceHooks> BasicService<H> {
    pub fn new(name: &str, hooks: H) -> Self {
        Self {
            core: ServiceCore::new(name),
            hooks,
        }
    }

    pub fn with_controller<C>(name: &str, hooks: H, controller: C) -> Self
    where
        C: ServiceController + 'static,
    {
        Self {
            core: ServiceCore::with_controller(name, controller),
            hooks,
        }
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn core(&self) -> &ServiceCore {
        &self.core
    }
}

impl<H: ServiceHooks> Service for BasicService<H> {
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
        let started = self.core.run_operation(Operation::Start, || self.hooks.on_start());
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{FullServiceController, State};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        running: AtomicBool,
        calls: AtomicUsize,
        fail_start: AtomicBool,
    }

    impl ServiceHooks for Counting {
        fn is_running(&self) -> bool {
            self.running.load(Ordering::SeqCst)
        }

        fn on_start(&self) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_start.load(Ordering::SeqCst) {
                return false;
            }
            self.running.store(true, Ordering::SeqCst);
            true
        }

        fn on_stop(&self) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.running.store(false, Ordering::SeqCst);
            true
        }
    }

    #[test]
    fn test_no_controller_passes_everything() {
        let service = BasicService::new("plain", Counting::default());
        assert!(service.start());
        assert!(service.start());
        assert!(service.stop());
        assert!(service.reset());
        assert_eq!(service.hooks().calls.load(Ordering::SeqCst), 3);
        assert!(service.service_ctrl().is_none());
        assert_eq!(service.state(), None);
        assert_eq!(service.core().notifications(), 4);
    }

    #[test]
    fn test_rejected_operation_skips_hook() {
        let service = BasicService::with_controller("full", Counting::default(), FullServiceController::new());
        assert!(!service.start());
        assert_eq!(service.hooks().calls.load(Ordering::SeqCst), 0);
        assert_eq!(service.state(), Some(State::None));

        assert!(service.setup());
        assert!(service.init());
        assert!(service.start());
        assert_eq!(service.state(), Some(State::Running));
        assert!(service.is_running());
    }

    #[test]
    fn test_failed_hook_not_published() {
        let service = BasicService::new("failing", Counting::default());
        let mut sub = service.service_state();
        service.hooks().fail_start.store(true, Ordering::SeqCst);
        assert!(!service.start());
        assert!(sub.try_recv().is_none());

        service.hooks().fail_start.store(false, Ordering::SeqCst);
        assert!(service.start());
        let event = sub.try_recv().expect("start event");
        assert_eq!(event.operation, Operation::Start);
        assert_eq!(event.service, "failing");
    }
}
