//! Shared lifecycle plumbing of every service façade.

use std::fmt;

use crate::lifecycle::{Operation, ServiceController, State};
use crate::observability::metrics;
use crate::service::observer::{ServiceStateNotifier, ServiceStateSubscription};

/// Name, optional controller and state notifier of a service.
///
/// `run_operation` is the single code path through which a lifecycle
/// method reaches its hook.
pub struct ServiceCore {
    name: String,
    controller: Option<Box<dyn ServiceController>>,
    notifier: ServiceStateNotifier,
}

impl ServiceCore {
    /// Core without controller: every operation reaches its hook.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            controller: None,
            notifier: ServiceStateNotifier::new(name),
        }
    }

    pub fn with_controller<C>(name: &str, controller: C) -> Self
    where
        C: ServiceController + 'static,
    {
        Self {
            controller: Some(Box::new(controller)),
            ..Self::new(name)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn controller(&self) -> Option<&dyn ServiceController> {
        self.controller.as_deref()
    }

    pub fn state(&self) -> Option<State> {
        self.controller.as_ref().map(|ctrl| ctrl.state())
    }

    pub fn subscribe(&self) -> ServiceStateSubscription {
        self.notifier.subscribe()
    }

    /// Number of successful operations published so far.
    pub fn notifications(&self) -> u64 {
        self.notifier.notifications()
    }

    /// Validate `op` against the controller, run `hook` and report its
    /// outcome.
    ///
    /// The hook runs without any core lock held, so it may block or call
    /// back into the service.
    pub fn run_operation<F>(&self, op: Operation, hook: F) -> bool
    where
        F: FnOnce() -> bool,
    {
        if let Some(ctrl) = &self.controller {
            if !ctrl.op_start(op) {
                tracing::warn!(
                    service = %self.name,
                    operation = %op,
                    state = %ctrl.state(),
                    "Cannot change service state"
                );
                metrics::record_rejected(&self.name, op);
                return false;
            }
        }

        let success = hook();

        if let Some(ctrl) = &self.controller {
            ctrl.op_end(op, success);
        }
        metrics::record_operation(&self.name, op, success);
        if success {
            self.notifier.publish(op, self.state());
        } else {
            tracing::warn!(service = %self.name, operation = %op, "Service operation failed");
        }
        success
    }
}

impl fmt::Debug for ServiceCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCore")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}
