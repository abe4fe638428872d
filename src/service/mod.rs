//! Service façades.
//!
//! # Data Flow
//! ```text
//! caller ──start()──▶ Service
//!                       │
//!                       ▼
//!                  ServiceCore::run_operation
//!                       │ op_start (controller may refuse → false, warn)
//!                       ▼
//!                  hooks.on_start()        (user code, no lock held)
//!                       │
//!                       ▼ op_end(success)
//!                  ServiceStateNotifier ──▶ ServiceStateSubscription (observers)
//! ```
//!
//! # Design Decisions
//! - User behavior is a hooks value, the façade owns the controller
//! - Observers receive events only for accepted operations that succeeded
//! - Handles a hook needs (readiness, thread-start notification) are
//!   handed to the closure that builds the hooks, so no back-reference
//!   to the service is required

pub mod basic;
pub mod blocking;
pub mod core;
pub mod observer;
pub mod step_worker_service;
pub mod threaded;
pub mod worker_service;

pub use self::core::ServiceCore;
pub use basic::{BasicService, ServiceHooks};
pub use blocking::{BlockingService, Readiness};
pub use observer::{ServiceEvent, ServiceStateSubscription};
pub use step_worker_service::{StepWorkHooks, StepWorkerService};
pub use threaded::{ThreadStarter, ThreadedService};
pub use worker_service::{WorkHooks, WorkerService};

use crate::lifecycle::{ServiceController, State};

/// Uniform lifecycle surface of every service.
///
/// Each operation returns `true` on success. When a controller is
/// attached and refuses the operation, the hook is not called and the
/// operation returns `false`.
pub trait Service: Send + Sync {
    fn name(&self) -> &str;

    fn setup(&self) -> bool;

    fn init(&self) -> bool;

    fn start(&self) -> bool;

    fn stop(&self) -> bool;

    fn reset(&self) -> bool;

    /// Whether the service's activity is currently running, as reported
    /// by its hooks.
    fn is_running(&self) -> bool;

    /// Read-only access to the attached controller.
    fn service_ctrl(&self) -> Option<&dyn ServiceController>;

    /// Subscribe to successful lifecycle transitions.
    fn service_state(&self) -> ServiceStateSubscription;

    /// Controller state, `None` when no controller is attached.
    fn state(&self) -> Option<State> {
        self.service_ctrl().map(|ctrl| ctrl.state())
    }
}
