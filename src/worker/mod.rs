//! Background worker threads.
//!
//! # Data Flow
//! ```text
//! Worker (worker.rs):
//!     start_worker(name) → spawn thread → setup → loop runnable → teardown
//!     stop_worker() → clear started → stop callback → join
//!
//! StepWorker (step_worker.rs):
//!     one Worker iteration per tick: pause wait → interruptible sleep → step()
//!
//! Support:
//!     clock.rs     (monotonic time source, injectable)
//!     registry.rs  (names of live worker threads, owned by the process)
//! ```
//!
//! # Design Decisions
//! - Cooperative cancellation only: stop flags and interruptible sleeps,
//!   never forced termination
//! - Spawn failures are reported as `false`, no handle is kept
//! - Clock and thread registry are injected, no ambient statics

pub mod clock;
pub mod registry;
pub mod step_worker;
#[allow(clippy::module_inception)]
pub mod worker;

pub use clock::{Clock, ManualClock, SteadyClock};
pub use registry::ThreadRegistry;
pub use step_worker::StepWorker;
pub use worker::{Runnable, Worker};
