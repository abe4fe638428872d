//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Transition rules:
//!     operation.rs      (Operation, State)
//!     state_machine.rs  ((state, event) → state table, rejects the rest)
//!     controller.rs     (blocking / threaded / full policies over the table)
//!
//! Process lifecycle (used by the daemon):
//!     startup.rs   start services in order, roll back on failure
//!     signals.rs   SIGTERM/SIGINT → shutdown, SIGHUP → reload
//!     shutdown.rs  broadcast shutdown to every waiting task
//! ```
//!
//! # Design Decisions
//! - Transitions are declared as data, never as branching code
//! - Controller state is written only inside op_start/op_end
//! - Ordered startup, reverse-ordered shutdown

pub mod controller;
pub mod operation;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state_machine;

pub use controller::{
    BlockingServiceController, FullServiceController, FullServiceControllerBuilder, ServiceController,
    ThreadedServiceController,
};
pub use operation::{Operation, State};
pub use shutdown::Shutdown;
pub use startup::{ServiceGroup, StartError};
pub use state_machine::{StateMachine, TransitionTable};
