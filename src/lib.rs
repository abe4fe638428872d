//! Service lifecycle and worker orchestration library.
//!
//! # Architecture Overview
//!
//! ```text
//!   caller ──▶ service ──(op_start/op_end)──▶ lifecycle::controller
//!                 │                                   │
//!                 │ hooks                             ▼
//!                 ▼                           lifecycle::state_machine
//!              worker (Worker / StepWorker)
//!                 │
//!                 ▼
//!              sync (Waitable / Synchronizer)
//!
//!   Cross-cutting: config (TOML + hot reload), observability (tracing, metrics)
//! ```

// Primitives
pub mod sync;
pub mod worker;

// Lifecycle rules and services
pub mod lifecycle;
pub mod service;

// Cross-cutting concerns
pub mod config;
pub mod observability;

pub use config::RuntimeConfig;
pub use lifecycle::{Operation, ServiceController, ServiceGroup, Shutdown, State};
pub use service::{
    BasicService, BlockingService, Service, ServiceHooks, StepWorkHooks, StepWorkerService, ThreadedService,
    WorkHooks, WorkerService,
};
pub use sync::{Synchronizer, Waitable};
pub use worker::{StepWorker, Worker};
