//! Thread synchronization primitives.
//!
//! # Data Flow
//! ```text
//! Waitable (waitable.rs):
//!     guard() → mutate predicate state → notify()/notify_all()
//!     wait*(predicate) → released when predicate holds or on timeout
//!
//! Synchronizer (synchronizer.rs):
//!     init_sync(N) → N parties call sync() → last arrival releases the round
//!     reset() → releases stragglers, party count back to 0
//! ```
//!
//! # Design Decisions
//! - Waitable carries no state of its own; callers keep predicate state in
//!   atomics and mutate it under `guard()` to avoid lost wakeups
//! - Synchronizer is reused for every rendezvous (worker sync start,
//!   threaded service start) instead of one-off barriers
//! - No operation here fails; they are building blocks, not services

pub mod synchronizer;
pub mod waitable;

pub use synchronizer::Synchronizer;
pub use waitable::Waitable;
