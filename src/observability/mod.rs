//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! lifecycle core, workers, daemon:
//!     → tracing macros → logging.rs (EnvFilter + fmt subscriber)
//!     → metrics.rs helpers → metrics facade → Prometheus exporter (optional)
//! ```
//!
//! # Design Decisions
//! - The library never installs a subscriber or recorder; the daemon does
//! - Without a recorder every metric update is a no-op
//! - Label sets stay small: service, operation, outcome, worker

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LoggingError};
