//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, all errors collected)
//!     → RuntimeConfig (validated)
//!     → daemon builds one StepWorkerService per ServiceConfig
//!
//! On file change or SIGHUP:
//!     watcher.rs reloads and validates
//!     → mpsc channel → daemon
//!     → StepWorkerService::apply_config on running services
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - An invalid reload is dropped, the running configuration stays

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{ObservabilityConfig, RuntimeConfig, ServiceConfig, ShutdownConfig};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;
