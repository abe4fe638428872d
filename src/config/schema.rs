//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every section has defaults so a minimal file is valid.

use serde::{Deserialize, Serialize};

/// Root configuration of the lifecycle daemon.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Shutdown behavior.
    pub shutdown: ShutdownConfig,

    /// Stepped services run by the daemon.
    pub services: Vec<ServiceConfig>,
}

impl RuntimeConfig {
    pub fn service(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.iter().find(|s| s.name == name)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level or filter directives (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Upper bound on how long stopping all services may take.
    pub grace_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self { grace_secs: 10 }
    }
}

/// One stepped service.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Unique service name, also the worker thread name.
    pub name: String,

    /// Steps per second.
    pub frequency_hz: f64,

    /// Return from start only once the worker thread is up.
    pub start_synchronised: bool,

    /// Number of replicas of this service, each on its own thread.
    pub nb_threads: usize,

    /// Start with stepping suspended.
    pub start_paused: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            frequency_hz: 1.0,
            start_synchronised: true,
            nb_threads: 1,
            start_paused: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_file_uses_defaults() {
        let config: RuntimeConfig = toml::from_str("").unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.shutdown.grace_secs, 10);
    }

    #[test]
    fn test_parse_services() {
        let config: RuntimeConfig = toml::from_str(
            r#"
            [observability]
            log_level = "debug"

            [[services]]
            name = "heartbeat"
            frequency_hz = 10.0

            [[services]]
            name = "poller"
            frequency_hz = 0.5
            nb_threads = 2
            start_paused = true
            "#,
        )
        .unwrap();
        assert_eq!(config.observability.log_level, "debug");
        assert_eq!(config.services.len(), 2);
        let poller = config.service("poller").unwrap();
        assert_eq!(poller.nb_threads, 2);
        assert!(poller.start_paused);
        assert!(poller.start_synchronised);
        assert!(config.service("missing").is_none());
    }
}
