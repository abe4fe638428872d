//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: RuntimeConfig → Result<(), Vec<ValidationError>>
//! - Runs before a config is accepted, including on hot reload

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::RuntimeConfig;

/// A single semantic error in a configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("service at index {index} has an empty name")]
    EmptyServiceName { index: usize },

    #[error("service name {name:?} is used more than once")]
    DuplicateServiceName { name: String },

    #[error("service {name:?} frequency must be positive and finite, got {frequency_hz}")]
    InvalidFrequency { name: String, frequency_hz: f64 },

    #[error("service {name:?} needs at least one thread")]
    NoThreads { name: String },

    #[error("metrics address {address:?} is not a socket address")]
    InvalidMetricsAddress { address: String },
}

pub fn validate_config(config: &RuntimeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, service) in config.services.iter().enumerate() {
        if service.name.is_empty() {
            errors.push(ValidationError::EmptyServiceName { index });
        } else if !seen.insert(service.name.as_str()) {
            errors.push(ValidationError::DuplicateServiceName {
                name: service.name.clone(),
            });
        }
        if !service.frequency_hz.is_finite() || service.frequency_hz <= 0.0 {
            errors.push(ValidationError::InvalidFrequency {
                name: service.name.clone(),
                frequency_hz: service.frequency_hz,
            });
        }
        if service.nb_threads == 0 {
            errors.push(ValidationError::NoThreads {
                name: service.name.clone(),
            });
        }
    }

    let address = &config.observability.metrics_address;
    if config.observability.metrics_enabled && address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress {
            address: address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ServiceConfig;

    fn service(name: &str, frequency_hz: f64) -> ServiceConfig {
        ServiceConfig {
            name: name.to_string(),
            frequency_hz,
            ..ServiceConfig::default()
        }
    }

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&RuntimeConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = RuntimeConfig::default();
        config.services = vec![
            service("a", 1.0),
            service("a", 0.0),
            service("", f64::NAN),
            ServiceConfig {
                nb_threads: 0,
                ..service("b", 2.0)
            },
        ];
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "nowhere".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 6);
        assert!(errors.contains(&ValidationError::DuplicateServiceName { name: "a".into() }));
        assert!(errors.contains(&ValidationError::EmptyServiceName { index: 2 }));
        assert!(errors.contains(&ValidationError::NoThreads { name: "b".into() }));
        assert!(errors.contains(&ValidationError::InvalidMetricsAddress {
            address: "nowhere".into()
        }));
    }

    #[test]
    fn test_metrics_address_ignored_when_disabled() {
        let mut config = RuntimeConfig::default();
        config.observability.metrics_address = "nowhere".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
