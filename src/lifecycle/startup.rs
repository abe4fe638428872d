//! Ordered startup of a group of services.
//!
//! # Responsibilities
//! - Start services in registration order
//! - Roll back (stop in reverse) what already started when one fails
//! - Stop everything in reverse order on shutdown
//!
//! # Design Decisions
//! - Fail fast: the first start failure aborts the whole group
//! - Services are held as `Arc<dyn Service>` so callers keep their own
//!   typed handles

use std::sync::Arc;

use crate::service::Service;

/// A group start aborted by one of its services.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("service {service} failed to start")]
pub struct StartError {
    pub service: String,
}

/// Services started and stopped as one unit.
#[derive(Default)]
pub struct ServiceGroup {
    services: Vec<Arc<dyn Service>>,
    started: usize,
}

impl ServiceGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, service: Arc<dyn Service>) {
        self.services.push(service);
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn services(&self) -> &[Arc<dyn Service>] {
        &self.services
    }

    /// Start every service in order.
    ///
    /// On the first failure the services already started are stopped in
    /// reverse order and the failing service is reported.
    pub fn start_all(&mut self) -> Result<(), StartError> {
        while self.started < self.services.len() {
            let service = Arc::clone(&self.services[self.started]);
            if !service.start() {
                tracing::error!(service = %service.name(), "Service failed to start, rolling back");
                self.stop_all();
                return Err(StartError {
                    service: service.name().to_string(),
                });
            }
            tracing::info!(service = %service.name(), "Service started");
            self.started += 1;
        }
        Ok(())
    }

    /// Stop started services in reverse order. Returns `true` if every
    /// stop succeeded.
    pub fn stop_all(&mut self) -> bool {
        let mut all_stopped = true;
        for service in self.services[..self.started].iter().rev() {
            if service.stop() {
                tracing::info!(service = %service.name(), "Service stopped");
            } else {
                tracing::warn!(service = %service.name(), "Service failed to stop");
                all_stopped = false;
            }
        }
        self.started = 0;
        all_stopped
    }
}

impl std::fmt::Debug for ServiceGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.services.iter().map(|s| s.name()).collect();
        f.debug_struct("ServiceGroup")
            .field("services", &names)
            .field("started", &self.started)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{BasicService, ServiceHooks};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    struct Recorded {
        name: &'static str,
        fail: bool,
        running: AtomicBool,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl ServiceHooks for Recorded {
        fn is_running(&self) -> bool {
            self.running.load(Ordering::SeqCst)
        }

        fn on_start(&self) -> bool {
            self.log.lock().unwrap().push(format!("start {}", self.name));
            self.running.store(!self.fail, Ordering::SeqCst);
            !self.fail
        }

        fn on_stop(&self) -> bool {
            self.log.lock().unwrap().push(format!("stop {}", self.name));
            self.running.store(false, Ordering::SeqCst);
            true
        }
    }

    fn service(name: &'static str, fail: bool, log: &Arc<Mutex<Vec<String>>>) -> Arc<dyn Service> {
        Arc::new(BasicService::new(
            name,
            Recorded {
                name,
                fail,
                running: AtomicBool::new(false),
                log: Arc::clone(log),
            },
        ))
    }

    #[test]
    fn test_start_in_order_stop_in_reverse() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut group = ServiceGroup::new();
        group.push(service("a", false, &log));
        group.push(service("b", false, &log));
        assert!(group.start_all().is_ok());
        assert!(group.services().iter().all(|s| s.is_running()));
        assert!(group.stop_all());
        assert_eq!(*log.lock().unwrap(), ["start a", "start b", "stop b", "stop a"]);
    }

    #[test]
    fn test_failure_rolls_back() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut group = ServiceGroup::new();
        group.push(service("a", false, &log));
        group.push(service("b", false, &log));
        group.push(service("c", true, &log));
        group.push(service("d", false, &log));
        let err = group.start_all().unwrap_err();
        assert_eq!(err, StartError { service: "c".into() });
        assert_eq!(err.to_string(), "service c failed to start");
        assert_eq!(
            *log.lock().unwrap(),
            ["start a", "start b", "start c", "stop b", "stop a"]
        );
        assert!(group.services().iter().all(|s| !s.is_running()));
    }
}
