//! Process-scoped registry of named worker threads.

use std::thread::{self, ThreadId};

use dashmap::DashMap;

/// Names of the live worker threads, keyed by thread id.
///
/// Owned by the process's top-level context and handed to workers that
/// should be tracked; nothing registers itself implicitly.
#[derive(Debug, Default)]
pub struct ThreadRegistry {
    threads: DashMap<ThreadId, String>,
}

impl ThreadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the calling thread under `name`.
    pub fn register_current(&self, name: &str) {
        self.threads.insert(thread::current().id(), name.to_string());
    }

    /// Remove the calling thread. Returns its registered name.
    pub fn unregister_current(&self) -> Option<String> {
        self.threads
            .remove(&thread::current().id())
            .map(|(_, name)| name)
    }

    /// Registered name of the calling thread.
    pub fn current_name(&self) -> Option<String> {
        self.name_of(thread::current().id())
    }

    pub fn name_of(&self, id: ThreadId) -> Option<String> {
        self.threads.get(&id).map(|entry| entry.value().clone())
    }

    /// Sorted names of every registered thread.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .threads
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_register_and_unregister() {
        let registry = Arc::new(ThreadRegistry::new());
        let r = registry.clone();
        let name = thread::spawn(move || {
            r.register_current("sampler");
            let seen = r.current_name();
            assert_eq!(r.names(), vec!["sampler".to_string()]);
            assert_eq!(r.unregister_current().as_deref(), Some("sampler"));
            seen
        })
        .join()
        .unwrap();

        assert_eq!(name.as_deref(), Some("sampler"));
        assert!(registry.is_empty());
        assert_eq!(registry.current_name(), None);
    }
}
