//! Condition-variable wrapper with predicate and elapsed-time waits.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// A mutex + condition variable pair.
///
/// Predicates passed to the `wait*` methods return `true` once the caller
/// may stop waiting. They are evaluated with the internal mutex held, so
/// state they read must be written under [`Waitable::guard`] before
/// notifying.
#[derive(Debug, Default)]
pub struct Waitable {
    mutex: Mutex<()>,
    condition: Condvar,
}

impl Waitable {
    /// Create a new waitable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scoped acquisition of the internal mutex.
    pub fn guard(&self) -> MutexGuard<'_, ()> {
        // The mutex guards no data, a poisoned lock is still usable.
        self.mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wake up to `times` waiters. No-op without waiters.
    pub fn notify(&self, times: usize) {
        for _ in 0..times {
            self.condition.notify_one();
        }
    }

    /// Wake up every waiter.
    pub fn notify_all(&self) {
        self.condition.notify_all();
    }

    /// Wake up every waiter so wait loops re-check their predicates.
    pub fn cancel_loop(&self) {
        self.notify_all();
    }

    /// Block until notified. Spurious wakeups are possible.
    pub fn wait_notified(&self) {
        let guard = self.guard();
        drop(
            self.condition
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner),
        );
    }

    /// Block until notified or `duration` elapsed.
    ///
    /// Returns `true` if the wait timed out.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        if duration.is_zero() {
            return true;
        }
        let guard = self.guard();
        let (_guard, result) = self
            .condition
            .wait_timeout(guard, duration)
            .unwrap_or_else(PoisonError::into_inner);
        result.timed_out()
    }

    /// Block until `ready()` holds.
    pub fn wait<F>(&self, ready: F)
    where
        F: FnMut() -> bool,
    {
        let guard = self.guard();
        drop(self.wait_locked(guard, ready));
    }

    /// Block until `ready()` holds, reusing a guard the caller already holds.
    ///
    /// Used when the caller must update predicate state and start waiting
    /// without releasing the mutex in between.
    pub fn wait_locked<'a, F>(&self, guard: MutexGuard<'a, ()>, mut ready: F) -> MutexGuard<'a, ()>
    where
        F: FnMut() -> bool,
    {
        self.condition
            .wait_while(guard, |_| !ready())
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until `ready()` holds or `duration` elapsed.
    ///
    /// Returns whether the predicate holds, a predicate that became true
    /// right at the deadline counts as success. A zero duration evaluates
    /// the predicate once without blocking.
    pub fn wait_for<F>(&self, duration: Duration, mut ready: F) -> bool
    where
        F: FnMut() -> bool,
    {
        let guard = self.guard();
        if duration.is_zero() {
            return ready();
        }
        let (_guard, result) = self
            .condition
            .wait_timeout_while(guard, duration, |_| !ready())
            .unwrap_or_else(PoisonError::into_inner);
        !result.timed_out()
    }

    /// Block until `ready()` holds or `deadline` is reached.
    pub fn wait_until<F>(&self, deadline: Instant, ready: F) -> bool
    where
        F: FnMut() -> bool,
    {
        self.wait_for(deadline.saturating_duration_since(Instant::now()), ready)
    }

    /// Like [`Waitable::wait`], returns the time spent waiting.
    pub fn wait_elapsed<F>(&self, ready: F) -> Duration
    where
        F: FnMut() -> bool,
    {
        let start = Instant::now();
        self.wait(ready);
        start.elapsed()
    }

    /// Like [`Waitable::wait_for`], returns the time spent waiting.
    pub fn wait_for_elapsed<F>(&self, duration: Duration, ready: F) -> Duration
    where
        F: FnMut() -> bool,
    {
        let start = Instant::now();
        self.wait_for(duration, ready);
        start.elapsed()
    }

    /// Like [`Waitable::wait_until`], returns the time spent waiting.
    pub fn wait_until_elapsed<F>(&self, deadline: Instant, ready: F) -> Duration
    where
        F: FnMut() -> bool,
    {
        let start = Instant::now();
        self.wait_until(deadline, ready);
        start.elapsed()
    }
}

impl Drop for Waitable {
    fn drop(&mut self) {
        self.cancel_loop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_wait_for_ready_predicate_returns_immediately() {
        let waitable = Waitable::new();
        let elapsed = waitable.wait_for_elapsed(Duration::from_secs(5), || true);
        assert!(elapsed < Duration::from_secs(1));
        assert!(waitable.wait_for(Duration::from_secs(5), || true));
    }

    #[test]
    fn test_wait_for_times_out() {
        let waitable = Waitable::new();
        let start = Instant::now();
        assert!(!waitable.wait_for(Duration::from_millis(20), || false));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_zero_duration_does_not_block() {
        let waitable = Waitable::new();
        assert!(!waitable.wait_for(Duration::ZERO, || false));
        assert!(waitable.wait_for(Duration::ZERO, || true));
        assert!(waitable.wait_timeout(Duration::ZERO));
        assert!(!waitable.wait_until(Instant::now() - Duration::from_millis(1), || false));
    }

    #[test]
    fn test_notify_releases_predicate_wait() {
        let waitable = Arc::new(Waitable::new());
        let flag = Arc::new(AtomicBool::new(false));

        let notifier = {
            let waitable = waitable.clone();
            let flag = flag.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                let _guard = waitable.guard();
                flag.store(true, Ordering::SeqCst);
                waitable.notify_all();
            })
        };

        let released = waitable.wait_for(Duration::from_secs(5), || flag.load(Ordering::SeqCst));
        notifier.join().unwrap();
        assert!(released);
    }

    #[test]
    fn test_notify_without_waiters_is_noop() {
        let waitable = Waitable::new();
        waitable.notify(3);
        waitable.notify_all();
        waitable.cancel_loop();
    }

    #[test]
    fn test_wait_timeout_reports_notification() {
        let waitable = Arc::new(Waitable::new());
        let waiter = {
            let waitable = waitable.clone();
            thread::spawn(move || waitable.wait_timeout(Duration::from_secs(5)))
        };
        // Keep notifying until the waiter returns, it may not be parked yet.
        while !waiter.is_finished() {
            waitable.notify(1);
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!waiter.join().unwrap());
    }
}
