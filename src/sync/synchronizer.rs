//! N-party rendezvous barrier.
//!
//! # States
//! - Idle: `total == 0`, `sync()` returns immediately
//! - Armed: `total == N`, arrivals accumulate in `current`
//!
//! # Round
//! ```text
//! sync() #1..N-1 → block
//! sync() #N      → current = 0, generation += 1, notify_all
//! ```
//!
//! # Design Decisions
//! - A generation counter identifies the round, so every party blocked in
//!   round G is released together even if a new round starts immediately
//! - More than `total` callers in one round is a caller error: the extra
//!   callers open the next round and stay blocked until it completes or
//!   `reset()` runs

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::sync::Waitable;

/// Rendezvous counter with a dynamic party count.
#[derive(Debug, Default)]
pub struct Synchronizer {
    total: AtomicUsize,
    current: AtomicUsize,
    generation: AtomicU64,
    waitable: Waitable,
}

impl Synchronizer {
    /// Create an idle synchronizer (party count 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of parties of the next rounds.
    ///
    /// A count of 0 turns `sync()` into a no-op.
    pub fn init_sync(&self, total: usize) {
        let _guard = self.waitable.guard();
        self.total.store(total, Ordering::SeqCst);
        self.current.store(0, Ordering::SeqCst);
    }

    /// Number of parties expected per round.
    pub fn total_sync(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Number of parties currently blocked in the round.
    pub fn current_sync(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    /// Arrive at the rendezvous.
    ///
    /// Blocks until `total` parties have arrived in this round. The last
    /// arrival releases everyone and does not block.
    pub fn sync(&self) {
        let guard = self.waitable.guard();
        let total = self.total.load(Ordering::SeqCst);
        if total == 0 {
            return;
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let arrived = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        if arrived >= total {
            self.release_round();
            return;
        }

        drop(
            self.waitable
                .wait_locked(guard, || self.generation.load(Ordering::SeqCst) != generation),
        );
    }

    /// Release every party blocked in the current round and disarm.
    pub fn reset(&self) {
        let _guard = self.waitable.guard();
        self.total.store(0, Ordering::SeqCst);
        if self.current.load(Ordering::SeqCst) > 0 {
            self.release_round();
        }
    }

    // Must be called with the waitable guard held.
    fn release_round(&self) {
        self.current.store(0, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.waitable.notify_all();
    }
}

impl Drop for Synchronizer {
    fn drop(&mut self) {
        self.reset();
    }
}
