//! Table-driven finite state machine.
//!
//! # Design Decisions
//! - Transitions are data, declared once through `TransitionTable`, and
//!   immutable once the machine is built
//! - Any `(state, event)` pair absent from the table is rejected and leaves
//!   the state untouched
//! - Reads and transitions share one lock, no torn reads

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Declarative `(state, event) → state` mapping.
#[derive(Debug, Clone)]
pub struct TransitionTable<S, E> {
    transitions: HashMap<(S, E), S>,
}

impl<S, E> TransitionTable<S, E>
where
    S: Copy + Eq + Hash,
    E: Copy + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            transitions: HashMap::new(),
        }
    }

    /// Declare `from --event--> into`. A later declaration for the same
    /// `(from, event)` replaces the earlier one.
    pub fn transition(mut self, from: S, event: E, into: S) -> Self {
        self.transitions.insert((from, event), into);
        self
    }

    /// Target of `(from, event)`, if legal.
    pub fn target(&self, from: S, event: E) -> Option<S> {
        self.transitions.get(&(from, event)).copied()
    }

    pub fn is_legal(&self, from: S, event: E) -> bool {
        self.transitions.contains_key(&(from, event))
    }

    /// Every legal transition as `(from, event, into)`.
    pub fn iter(&self) -> impl Iterator<Item = (S, E, S)> + '_ {
        self.transitions
            .iter()
            .map(|(&(from, event), &into)| (from, event, into))
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

impl<S, E> Default for TransitionTable<S, E>
where
    S: Copy + Eq + Hash,
    E: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct Current<S, E> {
    state: S,
    last_event: Option<E>,
}

/// State machine over an immutable transition table.
pub struct StateMachine<S, E> {
    table: TransitionTable<S, E>,
    current: Mutex<Current<S, E>>,
}

impl<S, E> StateMachine<S, E>
where
    S: Copy + Eq + Hash,
    E: Copy + Eq + Hash,
{
    pub fn new(initial: S, table: TransitionTable<S, E>) -> Self {
        Self {
            table,
            current: Mutex::new(Current {
                state: initial,
                last_event: None,
            }),
        }
    }

    /// Apply `event` from the current state.
    ///
    /// Returns the new state, or `None` if the transition is not in the
    /// table, in which case nothing changes.
    pub fn try_transition(&self, event: E) -> Option<S> {
        let mut current = self.lock();
        let into = self.table.target(current.state, event)?;
        current.state = into;
        current.last_event = Some(event);
        Some(into)
    }

    pub fn state(&self) -> S {
        self.lock().state
    }

    /// Last event that caused an accepted transition.
    pub fn last_event(&self) -> Option<E> {
        self.lock().last_event
    }

    /// Whether `event` would be accepted right now.
    pub fn can_transition(&self, event: E) -> bool {
        self.table.is_legal(self.lock().state, event)
    }

    pub fn table(&self) -> &TransitionTable<S, E> {
        &self.table
    }

    fn lock(&self) -> MutexGuard<'_, Current<S, E>> {
        // Every write is a single field store, the value stays consistent.
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S, E> fmt::Debug for StateMachine<S, E>
where
    S: fmt::Debug,
    E: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("StateMachine");
        match self.current.lock() {
            Ok(current) => out.field("state", &current.state),
            Err(_) => out.field("state", &"<poisoned>"),
        };
        out.field("transitions", &self.table.transitions.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Light {
        Red,
        Green,
        Yellow,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Signal {
        Next,
        Emergency,
    }

    fn traffic_light() -> StateMachine<Light, Signal> {
        let table = TransitionTable::new()
            .transition(Light::Red, Signal::Next, Light::Green)
            .transition(Light::Green, Signal::Next, Light::Yellow)
            .transition(Light::Yellow, Signal::Next, Light::Red)
            .transition(Light::Green, Signal::Emergency, Light::Red)
            .transition(Light::Yellow, Signal::Emergency, Light::Red);
        StateMachine::new(Light::Red, table)
    }

    #[test]
    fn test_legal_transitions() {
        let machine = traffic_light();
        assert_eq!(machine.last_event(), None);
        assert_eq!(machine.try_transition(Signal::Next), Some(Light::Green));
        assert_eq!(machine.try_transition(Signal::Next), Some(Light::Yellow));
        assert_eq!(machine.try_transition(Signal::Emergency), Some(Light::Red));
        assert_eq!(machine.state(), Light::Red);
        assert_eq!(machine.last_event(), Some(Signal::Emergency));
    }

    #[test]
    fn test_rejected_transition_keeps_state() {
        let machine = traffic_light();
        assert!(!machine.can_transition(Signal::Emergency));
        assert_eq!(machine.try_transition(Signal::Emergency), None);
        assert_eq!(machine.state(), Light::Red);
        assert_eq!(machine.last_event(), None);
    }

    #[test]
    fn test_table_enumeration() {
        let machine = traffic_light();
        assert_eq!(machine.table().len(), 5);
        let from_green: Vec<_> = machine
            .table()
            .iter()
            .filter(|(from, _, _)| *from == Light::Green)
            .collect();
        assert_eq!(from_green.len(), 2);
    }

    #[test]
    fn test_later_declaration_wins() {
        let table = TransitionTable::new()
            .transition(Light::Red, Signal::Next, Light::Green)
            .transition(Light::Red, Signal::Next, Light::Yellow);
        assert_eq!(table.len(), 1);
        assert_eq!(table.target(Light::Red, Signal::Next), Some(Light::Yellow));
    }
}
