//! Service controllers: legality and tracking of lifecycle transitions.
//!
//! # State Transitions
//! ```text
//! Blocking (3 states, initial Stopped):
//!     Stopped/Error --start--> Running --stop--> Stopped
//!     outcome Error → Error
//!
//! Threaded (5 states, initial Stopped):
//!     Stopped/Error --start--> Starting --success--> Running
//!     Running --stop--> Stopping --success--> Stopped
//!     Starting/Stopping --error--> Error
//!
//! Full (initial None):
//!     None --setup--> Configuring --success--> Configured
//!     Configured --init--> Initializing --success--> Stopped
//!     Stopped --start--> Starting --success--> Running
//!     Running --stop--> Stopping --success--> Stopped
//!     Configured/Stopped/Error --reset--> Resetting --success--> None
//!     any in-flight state --error--> Error
//! ```
//!
//! # Design Decisions
//! - Every controller is a `StateMachine` over its own table; state is
//!   written only from `op_start`/`op_end`
//! - Blocking and threaded controllers accept setup/init/reset without
//!   touching their state

use std::fmt;

use crate::lifecycle::{Operation, State, StateMachine, TransitionTable};

/// Policy validating requested operations and tracking service state.
///
/// Every accepted `op_start` must be followed by exactly one `op_end`.
pub trait ServiceController: Send + Sync + fmt::Debug {
    /// Ask whether `op` may run from the current state. A `false` return
    /// means the lifecycle method must fail without running its hook.
    fn op_start(&self, op: Operation) -> bool;

    /// Report the outcome of an accepted operation.
    fn op_end(&self, op: Operation, success: bool) -> bool;

    /// Current state.
    fn state(&self) -> State;

    /// Whether `op` would be accepted right now.
    fn can_start(&self, op: Operation) -> bool;
}

fn is_passthrough(op: Operation) -> bool {
    matches!(op, Operation::Setup | Operation::Init | Operation::Reset)
}

/// Controller for services whose start/stop complete within the call.
#[derive(Debug)]
pub struct BlockingServiceController {
    machine: StateMachine<State, Operation>,
}

impl BlockingServiceController {
    pub fn new() -> Self {
        let table = TransitionTable::new()
            .transition(State::Stopped, Operation::Start, State::Running)
            .transition(State::Error, Operation::Start, State::Running)
            .transition(State::Running, Operation::Stop, State::Stopped)
            .transition(State::Running, Operation::Success, State::Running)
            .transition(State::Stopped, Operation::Success, State::Stopped)
            .transition(State::Running, Operation::Error, State::Error)
            .transition(State::Stopped, Operation::Error, State::Error);
        Self {
            machine: StateMachine::new(State::Stopped, table),
        }
    }

    pub fn table(&self) -> &TransitionTable<State, Operation> {
        self.machine.table()
    }
}

impl Default for BlockingServiceController {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceController for BlockingServiceController {
    fn op_start(&self, op: Operation) -> bool {
        if is_passthrough(op) {
            return true;
        }
        !op.is_outcome() && self.machine.try_transition(op).is_some()
    }

    fn op_end(&self, op: Operation, success: bool) -> bool {
        if is_passthrough(op) {
            return true;
        }
        self.machine
            .try_transition(Operation::outcome(success))
            .is_some()
    }

    fn state(&self) -> State {
        self.machine.state()
    }

    fn can_start(&self, op: Operation) -> bool {
        is_passthrough(op) || (!op.is_outcome() && self.machine.can_transition(op))
    }
}

/// Controller for services whose start/stop are two-phase: requested,
/// then completed by another thread's work.
#[derive(Debug)]
pub struct ThreadedServiceController {
    machine: StateMachine<State, Operation>,
}

impl ThreadedServiceController {
    pub fn new() -> Self {
        let table = TransitionTable::new()
            .transition(State::Stopped, Operation::Start, State::Starting)
            .transition(State::Error, Operation::Start, State::Starting)
            .transition(State::Starting, Operation::Success, State::Running)
            .transition(State::Starting, Operation::Error, State::Error)
            .transition(State::Running, Operation::Stop, State::Stopping)
            .transition(State::Stopping, Operation::Success, State::Stopped)
            .transition(State::Stopping, Operation::Error, State::Error);
        Self {
            machine: StateMachine::new(State::Stopped, table),
        }
    }

    pub fn table(&self) -> &TransitionTable<State, Operation> {
        self.machine.table()
    }
}

impl Default for ThreadedServiceController {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceController for ThreadedServiceController {
    fn op_start(&self, op: Operation) -> bool {
        if is_passthrough(op) {
            return true;
        }
        !op.is_outcome() && self.machine.try_transition(op).is_some()
    }

    fn op_end(&self, op: Operation, success: bool) -> bool {
        if is_passthrough(op) {
            return true;
        }
        self.machine
            .try_transition(Operation::outcome(success))
            .is_some()
    }

    fn state(&self) -> State {
        self.machine.state()
    }

    fn can_start(&self, op: Operation) -> bool {
        is_passthrough(op) || (!op.is_outcome() && self.machine.can_transition(op))
    }
}

/// Controller driving all five operations through the full lifecycle.
#[derive(Debug)]
pub struct FullServiceController {
    machine: StateMachine<State, Operation>,
}

impl FullServiceController {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> FullServiceControllerBuilder {
        FullServiceControllerBuilder::default()
    }

    pub fn table(&self) -> &TransitionTable<State, Operation> {
        self.machine.table()
    }

    pub fn last_operation(&self) -> Option<Operation> {
        self.machine.last_event()
    }
}

impl Default for FullServiceController {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceController for FullServiceController {
    fn op_start(&self, op: Operation) -> bool {
        !op.is_outcome() && self.machine.try_transition(op).is_some()
    }

    fn op_end(&self, _op: Operation, success: bool) -> bool {
        self.machine
            .try_transition(Operation::outcome(success))
            .is_some()
    }

    fn state(&self) -> State {
        self.machine.state()
    }

    fn can_start(&self, op: Operation) -> bool {
        !op.is_outcome() && self.machine.can_transition(op)
    }
}

/// Builder for [`FullServiceController`].
#[derive(Debug, Default)]
pub struct FullServiceControllerBuilder {
    optional_setup: bool,
    optional_init: bool,
}

impl FullServiceControllerBuilder {
    /// Allow `init` straight from `None`, skipping setup.
    pub fn optional_setup(mut self) -> Self {
        self.optional_setup = true;
        self
    }

    /// Allow `start` straight from `None`, skipping setup and init.
    pub fn optional_init(mut self) -> Self {
        self.optional_init = true;
        self
    }

    pub fn build(self) -> FullServiceController {
        let mut table = TransitionTable::new()
            .transition(State::None, Operation::Setup, State::Configuring)
            .transition(State::Configuring, Operation::Success, State::Configured)
            .transition(State::Configuring, Operation::Error, State::Error)
            .transition(State::Configured, Operation::Init, State::Initializing)
            .transition(State::Initializing, Operation::Success, State::Stopped)
            .transition(State::Initializing, Operation::Error, State::Error)
            .transition(State::Stopped, Operation::Start, State::Starting)
            .transition(State::Starting, Operation::Success, State::Running)
            .transition(State::Starting, Operation::Error, State::Error)
            .transition(State::Running, Operation::Stop, State::Stopping)
            .transition(State::Stopping, Operation::Success, State::Stopped)
            .transition(State::Stopping, Operation::Error, State::Error)
            .transition(State::Configured, Operation::Reset, State::Resetting)
            .transition(State::Stopped, Operation::Reset, State::Resetting)
            .transition(State::Error, Operation::Reset, State::Resetting)
            .transition(State::Resetting, Operation::Success, State::None)
            .transition(State::Resetting, Operation::Error, State::Error);
        if self.optional_setup {
            table = table.transition(State::None, Operation::Init, State::Initializing);
        }
        if self.optional_init {
            table = table.transition(State::None, Operation::Start, State::Starting);
        }
        FullServiceController {
            machine: StateMachine::new(State::None, table),
        }
    }
}
