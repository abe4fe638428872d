//! Lifecycle operations and states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operation requested against a service, plus the two outcome markers
/// used when reporting completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Setup,
    Init,
    Start,
    Stop,
    Reset,
    Success,
    Error,
}

impl Operation {
    /// The five operations a caller may request.
    pub const REQUESTS: [Operation; 5] = [
        Operation::Setup,
        Operation::Init,
        Operation::Start,
        Operation::Stop,
        Operation::Reset,
    ];

    /// Outcome marker reported by `op_end`.
    pub fn outcome(success: bool) -> Self {
        if success {
            Operation::Success
        } else {
            Operation::Error
        }
    }

    pub fn is_outcome(self) -> bool {
        matches!(self, Operation::Success | Operation::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Setup => "setup",
            Operation::Init => "init",
            Operation::Start => "start",
            Operation::Stop => "stop",
            Operation::Reset => "reset",
            Operation::Success => "success",
            Operation::Error => "error",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a service.
///
/// Controllers use a subset: blocking services `Running/Stopped/Error`,
/// threaded services add `Starting/Stopping`, the full controller uses all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    None,
    Configuring,
    Configured,
    Initializing,
    Starting,
    Running,
    Stopping,
    Stopped,
    Resetting,
    Error,
}

impl State {
    pub const ALL: [State; 10] = [
        State::None,
        State::Configuring,
        State::Configured,
        State::Initializing,
        State::Starting,
        State::Running,
        State::Stopping,
        State::Stopped,
        State::Resetting,
        State::Error,
    ];

    /// `true` while an operation is in flight.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            State::Configuring | State::Initializing | State::Starting | State::Stopping | State::Resetting
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            State::None => "none",
            State::Configuring => "configuring",
            State::Configured => "configured",
            State::Initializing => "initializing",
            State::Starting => "starting",
            State::Running => "running",
            State::Stopping => "stopping",
            State::Stopped => "stopped",
            State::Resetting => "resetting",
            State::Error => "error",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_markers() {
        assert_eq!(Operation::outcome(true), Operation::Success);
        assert_eq!(Operation::outcome(false), Operation::Error);
        assert!(Operation::Success.is_outcome());
        assert!(Operation::REQUESTS.iter().all(|op| !op.is_outcome()));
    }

    #[test]
    fn test_names() {
        assert_eq!(State::Resetting.to_string(), "resetting");
        assert_eq!(Operation::Init.to_string(), "init");
        assert!(State::Stopping.is_transient());
        assert!(!State::Error.is_transient());
    }
}
