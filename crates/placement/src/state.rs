//! Placement saga state machine.

use serde::{Deserialize, Serialize};

/// The state of one placement run.
///
/// State transitions:
/// ```text
/// NotStarted ──► Committing ──► Persisting ──► Completed
///                    │               │
///                    └───────┬───────┘
///                            ▼
///                      Compensating ──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SagaState {
    /// Nothing has been mutated yet.
    #[default]
    NotStarted,

    /// Stock is being decremented line by line.
    Committing,

    /// All lines are committed and the order is being saved.
    Persisting,

    /// Committed lines are being restored after a failure.
    Compensating,

    /// The order was saved (terminal state).
    Completed,

    /// Compensation finished after a failure (terminal state).
    Failed,
}

impl SagaState {
    /// Returns true if a stock commit may be recorded.
    pub fn can_commit(&self) -> bool {
        matches!(self, SagaState::NotStarted | SagaState::Committing)
    }

    /// Returns true if the saga can begin compensation.
    pub fn can_compensate(&self) -> bool {
        matches!(self, SagaState::Committing | SagaState::Persisting)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SagaState::Completed | SagaState::Failed)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::NotStarted => "NotStarted",
            SagaState::Committing => "Committing",
            SagaState::Persisting => "Persisting",
            SagaState::Compensating => "Compensating",
            SagaState::Completed => "Completed",
            SagaState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
