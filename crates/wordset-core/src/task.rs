use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Lifecycle of a background fill task.
///
/// The only legal transitions are `Pending -> Done` and `Pending -> Failed`.
/// Both terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Done,
    Failed,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Done => "done",
            TaskState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskState::Pending)
    }

    pub fn can_transition_to(&self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (TaskState::Pending, TaskState::Done) | (TaskState::Pending, TaskState::Failed)
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskState::Pending),
            "done" => Ok(TaskState::Done),
            "failed" => Ok(TaskState::Failed),
            other => Err(Error::UnknownTaskState(other.to_string())),
        }
    }
}

/// Why a task ended up `failed`. Recorded alongside the state so operators can
/// tell a model failure from a storage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureReason {
    Generation,
    Persistence,
    Timeout,
    /// The process that owned the task stopped before finalizing it.
    Interrupted,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::Generation => "generation",
            FailureReason::Persistence => "persistence",
            FailureReason::Timeout => "timeout",
            FailureReason::Interrupted => "interrupted",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailureReason {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generation" => Ok(FailureReason::Generation),
            "persistence" => Ok(FailureReason::Persistence),
            "timeout" => Ok(FailureReason::Timeout),
            "interrupted" => Ok(FailureReason::Interrupted),
            other => Err(Error::UnknownFailureReason(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub study_set_id: i64,
    pub state: TaskState,
    pub failure: Option<FailureReason>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// Check that moving this task to `next` respects the state machine.
    pub fn ensure_transition(&self, next: TaskState) -> crate::Result<()> {
        if self.state.can_transition_to(next) {
            Ok(())
        } else {
            Err(Error::InvalidTransition {
                from: self.state,
                to: next,
            })
        }
    }
}
