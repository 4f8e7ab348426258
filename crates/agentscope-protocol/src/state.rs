//! Agent and task state machines.
//!
//! Both machines are expressed as tables: each state maps to the slice of
//! states it may legally move to. Adding or removing an edge is a one-line
//! change to the table, and nothing else branches on transitions.
//!
//! The tables describe what is *expected*. Consumers of live telemetry still
//! record whatever was reported and only flag edges missing from the table.

use serde::{Deserialize, Serialize};
use std::fmt;

// -----------------------------------------------------------------------------
// Agent state
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Idle,
    Running,
    Waiting,
    Blocked,
    Error,
    Done,
    Failed,
    Cancelled,
}

impl AgentState {
    pub const ALL: [AgentState; 8] = [
        AgentState::Idle,
        AgentState::Running,
        AgentState::Waiting,
        AgentState::Blocked,
        AgentState::Error,
        AgentState::Done,
        AgentState::Failed,
        AgentState::Cancelled,
    ];

    /// Legal next states.
    pub fn next_states(self) -> &'static [AgentState] {
        use AgentState::*;
        match self {
            Idle => &[Running, Cancelled],
            Running => &[Waiting, Blocked, Error, Done, Cancelled],
            Waiting => &[Running, Error],
            Blocked => &[Running, Error, Cancelled],
            Error => &[Running, Failed],
            Done => &[Idle],
            Failed => &[],
            Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: AgentState) -> bool {
        self.next_states().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AgentState::Done | AgentState::Failed | AgentState::Cancelled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AgentState::Idle => "idle",
            AgentState::Running => "running",
            AgentState::Waiting => "waiting",
            AgentState::Blocked => "blocked",
            AgentState::Error => "error",
            AgentState::Done => "done",
            AgentState::Failed => "failed",
            AgentState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// -----------------------------------------------------------------------------
// Task lifecycle
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Active,
    Done,
    Failed,
    Cancelled,
}

impl TaskState {
    pub const ALL: [TaskState; 4] = [
        TaskState::Active,
        TaskState::Done,
        TaskState::Failed,
        TaskState::Cancelled,
    ];

    /// Legal next states.
    pub fn next_states(self) -> &'static [TaskState] {
        use TaskState::*;
        match self {
            Active => &[Done, Failed, Cancelled],
            Done => &[],
            Failed => &[],
            Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: TaskState) -> bool {
        self.next_states().contains(&next)
    }

    /// Map the `result` field of a `task_done` payload to a lifecycle state.
    /// Unrecognized results count as a successful completion.
    pub fn from_done_result(result: &str) -> Self {
        match result {
            "failure" => TaskState::Failed,
            "cancelled" => TaskState::Cancelled,
            _ => TaskState::Done,
        }
    }

    pub fn is_terminal(self) -> bool {
        self != TaskState::Active
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Active => "active",
            TaskState::Done => "done",
            TaskState::Failed => "failed",
            TaskState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
