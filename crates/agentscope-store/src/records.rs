//! Snapshot value types handed out by the store.
//!
//! Every getter returns owned clones of these; nothing references the locked
//! state.

use agentscope_protocol::{AgentId, AgentState, EventMetrics, Mode, Role, RunId, TaskId, TaskState};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Last reported state of one agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentRecord {
    pub agent_id: AgentId,
    pub role: Role,
    pub state: AgentState,
    pub last_seen: DateTime<Utc>,
}

/// Lifecycle of one spawned task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRecord {
    pub task_id: TaskId,
    /// Agent that spawned the task.
    pub agent_id: AgentId,
    pub state: TaskState,
    pub title: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Running totals since process start. Every field only grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub event_count: u64,
    pub error_count: u64,
    pub total_latency_ms: f64,
    pub total_tokens_in: u64,
    pub total_tokens_out: u64,
    pub total_cost_usd: f64,
}

impl Metrics {
    pub(crate) fn record(&mut self, is_error: bool, metrics: Option<&EventMetrics>) {
        self.event_count += 1;
        if is_error {
            self.error_count += 1;
        }
        let Some(metrics) = metrics else {
            return;
        };
        if let Some(latency) = metrics.latency_ms {
            self.total_latency_ms += latency;
        }
        if let Some(tokens) = metrics.tokens_in {
            self.total_tokens_in = self.total_tokens_in.saturating_add(tokens);
        }
        if let Some(tokens) = metrics.tokens_out {
            self.total_tokens_out = self.total_tokens_out.saturating_add(tokens);
        }
        if let Some(cost) = metrics.cost_usd {
            self.total_cost_usd += cost;
        }
    }

    /// Mean latency over all events, including those that reported none.
    pub fn average_latency_ms(&self) -> f64 {
        if self.event_count == 0 {
            0.0
        } else {
            self.total_latency_ms / self.event_count as f64
        }
    }
}

/// Everything a dashboard frame needs, read under a single lock.
#[derive(Debug, Clone, Serialize)]
pub struct StoreSnapshot {
    pub run_id: Option<RunId>,
    pub mode: Option<Mode>,
    pub agents: Vec<AgentRecord>,
    pub tasks: Vec<TaskRecord>,
    pub metrics: Metrics,
    pub warning_count: u64,
    pub event_count: usize,
    pub capacity: usize,
}
