//! The canonical event: one normalized, validated occurrence in an agent run.
//!
//! Produced by the upstream normalizer, consumed by the store (live) and the
//! replay player (from a JSONL log). Both paths share
//! [`CanonicalEvent::from_json_line`] so a recorded log is held to exactly the
//! contract live ingestion relies on.

use crate::error::{EventParseError, ValidationError};
use crate::ids::{AgentId, RunId, TaskId};
use crate::mode::{Mode, Provider};
use crate::role::Role;
use crate::state::AgentState;
use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, IntoDeserializer, value::StringDeserializer};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Kind of occurrence an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    TaskSpawn,
    TaskUpdate,
    TaskDone,
    ToolCall,
    ToolResult,
    Message,
    Error,
    Replan,
    Verify,
    Fix,
    Recover,
    StateChange,
}

impl EventType {
    pub const ALL: [EventType; 12] = [
        EventType::TaskSpawn,
        EventType::TaskUpdate,
        EventType::TaskDone,
        EventType::ToolCall,
        EventType::ToolResult,
        EventType::Message,
        EventType::Error,
        EventType::Replan,
        EventType::Verify,
        EventType::Fix,
        EventType::Recover,
        EventType::StateChange,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventType::TaskSpawn => "task_spawn",
            EventType::TaskUpdate => "task_update",
            EventType::TaskDone => "task_done",
            EventType::ToolCall => "tool_call",
            EventType::ToolResult => "tool_result",
            EventType::Message => "message",
            EventType::Error => "error",
            EventType::Replan => "replan",
            EventType::Verify => "verify",
            EventType::Fix => "fix",
            EventType::Recover => "recover",
            EventType::StateChange => "state_change",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Performance and cost metadata. Every field is optional and additive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_in: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_out: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEvent {
    pub ts: DateTime<Utc>,
    pub run_id: RunId,
    pub provider: Provider,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub mode: Option<Mode>,
    pub agent_id: AgentId,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_agent_id: Option<AgentId>,
    pub role: Role,
    pub state: AgentState,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub task_id: Option<TaskId>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub intent_ref: Option<String>,
    /// Redacted upstream; opaque to everything except [`Self::payload_as`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<EventMetrics>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub raw_ref: Option<String>,
}

impl CanonicalEvent {
    pub fn new(
        ts: DateTime<Utc>,
        run_id: impl Into<RunId>,
        provider: Provider,
        agent_id: impl Into<AgentId>,
        role: Role,
        state: AgentState,
        event_type: EventType,
    ) -> Self {
        Self {
            ts,
            run_id: run_id.into(),
            provider,
            mode: None,
            agent_id: agent_id.into(),
            parent_agent_id: None,
            role,
            state,
            event_type,
            task_id: None,
            intent_ref: None,
            payload: None,
            metrics: None,
            raw_ref: None,
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_parent(mut self, parent_agent_id: impl Into<AgentId>) -> Self {
        self.parent_agent_id = Some(parent_agent_id.into());
        self
    }

    pub fn with_task(mut self, task_id: impl Into<TaskId>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn with_intent_ref(mut self, intent_ref: impl Into<String>) -> Self {
        self.intent_ref = Some(intent_ref.into());
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_metrics(mut self, metrics: EventMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_raw_ref(mut self, raw_ref: impl Into<String>) -> Self {
        self.raw_ref = Some(raw_ref.into());
        self
    }

    /// Parse and validate one JSONL record.
    pub fn from_json_line(line: &str) -> Result<Self, EventParseError> {
        Self::from_json_slice(line.as_bytes())
    }

    /// Same as [`Self::from_json_line`] for raw bytes. Invalid UTF-8 is a
    /// syntax error.
    pub fn from_json_slice(line: &[u8]) -> Result<Self, EventParseError> {
        let event: CanonicalEvent = serde_json::from_slice(line)?;
        event.validate()?;
        Ok(event)
    }

    /// Required-field checks that the type system cannot express.
    ///
    /// Enum membership is already enforced by deserialization.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.run_id.is_empty() {
            return Err(ValidationError::MissingField("run_id"));
        }
        if self.agent_id.is_empty() {
            return Err(ValidationError::MissingField("agent_id"));
        }
        Ok(())
    }

    /// Decode the payload into one of the typed views in [`crate::payload`].
    ///
    /// An absent or `null` payload yields `T::default()`.
    pub fn payload_as<T>(&self) -> Result<T, serde_json::Error>
    where
        T: DeserializeOwned + Default,
    {
        match &self.payload {
            None | Some(Value::Null) => Ok(T::default()),
            Some(value) => T::deserialize(value),
        }
    }

    pub fn is_error(&self) -> bool {
        self.event_type == EventType::Error
    }
}

/// Treat `""` the same as a missing optional field.
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => {
            let inner: StringDeserializer<D::Error> = s.into_deserializer();
            T::deserialize(inner).map(Some)
        }
    }
}
