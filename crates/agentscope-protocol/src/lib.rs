//! # agentscope-protocol: Canonical Event Contract
//!
//! Shared types for everything downstream of the normalizer: the canonical
//! event shape, its enumerations, the agent and task state machines, typed
//! payload views, and the ingestion port.
//!
//! Dependency-light (no tokio, no locks). The store, the replay player and
//! any presentation layer all build on it.
//!
//! ## Module Overview
//!
//! - [`ids`]: Typed ID wrappers (RunId, AgentId, TaskId)
//! - [`event`]: CanonicalEvent, EventType, EventMetrics, line parsing
//! - [`mode`]: Provider, Mode
//! - [`role`]: Role and the agent-name lookup table
//! - [`state`]: AgentState, TaskState and their transition tables
//! - [`payload`]: Typed payload structs per event type
//! - [`ports`]: EventSink ingestion port
//! - [`error`]: ValidationError, EventParseError

pub mod error;
pub mod event;
pub mod ids;
pub mod mode;
pub mod payload;
pub mod ports;
pub mod role;
pub mod state;

// Re-export the most commonly used types at the crate root.
pub use error::{EventParseError, ValidationError};
pub use event::{CanonicalEvent, EventMetrics, EventType};
pub use ids::{AgentId, RunId, TaskId};
pub use mode::{Mode, Provider};
pub use payload::{
    ErrorPayload, FixPayload, RecoverPayload, ReplanPayload, StateChangePayload,
    TaskDonePayload, TaskSpawnPayload, TaskUpdatePayload, ToolCallPayload, ToolResultPayload,
    VerifyPayload,
};
pub use ports::EventSink;
pub use role::Role;
pub use state::{AgentState, TaskState};
