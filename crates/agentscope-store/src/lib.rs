//! In-memory event store for a single orchestration run.
//!
//! Ingests canonical events into a fixed-capacity ring buffer and keeps the
//! derived per-agent and per-task state plus running metrics. See
//! [`EventStore`].

mod records;
mod ring;
mod store;

pub use records::{AgentRecord, Metrics, StoreSnapshot, TaskRecord};
pub use ring::RingBuffer;
pub use store::{DEFAULT_CAPACITY, EventStore, StoreConfig};
