//! Replay of recorded agent runs.
//!
//! A run is recorded as a JSONL file of canonical events. [`ReplayPlayer`]
//! loads the whole file, sorts it by timestamp and plays it back against a
//! [`VirtualClock`] whose speed can change mid-playback.

mod clock;
mod error;
mod loader;
mod player;

pub use clock::VirtualClock;
pub use error::{ReplayError, ReplayResult};
pub use loader::{MAX_FILE_SIZE, read_event_log};
pub use player::{PlayerConfig, ReplayPlayer};
