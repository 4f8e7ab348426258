//! Error types for loading event logs.

use agentscope_protocol::EventParseError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Nothing was read; oversized logs need a streaming loader.
    #[error(
        "file size {size} exceeds max {limit} (streaming mode required): {}",
        path.display()
    )]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },
    /// 1-based line number of the first record that failed to parse.
    #[error("line {line}: {source}")]
    InvalidLine {
        line: usize,
        #[source]
        source: EventParseError,
    },
}

pub type ReplayResult<T> = Result<T, ReplayError>;
