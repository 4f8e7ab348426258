use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use agentscope_protocol::CanonicalEvent;
use tracing::debug;

use crate::error::{ReplayError, ReplayResult};

/// 100 MiB. Larger logs are rejected before any byte is read.
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Read a JSONL event log into memory, sorted ascending by timestamp.
///
/// Blank and whitespace-only lines are skipped. The first line that is not a
/// valid canonical event, including one that is not UTF-8, aborts the whole
/// read; nothing is returned for partial files.
/// The sort is stable, so events sharing a timestamp keep file order.
pub fn read_event_log(path: &Path, max_file_size: u64) -> ReplayResult<Vec<CanonicalEvent>> {
    let io_err = |source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    };

    let size = fs::metadata(path).map_err(io_err)?.len();
    if size > max_file_size {
        return Err(ReplayError::FileTooLarge {
            path: path.to_path_buf(),
            size,
            limit: max_file_size,
        });
    }

    let reader = BufReader::new(File::open(path).map_err(io_err)?);
    let mut events = Vec::new();
    for (index, line) in reader.split(b'\n').enumerate() {
        let line = line.map_err(io_err)?;
        if line.trim_ascii().is_empty() {
            continue;
        }
        let event = CanonicalEvent::from_json_slice(&line).map_err(|source| {
            ReplayError::InvalidLine {
                line: index + 1,
                source,
            }
        })?;
        events.push(event);
    }

    sort_events(&mut events);
    debug!(count = events.len(), size, "event log read");
    Ok(events)
}

pub(crate) fn sort_events(events: &mut [CanonicalEvent]) {
    events.sort_by_key(|event| event.ts);
}
