//! Read-only inspection of the work dir against its metadata.
//!
//! Classification per record, first match wins:
//! 1. `Command` for command outputs (their source cannot be re-checked
//!    without running them)
//! 2. `MissingSource` when the source file is gone or unreadable
//! 3. `MissingDestination` when the synced copy is gone
//! 4. `Modified` when the source hash differs from the recorded hash
//! 5. `Current`

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::hasher;
use crate::metadata::{self, Provenance, SyncMetadata, SyncRecord};
use crate::writer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    Command,
    MissingSource,
    MissingDestination,
    Modified,
    Current,
}

impl RecordState {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordState::Command => "command",
            RecordState::MissingSource => "missing-source",
            RecordState::MissingDestination => "missing-destination",
            RecordState::Modified => "modified",
            RecordState::Current => "current",
        }
    }

    /// True when the next sync would change the work dir for this record.
    pub fn needs_sync(self) -> bool {
        !matches!(self, RecordState::Current | RecordState::Command)
    }
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One metadata record and its current state on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordStatus {
    pub path: String,
    pub source: Provenance,
    pub destination: PathBuf,
    pub state: RecordState,
}

/// Classify every record in `metadata`. Nothing is written.
pub fn inspect(work_dir: &Path, metadata: &SyncMetadata) -> Vec<RecordStatus> {
    metadata
        .files
        .iter()
        .map(|record| {
            let destination = writer::destination_path(work_dir, Path::new(&record.path))
                .unwrap_or_else(|_| work_dir.join(record.path.trim_start_matches('/')));
            let state = classify(record, &destination);
            RecordStatus {
                path: record.path.clone(),
                source: record.source.clone(),
                destination,
                state,
            }
        })
        .collect()
}

fn classify(record: &SyncRecord, destination: &Path) -> RecordState {
    if record.is_command() {
        return RecordState::Command;
    }
    let source = Path::new(&record.path);
    let hash = match hasher::hash_file(source) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::debug!(path = %record.path, error = %e, "source not readable");
            return RecordState::MissingSource;
        }
    };
    if !destination.is_file() {
        return RecordState::MissingDestination;
    }
    if hash != record.hash {
        return RecordState::Modified;
    }
    RecordState::Current
}

/// Modification time of the metadata document, i.e. the end of the last run.
///
/// `None` when the work dir was never synced.
pub fn last_synced(work_dir: &Path) -> Option<SystemTime> {
    std::fs::metadata(metadata::path_in(work_dir))
        .and_then(|meta| meta.modified())
        .ok()
}

/// Format age from a filesystem timestamp.
pub fn format_system_time_age(timestamp: SystemTime) -> String {
    let age = SystemTime::now()
        .duration_since(timestamp)
        .unwrap_or_default();
    format_duration(age)
}

pub fn format_duration(duration: Duration) -> String {
    format_seconds(duration.as_secs())
}

fn format_seconds(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}
