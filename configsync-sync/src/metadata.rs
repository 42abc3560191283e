//! Metadata store — the record of what the previous run synced.
//!
//! Persists a `SyncMetadata` JSON document at
//! `<work_dir>/configsync_meta.json`:
//!
//! ```json
//! {
//!   "Files": [
//!     {"Path": "/etc/hosts", "Hash": 123, "Info": {"Mode": 420, "UID": 0, "GID": 0}, "Source": "/etc/hosts"}
//!   ]
//! }
//! ```
//!
//! Loading never fails: a missing or unreadable document is an empty one.
//! Writes stage to `.tmp`, fsync, then rename over the document.

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// File name of the metadata document inside the work dir.
pub const METADATA_FILE: &str = "configsync_meta.json";

/// Provenance marker stored for command outputs.
pub const COMMAND_SOURCE: &str = "cmd";

/// What produced a record: a configured file pattern or a command.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Provenance {
    Command,
    Pattern(String),
}

impl Default for Provenance {
    fn default() -> Self {
        Provenance::Pattern(String::new())
    }
}

impl From<String> for Provenance {
    fn from(s: String) -> Self {
        if s == COMMAND_SOURCE {
            Provenance::Command
        } else {
            Provenance::Pattern(s)
        }
    }
}

impl From<Provenance> for String {
    fn from(p: Provenance) -> Self {
        match p {
            Provenance::Command => COMMAND_SOURCE.to_string(),
            Provenance::Pattern(pattern) => pattern,
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Command => f.write_str(COMMAND_SOURCE),
            Provenance::Pattern(pattern) => f.write_str(pattern),
        }
    }
}

/// Permission and ownership snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    #[serde(rename = "Mode", default)]
    pub mode: u32,
    #[serde(rename = "UID", default)]
    pub uid: u32,
    #[serde(rename = "GID", default)]
    pub gid: u32,
}

impl FileInfo {
    /// Permission bits and numeric owner of `meta`.
    #[cfg(unix)]
    pub fn from_metadata(meta: &std::fs::Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        Self {
            mode: meta.mode() & 0o7777,
            uid: meta.uid(),
            gid: meta.gid(),
        }
    }

    /// Permission bits approximated from the read-only flag; no ownership.
    #[cfg(not(unix))]
    pub fn from_metadata(meta: &std::fs::Metadata) -> Self {
        let mode = if meta.permissions().readonly() { 0o444 } else { 0o644 };
        Self {
            mode,
            uid: 0,
            gid: 0,
        }
    }
}

/// One previously-synced artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecord {
    /// Destination path, relative to the work dir. For file sources this is
    /// also the source path on disk.
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "Hash", default)]
    pub hash: u64,
    #[serde(rename = "Info", default)]
    pub info: FileInfo,
    #[serde(rename = "Source", default)]
    pub source: Provenance,
}

impl SyncRecord {
    pub fn is_command(&self) -> bool {
        self.source == Provenance::Command
    }
}

/// The whole document; replaced, never patched, on every run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMetadata {
    #[serde(rename = "Files", default)]
    pub files: Vec<SyncRecord>,
}

/// `<work_dir>/configsync_meta.json`
pub fn path_in(work_dir: &Path) -> PathBuf {
    work_dir.join(METADATA_FILE)
}

/// Load the metadata document at `path`.
///
/// Returns an empty document if the file is missing or cannot be parsed.
pub fn load(path: &Path) -> SyncMetadata {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return SyncMetadata::default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read metadata; starting empty");
            return SyncMetadata::default();
        }
    };
    match serde_json::from_str(&contents) {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "corrupt metadata; starting empty");
            SyncMetadata::default()
        }
    }
}

/// Save `metadata` to `path` atomically.
///
/// Writes to `<path>.tmp` then renames to `<path>`.
pub fn save(path: &Path, metadata: &SyncMetadata) -> Result<(), SyncError> {
    let mut json = serde_json::to_string_pretty(metadata)?;
    json.push('\n');

    let tmp = path.with_extension("json.tmp");
    let fail = |source| SyncError::Metadata {
        path: path.to_path_buf(),
        source,
    };
    let staged = stage(&tmp, json.as_bytes()).and_then(|()| std::fs::rename(&tmp, path));
    if let Err(e) = staged {
        let _ = std::fs::remove_file(&tmp);
        return Err(fail(e));
    }
    Ok(())
}

fn stage(tmp: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(tmp)?;
    file.write_all(content)?;
    file.sync_all()
}
