//! Error types for configsync-sync.
//!
//! [`SyncError`] aborts a run. [`ArtifactError`] only skips the one file or
//! command it belongs to; the engine logs it and carries on.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use configsync_core::ConfigError;
use configsync_git::GitError;

use crate::engine::SyncStage;

/// Errors that stop a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Invalid or incomplete configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The work directory could not be created.
    #[error("cannot create work directory {path}: {source}")]
    WorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The repository could not be opened, verified, or prepared.
    #[error("git error during {stage}: {source}")]
    Git {
        stage: SyncStage,
        #[source]
        source: GitError,
    },

    /// Metadata persistence failed.
    #[error("cannot save metadata at {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error (metadata).
    #[error("metadata JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure confined to a single artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("short copy to {path}: wrote {written} of {expected} bytes")]
    ShortCopy {
        path: PathBuf,
        expected: u64,
        written: u64,
    },

    #[error("hash mismatch at {path}: source {expected:#018x}, destination {actual:#018x}")]
    HashMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// The destination would escape the work dir or is empty.
    #[error("invalid destination path '{path}'")]
    InvalidDestination { path: PathBuf },

    /// Two artifacts in one run resolved to the same destination, or one
    /// destination is another's staging file.
    #[error("destination {path} is already claimed by another artifact in this run")]
    DuplicateDestination { path: PathBuf },

    /// Metadata stores source paths as strings.
    #[error("source path {path} is not valid UTF-8")]
    NonUtf8Path { path: PathBuf },

    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Convenience constructor for [`ArtifactError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ArtifactError {
    ArtifactError::Io {
        path: path.into(),
        source,
    }
}
