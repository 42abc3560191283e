use std::process::ExitStatus;

use semver::Version;
use thiserror::Error;

/// Error surface for version-control operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The git binary could not be spawned at all.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// git ran but exited unsuccessfully.
    #[error("`{command}` failed ({status}): {stderr}")]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("unrecognised git version output: {0}")]
    UnknownVersion(String),

    #[error("unsupported git version {found} (minimum {minimum})")]
    UnsupportedVersion { found: Version, minimum: Version },

    /// Failure reported by a non-CLI backend.
    #[error("version control backend error: {0}")]
    Backend(String),
}
