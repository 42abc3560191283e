//! Error types for configsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (file not found, permission denied, etc.).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parse error — includes the offending file path.
    #[error("failed to parse JSON config at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// TOML parse error — includes the offending file path.
    #[error("failed to parse TOML config at {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// YAML parse error — includes the offending file path.
    #[error("failed to parse YAML config at {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The file extension does not map to a known config format.
    #[error("unsupported config format at {path}; expected .json, .toml, .yaml or .yml")]
    UnsupportedFormat { path: PathBuf },

    /// No config path was given and no default location exists.
    #[error("no config file given and none found at the default location")]
    ConfigNotFound,

    #[error("work_dir is required")]
    MissingWorkDir,

    #[error("at least one file pattern or command is required")]
    NothingToSync,

    /// A command entry is malformed.
    #[error("invalid command for '{file_path}': {reason}")]
    InvalidCommand { file_path: String, reason: String },

    #[error("git.remote_name is required when git.remote_enabled is set")]
    MissingRemoteName,

    /// No author was configured and none could be derived from the hostname.
    #[error("git author is empty and the hostname is unavailable to derive one")]
    MissingAuthor,

    /// No branch was configured and none could be derived from the hostname.
    #[error("git branch is empty and the hostname is unavailable to derive one")]
    MissingBranch,

    /// `git.path` was not set and no `git` binary exists on `PATH`.
    #[error("git binary not specified and not found on PATH: {0}")]
    GitNotFound(#[from] which::Error),
}

/// Convenience constructor for [`ConfigError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
