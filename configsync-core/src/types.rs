//! Domain types for configsync configuration.
//!
//! All path fields use `PathBuf`. File patterns stay `String` because they are
//! glob expressions and are compared verbatim against recorded provenance.
//! All types are serializable/deserializable via serde.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::host;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// An external command whose standard output is captured into the work dir.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CommandSpec {
    /// Executable to run directly with `arguments`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exe_path: Option<String>,
    /// Shell line run through `sh -c`; mutually exclusive with `exe_path`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_line: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,
    /// `KEY=VALUE` entries. When non-empty they replace the inherited environment.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<String>,
    pub user: u32,
    pub group: u32,
    /// Destination path, relative to the work dir.
    pub file_path: String,
}

impl CommandSpec {
    /// Credentials to run under. Zero means unset, so both ids must be non-zero.
    pub fn credentials(&self) -> Option<(u32, u32)> {
        (self.user > 0 && self.group > 0).then_some((self.user, self.group))
    }

    /// Human-readable invocation, used in log lines.
    pub fn display_line(&self) -> String {
        match (&self.exe_path, &self.command_line) {
            (Some(exe), _) if self.arguments.is_empty() => exe.clone(),
            (Some(exe), _) => format!("{exe} {}", self.arguments.join(" ")),
            (None, Some(line)) => line.clone(),
            (None, None) => String::new(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidCommand {
            file_path: self.file_path.clone(),
            reason: reason.to_string(),
        };
        if self.file_path.trim().is_empty() {
            return Err(invalid("file_path is required"));
        }
        match (&self.exe_path, &self.command_line) {
            (Some(_), Some(_)) => Err(invalid("set exe_path or command_line, not both")),
            (None, None) => Err(invalid("one of exe_path or command_line is required")),
            (Some(exe), None) if exe.trim().is_empty() => Err(invalid("exe_path is empty")),
            (None, Some(line)) if line.trim().is_empty() => Err(invalid("command_line is empty")),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Git options
// ---------------------------------------------------------------------------

/// Git options as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GitOptions {
    /// Path to the git binary; discovered on `PATH` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub remote_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_name: Option<String>,
    /// Branch to commit on; defaults to the local hostname.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
}

/// Git options with every default filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGit {
    pub binary: PathBuf,
    pub author: String,
    pub branch: String,
    /// `Some(remote)` only when remote sync is enabled.
    pub remote: Option<String>,
}

impl GitOptions {
    /// Fill in defaults using the local hostname.
    pub fn resolve(&self) -> Result<ResolvedGit, ConfigError> {
        self.resolve_with_host(host::hostname().as_deref())
    }

    /// Fill in defaults from an explicit hostname (`None` when unknown).
    pub fn resolve_with_host(&self, hostname: Option<&str>) -> Result<ResolvedGit, ConfigError> {
        let remote = if self.remote_enabled {
            match non_empty(self.remote_name.as_deref()) {
                Some(name) => Some(name.to_string()),
                None => return Err(ConfigError::MissingRemoteName),
            }
        } else {
            None
        };

        let author = match non_empty(self.author.as_deref()) {
            Some(author) => author.to_string(),
            None => {
                let host = hostname.ok_or(ConfigError::MissingAuthor)?;
                format!("configsync <configsync@{host}>")
            }
        };

        let branch = match non_empty(self.branch_name.as_deref()) {
            Some(branch) => branch.to_string(),
            None => hostname.ok_or(ConfigError::MissingBranch)?.to_string(),
        };

        let binary = match &self.path {
            Some(path) if !path.as_os_str().is_empty() => path.clone(),
            _ => which::which("git")?,
        };

        Ok(ResolvedGit {
            binary,
            author,
            branch,
            remote,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Root config
// ---------------------------------------------------------------------------

/// Root of a configsync configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    /// Repository root that receives every synced artifact.
    pub work_dir: PathBuf,
    /// Literal paths, glob patterns, or directories.
    pub files: Vec<String>,
    pub commands: Vec<CommandSpec>,
    pub git: GitOptions,
    pub verbose: bool,
    /// Directory of config fragments merged into `files` and `commands`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_dir: Option<PathBuf>,
}

impl SyncConfig {
    /// Check the invariants the sync engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.work_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingWorkDir);
        }
        if self.files.is_empty() && self.commands.is_empty() {
            return Err(ConfigError::NothingToSync);
        }
        for command in &self.commands {
            command.validate()?;
        }
        if self.git.remote_enabled && non_empty(self.git.remote_name.as_deref()).is_none() {
            return Err(ConfigError::MissingRemoteName);
        }
        Ok(())
    }
}

/// Extra files and commands contributed by an include fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConfigFragment {
    pub files: Vec<String>,
    pub commands: Vec<CommandSpec>,
}

/// Supported config file encodings, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
    Yaml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFormat::Json => write!(f, "json"),
            ConfigFormat::Toml => write!(f, "toml"),
            ConfigFormat::Yaml => write!(f, "yaml"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
