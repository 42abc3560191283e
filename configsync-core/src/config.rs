//! Configuration file loading.
//!
//! # Lookup order
//!
//! ```text
//! 1. explicit path given on the command line
//! 2. $CONFIGSYNC_CONFIG
//! 3. <config_dir>/configsync/config.toml
//! ```
//!
//! # Formats
//!
//! The encoding is chosen by extension: `.json`, `.toml`, `.yaml` / `.yml`.
//! When `include_dir` is set, every config file directly inside it is parsed
//! as a [`ConfigFragment`] and its `files` / `commands` are appended, in file
//! name order. A relative `include_dir` is resolved against the directory of
//! the main config file.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::error::{io_err, ConfigError};
use crate::types::{ConfigFormat, ConfigFragment, SyncConfig};

/// Environment variable naming the config file when no path is given.
pub const CONFIG_ENV: &str = "CONFIGSYNC_CONFIG";

// ---------------------------------------------------------------------------
// 1. Locate
// ---------------------------------------------------------------------------

/// Pick the config file to load (see module docs for the lookup order).
pub fn locate(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    locate_with(
        explicit,
        std::env::var_os(CONFIG_ENV).map(PathBuf::from),
        dirs::config_dir(),
    )
}

/// [`locate`] with the environment and config dir passed explicitly.
pub fn locate_with(
    explicit: Option<&Path>,
    env_value: Option<PathBuf>,
    config_dir: Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = env_value.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(path);
    }
    let default = config_dir
        .map(|dir| dir.join("configsync").join("config.toml"))
        .ok_or(ConfigError::ConfigNotFound)?;
    if default.is_file() {
        Ok(default)
    } else {
        Err(ConfigError::ConfigNotFound)
    }
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load a config file and merge its include fragments.
///
/// The result is not validated; call [`SyncConfig::validate`] before use.
pub fn load(path: &Path) -> Result<SyncConfig, ConfigError> {
    let mut config: SyncConfig = parse_file(path)?;

    if let Some(include_dir) = config.include_dir.clone() {
        let include_dir = if include_dir.is_relative() {
            path.parent()
                .map(|parent| parent.join(&include_dir))
                .unwrap_or(include_dir)
        } else {
            include_dir
        };

        for fragment_path in list_fragments(&include_dir)? {
            let fragment: ConfigFragment = parse_file(&fragment_path)?;
            tracing::debug!(
                path = %fragment_path.display(),
                files = fragment.files.len(),
                commands = fragment.commands.len(),
                "merging config fragment"
            );
            config.files.extend(fragment.files);
            config.commands.extend(fragment.commands);
        }
    }

    Ok(config)
}

/// Parse config text in a given format. `path` is only used for error context.
pub fn parse_str<T: DeserializeOwned>(
    contents: &str,
    format: ConfigFormat,
    path: &Path,
) -> Result<T, ConfigError> {
    match format {
        ConfigFormat::Json => serde_json::from_str(contents).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        }),
        ConfigFormat::Toml => toml::from_str(contents).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        }),
        ConfigFormat::Yaml => {
            serde_yaml::from_str(contents).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

fn parse_file<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    parse_str(&contents, format, path)
}

/// Config files directly inside `dir`, sorted by file name.
fn list_fragments(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let mut fragments: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| io_err(dir, e))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.path())
        .filter(|p| ConfigFormat::from_path(p).is_some())
        .collect();
    fragments.sort();
    Ok(fragments)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
