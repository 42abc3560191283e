pub mod check;
pub mod status;
pub mod sync;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use configsync_core::{config, SyncConfig};

/// Locate, load and validate the configuration.
pub(crate) fn load_config(explicit: Option<&Path>) -> Result<(PathBuf, SyncConfig)> {
    let path = config::locate(explicit).context("no configuration file")?;
    let cfg = config::load(&path)
        .with_context(|| format!("failed to load config '{}'", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config '{}'", path.display()))?;
    Ok((path, cfg))
}
