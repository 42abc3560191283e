//! Shared sync entrypoint used by the CLI.

use configsync_core::SyncConfig;
use configsync_git::GitCli;

use crate::engine::{SyncEngine, SyncReport, SyncStage};
use crate::error::SyncError;

/// Validate `config`, bind the installed git binary and run one sync.
pub fn run(config: &SyncConfig) -> Result<SyncReport, SyncError> {
    config.validate()?;
    let git = config.git.resolve()?;
    tracing::debug!(
        binary = %git.binary.display(),
        branch = %git.branch,
        remote = git.remote.as_deref().unwrap_or("-"),
        "resolved git options"
    );

    let vcs = GitCli::new(&git.binary, &config.work_dir).map_err(|source| SyncError::Git {
        stage: SyncStage::Init,
        source,
    })?;
    SyncEngine::new(config, git, vcs).run()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use configsync_core::{ConfigError, GitOptions};
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn invalid_config_fails_before_touching_disk() {
        let tmp = TempDir::new().expect("tmp");
        let work_dir = tmp.path().join("sync");
        let config = SyncConfig {
            work_dir: work_dir.clone(),
            ..SyncConfig::default()
        };
        let err = run(&config).unwrap_err();
        assert!(matches!(err, SyncError::Config(ConfigError::NothingToSync)));
        assert!(!work_dir.exists());
    }

    #[test]
    fn unusable_git_binary_is_an_init_error() {
        let tmp = TempDir::new().expect("tmp");
        let config = SyncConfig {
            work_dir: tmp.path().join("sync"),
            files: vec!["/etc/hostname".to_string()],
            git: GitOptions {
                path: Some(PathBuf::from("/nonexistent/git")),
                author: Some("ops <ops@example.com>".to_string()),
                branch_name: Some("main".to_string()),
                ..GitOptions::default()
            },
            ..SyncConfig::default()
        };
        let err = run(&config).unwrap_err();
        assert!(matches!(
            err,
            SyncError::Git {
                stage: SyncStage::Init,
                ..
            }
        ));
    }
}
