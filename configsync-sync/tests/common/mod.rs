//! Shared fixtures for engine tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

use configsync_core::{CommandSpec, ResolvedGit, SyncConfig};
use configsync_git::{GitError, VersionControl};
use configsync_sync::SyncEngine;

pub const AUTHOR: &str = "configsync <configsync@test-host>";

/// In-memory stand-in for a git repository.
///
/// Every call is logged. `dirty` is what `has_changes` answers; a commit
/// clears it.
#[derive(Default)]
pub struct FakeVcs {
    pub calls: RefCell<Vec<String>>,
    pub dirty: Cell<bool>,
    pub fail_checkout: bool,
    pub fail_commit: bool,
    pub removed: RefCell<Vec<PathBuf>>,
}

impl FakeVcs {
    pub fn dirty() -> Self {
        let vcs = Self::default();
        vcs.dirty.set(true);
        vcs
    }

    pub fn called(&self, name: &str) -> bool {
        self.calls.borrow().iter().any(|c| c == name)
    }

    fn log(&self, name: &str) {
        self.calls.borrow_mut().push(name.to_string());
    }
}

impl VersionControl for FakeVcs {
    fn ensure_repository(&self) -> Result<(), GitError> {
        self.log("ensure_repository");
        Ok(())
    }

    fn current_branch(&self) -> Result<String, GitError> {
        Ok("main".to_string())
    }

    fn checkout(&self, _branch: &str) -> Result<(), GitError> {
        self.log("checkout");
        if self.fail_checkout {
            return Err(GitError::Backend("checkout refused".to_string()));
        }
        Ok(())
    }

    fn pull(&self) -> Result<(), GitError> {
        self.log("pull");
        Err(GitError::Backend("no remote".to_string()))
    }

    fn push(&self, _remote: &str, _branch: &str) -> Result<(), GitError> {
        self.log("push");
        Ok(())
    }

    fn has_changes(&self) -> Result<bool, GitError> {
        Ok(self.dirty.get())
    }

    fn add(&self, _paths: &[PathBuf]) -> Result<(), GitError> {
        self.log("add");
        Ok(())
    }

    fn remove(&self, paths: &[PathBuf]) -> Result<(), GitError> {
        self.log("remove");
        self.removed.borrow_mut().extend(paths.iter().cloned());
        Ok(())
    }

    fn commit(&self, _message: &str, _author: &str) -> Result<(), GitError> {
        self.log("commit");
        if self.fail_commit {
            return Err(GitError::Backend("commit rejected by hook".to_string()));
        }
        self.dirty.set(false);
        Ok(())
    }
}

pub fn resolved_git(remote: Option<&str>) -> ResolvedGit {
    ResolvedGit {
        binary: PathBuf::from("git"),
        author: AUTHOR.to_string(),
        branch: "main".to_string(),
        remote: remote.map(str::to_string),
    }
}

pub fn config(work_dir: &Path, files: Vec<String>, commands: Vec<CommandSpec>) -> SyncConfig {
    SyncConfig {
        work_dir: work_dir.to_path_buf(),
        files,
        commands,
        ..SyncConfig::default()
    }
}

pub fn engine(config: &SyncConfig) -> SyncEngine<FakeVcs> {
    SyncEngine::new(config, resolved_git(None), FakeVcs::default())
}

pub fn shell(line: &str, file_path: &str) -> CommandSpec {
    CommandSpec {
        command_line: Some(line.to_string()),
        file_path: file_path.to_string(),
        ..CommandSpec::default()
    }
}

/// `<work_dir>/<path without its root>`
pub fn dest_of(work_dir: &Path, source: &Path) -> PathBuf {
    let relative: PathBuf = source
        .components()
        .filter(|c| matches!(c, std::path::Component::Normal(_)))
        .collect();
    work_dir.join(relative)
}

pub fn pattern(path: &Path) -> String {
    path.display().to_string()
}
