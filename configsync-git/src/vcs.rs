//! Capability surface the sync engine needs from a version-control backend.

use std::path::PathBuf;

use crate::GitError;

/// Minimal repository operations used by a sync run.
///
/// Implementations operate on one repository directory fixed at construction.
pub trait VersionControl {
    /// Initialise the repository unless the directory already is one.
    fn ensure_repository(&self) -> Result<(), GitError>;

    /// Name of the checked-out branch.
    fn current_branch(&self) -> Result<String, GitError>;

    /// Switch to `branch`, creating it when it does not exist.
    /// No-op when it is already checked out.
    fn checkout(&self, branch: &str) -> Result<(), GitError>;

    fn pull(&self) -> Result<(), GitError>;

    fn push(&self, remote: &str, branch: &str) -> Result<(), GitError>;

    /// True when the tree has staged, unstaged or untracked changes.
    fn has_changes(&self) -> Result<bool, GitError>;

    fn add(&self, paths: &[PathBuf]) -> Result<(), GitError>;

    /// Force-remove `paths` from the index and the working tree.
    fn remove(&self, paths: &[PathBuf]) -> Result<(), GitError>;

    fn commit(&self, message: &str, author: &str) -> Result<(), GitError>;
}
