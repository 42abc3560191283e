//! # configsync-git
//!
//! Version-control capability layer for configsync.
//!
//! [`VersionControl`] is the surface the sync engine consumes; [`GitCli`]
//! implements it by shelling out to an installed `git` (1.7.0 or newer).

mod cli;
mod error;
mod vcs;
pub mod version;

pub use cli::GitCli;
pub use error::GitError;
pub use vcs::VersionControl;
