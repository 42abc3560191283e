//! configsync core library — configuration types, loading, errors.
//!
//! Public API surface:
//! - [`types`] — config structs and git option resolution
//! - [`config`] — locate / load / include expansion
//! - [`error`] — [`ConfigError`]
//! - [`host`] — hostname lookup used for default author and branch

pub mod config;
pub mod error;
pub mod host;
pub mod types;

pub use error::ConfigError;
pub use types::{
    CommandSpec, ConfigFormat, ConfigFragment, GitOptions, ResolvedGit, SyncConfig,
};
