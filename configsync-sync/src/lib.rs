//! # configsync-sync
//!
//! Reconciliation engine that mirrors configured files and command outputs
//! into a git-tracked work dir.
//!
//! Call [`pipeline::run`] with a loaded [`configsync_core::SyncConfig`] to run
//! one sync against the installed `git`, or build a [`SyncEngine`] around any
//! [`configsync_git::VersionControl`] implementation.

pub mod command;
pub mod engine;
pub mod error;
pub mod hasher;
pub mod metadata;
pub mod pipeline;
pub mod resolver;
pub mod status;
pub mod writer;

pub use engine::{SyncEngine, SyncReport, SyncStage, WriteResult};
pub use error::{ArtifactError, SyncError};
pub use metadata::{Provenance, SyncMetadata, SyncRecord};
