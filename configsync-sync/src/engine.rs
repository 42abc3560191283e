//! Sync engine: reconciles the work dir with the configured sources.
//!
//! A run walks a fixed sequence of stages:
//!
//! ```text
//! Init → BranchReady → Removal → FileCopy → Commands → MetadataPersisted → Committed → Done
//! ```
//!
//! Failures before `Removal` and while persisting metadata abort the run with
//! a [`SyncError`]. Anything that goes wrong with a single file or command is
//! logged, reported as [`WriteResult::Failed`] and leaves that artifact out of
//! the new metadata document.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use configsync_core::{CommandSpec, ResolvedGit, SyncConfig};
use configsync_git::{GitError, VersionControl};

use crate::error::{io_err, ArtifactError, SyncError};
use crate::hasher::{self, ABSENT};
use crate::metadata::{self, FileInfo, Provenance, SyncMetadata, SyncRecord};
use crate::resolver::{self, ResolvedFile};
use crate::{command, writer};

/// Commit message used for every automatic commit.
pub const COMMIT_MESSAGE: &str = "Automatic config sync";

/// Progress marker of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    Init,
    BranchReady,
    Removal,
    FileCopy,
    Commands,
    MetadataPersisted,
    Committed,
    Done,
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncStage::Init => "init",
            SyncStage::BranchReady => "branch checkout",
            SyncStage::Removal => "removal",
            SyncStage::FileCopy => "file copy",
            SyncStage::Commands => "commands",
            SyncStage::MetadataPersisted => "metadata persistence",
            SyncStage::Committed => "commit",
            SyncStage::Done => "done",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Outcome of a single file or command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// Destination was (re)written.
    Written { path: PathBuf },
    /// Destination already held the source content.
    Unchanged { path: PathBuf },
    /// Artifact skipped; its prior destination is left as it was.
    Failed { path: PathBuf, reason: String },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path }
            | WriteResult::Unchanged { path }
            | WriteResult::Failed { path, .. } => path,
        }
    }
}

/// Summary of one [`SyncEngine::run`].
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Artifact paths whose destinations were removed.
    pub removed: Vec<PathBuf>,
    /// Files first, then commands, in processing order.
    pub writes: Vec<WriteResult>,
    pub committed: bool,
    /// Why staging or committing failed; the synced files stay uncommitted.
    pub commit_error: Option<String>,
    /// The tree already had uncommitted changes when the run started.
    pub dirty_on_entry: bool,
    pub duration: Duration,
}

impl SyncReport {
    pub fn written(&self) -> usize {
        self.count(|w| matches!(w, WriteResult::Written { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|w| matches!(w, WriteResult::Unchanged { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|w| matches!(w, WriteResult::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&WriteResult) -> bool) -> usize {
        self.writes.iter().filter(|w| pred(w)).count()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// One configured sync job bound to a version-control backend.
pub struct SyncEngine<V> {
    work_dir: PathBuf,
    patterns: Vec<String>,
    commands: Vec<CommandSpec>,
    git: ResolvedGit,
    vcs: V,
}

impl<V: VersionControl> SyncEngine<V> {
    pub fn new(config: &SyncConfig, git: ResolvedGit, vcs: V) -> Self {
        Self {
            work_dir: config.work_dir.clone(),
            patterns: config.files.clone(),
            commands: config.commands.clone(),
            git,
            vcs,
        }
    }

    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Execute one full sync.
    pub fn run(&self) -> Result<SyncReport, SyncError> {
        let started = Instant::now();
        let mut report = SyncReport::default();

        report.dirty_on_entry = self.prepare()?;

        let metadata_path = metadata::path_in(&self.work_dir);
        let prior = metadata::load(&metadata_path);
        tracing::debug!(records = prior.files.len(), "loaded prior metadata");

        tracing::debug!(stage = %SyncStage::Removal, "reconciling");
        report.removed = self.remove_stale(&prior);

        let mut next = SyncMetadata::default();
        let mut claimed = HashSet::new();

        tracing::debug!(stage = %SyncStage::FileCopy, "reconciling");
        for file in resolver::resolve(&self.patterns) {
            let outcome = self.sync_file(&file, &mut claimed);
            report.writes.push(settle(&file.path, outcome, &mut next));
        }

        tracing::debug!(stage = %SyncStage::Commands, "reconciling");
        for spec in &self.commands {
            let outcome = self.sync_command(spec, &mut claimed);
            let path = PathBuf::from(&spec.file_path);
            report.writes.push(settle(&path, outcome, &mut next));
        }

        metadata::save(&metadata_path, &next)?;
        tracing::debug!(
            stage = %SyncStage::MetadataPersisted,
            records = next.files.len(),
            "metadata saved"
        );

        match self.commit() {
            Ok(committed) => report.committed = committed,
            Err(e) => {
                tracing::error!(stage = %SyncStage::Committed, error = %e, "commit failed");
                report.commit_error = Some(e.to_string());
            }
        }
        report.duration = started.elapsed();
        tracing::info!(
            stage = %SyncStage::Done,
            written = report.written(),
            unchanged = report.unchanged(),
            failed = report.failed(),
            removed = report.removed.len(),
            committed = report.committed,
            commit_failed = report.commit_error.is_some(),
            duration_ms = report.duration.as_millis() as u64,
            "sync finished"
        );
        Ok(report)
    }

    /// Work dir, repository and branch. Returns whether the tree was dirty.
    fn prepare(&self) -> Result<bool, SyncError> {
        std::fs::create_dir_all(&self.work_dir).map_err(|source| SyncError::WorkDir {
            path: self.work_dir.clone(),
            source,
        })?;

        self.vcs.ensure_repository().map_err(|source| SyncError::Git {
            stage: SyncStage::Init,
            source,
        })?;

        let dirty = match self.vcs.has_changes() {
            Ok(dirty) => dirty,
            Err(e) => {
                tracing::warn!(error = %e, "cannot determine repository status");
                false
            }
        };
        if dirty {
            tracing::warn!(
                path = %self.work_dir.display(),
                "work dir has uncommitted changes; they will be included in the next commit"
            );
        }

        self.vcs
            .checkout(&self.git.branch)
            .map_err(|source| SyncError::Git {
                stage: SyncStage::BranchReady,
                source,
            })?;
        tracing::debug!(stage = %SyncStage::BranchReady, branch = %self.git.branch, "branch ready");

        if self.git.remote.is_some() {
            if let Err(e) = self.vcs.pull() {
                tracing::warn!(error = %e, "pull failed; continuing with local state");
            }
        }
        Ok(dirty)
    }

    fn remove_stale(&self, prior: &SyncMetadata) -> Vec<PathBuf> {
        let patterns: HashSet<&str> = self.patterns.iter().map(String::as_str).collect();
        let commands: HashSet<&str> = self.commands.iter().map(|c| c.file_path.as_str()).collect();

        let mut removed = Vec::new();
        let mut destinations = Vec::new();
        for record in plan_removals(prior, &patterns, &commands) {
            match writer::destination_path(&self.work_dir, Path::new(&record.path)) {
                Ok(dest) => {
                    removed.push(PathBuf::from(&record.path));
                    destinations.push(dest);
                }
                Err(e) => tracing::error!(path = %record.path, error = %e, "cannot remove record"),
            }
        }
        if destinations.is_empty() {
            return removed;
        }

        if let Err(e) = self.vcs.remove(&destinations) {
            tracing::warn!(error = %e, count = destinations.len(), "git rm failed");
        }
        // Never-committed destinations survive `git rm`.
        for dest in &destinations {
            match std::fs::remove_file(dest) {
                Ok(()) => tracing::debug!(path = %dest.display(), "deleted untracked destination"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::error!(path = %dest.display(), error = %e, "cannot delete destination"),
            }
        }
        removed
    }

    fn sync_file(
        &self,
        file: &ResolvedFile,
        claimed: &mut HashSet<PathBuf>,
    ) -> Result<(WriteResult, SyncRecord), ArtifactError> {
        let source = file.path.as_path();
        // A lossy name would never match the source again on the next run.
        let path = source
            .to_str()
            .ok_or_else(|| ArtifactError::NonUtf8Path {
                path: source.to_path_buf(),
            })?
            .to_string();
        let dest = self.claim(source, claimed)?;

        let meta = std::fs::metadata(source).map_err(|e| io_err(source, e))?;
        let source_hash = hasher::hash_file(source)?;
        let dest_hash = if dest.is_file() {
            hasher::hash_file(&dest)?
        } else {
            ABSENT
        };

        let record = SyncRecord {
            path,
            hash: source_hash,
            info: FileInfo::from_metadata(&meta),
            source: Provenance::Pattern(file.pattern.clone()),
        };

        if source_hash == dest_hash {
            tracing::debug!(path = %source.display(), "already in sync");
            return Ok((WriteResult::Unchanged { path: file.path.clone() }, record));
        }

        writer::copy_atomic(source, &dest, meta.len())?;
        let written_hash = hasher::hash_file(&dest)?;
        if written_hash != source_hash {
            return Err(ArtifactError::HashMismatch {
                path: dest,
                expected: source_hash,
                actual: written_hash,
            });
        }
        tracing::info!(path = %source.display(), dest = %dest.display(), "synced file");
        Ok((WriteResult::Written { path: file.path.clone() }, record))
    }

    fn sync_command(
        &self,
        spec: &CommandSpec,
        claimed: &mut HashSet<PathBuf>,
    ) -> Result<(WriteResult, SyncRecord), ArtifactError> {
        let artifact = Path::new(&spec.file_path);
        let dest = self.claim(artifact, claimed)?;

        tracing::info!(command = %spec.display_line(), path = %spec.file_path, "running command");
        let output = command::capture(spec)?;

        let previous = if dest.is_file() {
            hasher::hash_file(&dest).unwrap_or(ABSENT)
        } else {
            ABSENT
        };
        let hash = hasher::hash_bytes(&output);
        let result = if hash == previous {
            tracing::debug!(path = %spec.file_path, "command output unchanged");
            WriteResult::Unchanged {
                path: artifact.to_path_buf(),
            }
        } else {
            writer::write_atomic(&dest, &output)?;
            tracing::info!(path = %spec.file_path, bytes = output.len(), "captured command output");
            WriteResult::Written {
                path: artifact.to_path_buf(),
            }
        };

        let meta = std::fs::metadata(&dest).map_err(|e| io_err(&dest, e))?;
        let mut info = FileInfo::from_metadata(&meta);
        let (uid, gid) = spec.credentials().unwrap_or((0, 0));
        info.uid = uid;
        info.gid = gid;

        let record = SyncRecord {
            path: spec.file_path.clone(),
            hash,
            info,
            source: Provenance::Command,
        };
        Ok((result, record))
    }

    /// Map `artifact` to its destination and reserve it for this run.
    ///
    /// The staging path next to the destination is reserved too, so no
    /// artifact can land where another one stages its bytes.
    fn claim(
        &self,
        artifact: &Path,
        claimed: &mut HashSet<PathBuf>,
    ) -> Result<PathBuf, ArtifactError> {
        let dest = writer::destination_path(&self.work_dir, artifact)?;
        if dest == metadata::path_in(&self.work_dir) {
            return Err(ArtifactError::InvalidDestination {
                path: artifact.to_path_buf(),
            });
        }
        let staging = writer::temp_path(&dest);
        if claimed.contains(&dest) || claimed.contains(&staging) {
            return Err(ArtifactError::DuplicateDestination { path: dest });
        }
        claimed.insert(staging);
        claimed.insert(dest.clone());
        Ok(dest)
    }

    /// Commit and push when the tree changed.
    ///
    /// `Ok(false)` means there was nothing to commit. A failed push is only
    /// logged; the commit is still in place locally.
    fn commit(&self) -> Result<bool, GitError> {
        if !self.vcs.has_changes()? {
            tracing::info!("no changes to commit");
            return Ok(false);
        }

        self.vcs.add(std::slice::from_ref(&self.work_dir))?;
        self.vcs.commit(COMMIT_MESSAGE, &self.git.author)?;
        tracing::info!(stage = %SyncStage::Committed, author = %self.git.author, "committed changes");

        if let Some(remote) = &self.git.remote {
            if let Err(e) = self.vcs.push(remote, &self.git.branch) {
                tracing::warn!(%remote, error = %e, "push failed");
            }
        }
        Ok(true)
    }
}

/// Record a success, or log a failure and leave the artifact out.
fn settle(
    path: &Path,
    outcome: Result<(WriteResult, SyncRecord), ArtifactError>,
    next: &mut SyncMetadata,
) -> WriteResult {
    match outcome {
        Ok((result, record)) => {
            next.files.push(record);
            result
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "skipping artifact");
            WriteResult::Failed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        }
    }
}

/// Prior records that must disappear from the work dir.
///
/// A command record goes when its destination is no longer configured. A file
/// record goes when its pattern is no longer configured or its source is no
/// longer a regular file.
pub fn plan_removals<'a>(
    prior: &'a SyncMetadata,
    patterns: &HashSet<&str>,
    commands: &HashSet<&str>,
) -> Vec<&'a SyncRecord> {
    prior
        .files
        .iter()
        .filter(|record| match &record.source {
            Provenance::Command => {
                let keep = commands.contains(record.path.as_str());
                if !keep {
                    tracing::warn!(path = %record.path, "command output removed from config");
                }
                !keep
            }
            Provenance::Pattern(pattern) => {
                if !patterns.contains(pattern.as_str()) {
                    tracing::warn!(path = %record.path, %pattern, "pattern removed from config");
                    true
                } else if !Path::new(&record.path).is_file() {
                    tracing::warn!(path = %record.path, "source no longer exists");
                    true
                } else {
                    false
                }
            }
        })
        .collect()
}
