//! Atomic destination writes.
//!
//! ## Protocol
//!
//! 1. Create the destination's parent directory.
//! 2. Stage the full content in the sibling `<destination>_`.
//! 3. Verify the staged byte count (copies only).
//! 4. Rename the staged file over the destination (atomic on POSIX).
//!
//! A crash before step 4 leaves the destination untouched; the stale `_`
//! file is truncated by the next write.

use std::ffi::OsString;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use crate::error::{io_err, ArtifactError};

/// Map an artifact path onto the work dir: `/etc/hosts` → `<work_dir>/etc/hosts`.
///
/// Root and `.` components are dropped; `..` is rejected so nothing escapes
/// the work dir.
pub fn destination_path(work_dir: &Path, artifact: &Path) -> Result<PathBuf, ArtifactError> {
    let invalid = || ArtifactError::InvalidDestination {
        path: artifact.to_path_buf(),
    };
    let mut relative = PathBuf::new();
    for component in artifact.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => return Err(invalid()),
            Component::Normal(part) => relative.push(part),
        }
    }
    if relative.as_os_str().is_empty() {
        return Err(invalid());
    }
    Ok(work_dir.join(relative))
}

/// `<dest>_`, the staging sibling of `dest`.
pub fn temp_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(dest.as_os_str());
    name.push("_");
    PathBuf::from(name)
}

/// Atomically replace `dest` with `content`.
pub fn write_atomic(dest: &Path, content: &[u8]) -> Result<(), ArtifactError> {
    write_atomic_with_tmp(dest, content, &temp_path(dest))
}

fn write_atomic_with_tmp(dest: &Path, content: &[u8], tmp: &Path) -> Result<(), ArtifactError> {
    ensure_parent(dest)?;
    if let Err(e) = stage_bytes(tmp, content) {
        let _ = std::fs::remove_file(tmp);
        return Err(e);
    }
    publish(tmp, dest)
}

/// Atomically replace `dest` with a copy of `source`.
///
/// Fails with [`ArtifactError::ShortCopy`] when the number of bytes copied
/// differs from `expected_len`. Returns the number of bytes written.
pub fn copy_atomic(source: &Path, dest: &Path, expected_len: u64) -> Result<u64, ArtifactError> {
    copy_atomic_with_tmp(source, dest, expected_len, &temp_path(dest))
}

fn copy_atomic_with_tmp(
    source: &Path,
    dest: &Path,
    expected_len: u64,
    tmp: &Path,
) -> Result<u64, ArtifactError> {
    ensure_parent(dest)?;
    let written = match stage_copy(source, tmp, expected_len) {
        Ok(written) => written,
        Err(e) => {
            let _ = std::fs::remove_file(tmp);
            return Err(e);
        }
    };
    publish(tmp, dest)?;
    Ok(written)
}

fn ensure_parent(dest: &Path) -> Result<(), ArtifactError> {
    match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))
        }
        _ => Ok(()),
    }
}

fn stage_bytes(tmp: &Path, content: &[u8]) -> Result<(), ArtifactError> {
    let mut file = File::create(tmp).map_err(|e| io_err(tmp, e))?;
    file.write_all(content).map_err(|e| io_err(tmp, e))?;
    file.sync_all().map_err(|e| io_err(tmp, e))
}

fn stage_copy(source: &Path, tmp: &Path, expected_len: u64) -> Result<u64, ArtifactError> {
    let mut reader = File::open(source).map_err(|e| io_err(source, e))?;
    let mut writer = File::create(tmp).map_err(|e| io_err(tmp, e))?;
    let written = io::copy(&mut reader, &mut writer).map_err(|e| io_err(source, e))?;
    if written != expected_len {
        return Err(ArtifactError::ShortCopy {
            path: source.to_path_buf(),
            expected: expected_len,
            written,
        });
    }
    writer.sync_all().map_err(|e| io_err(tmp, e))?;
    Ok(written)
}

fn publish(tmp: &Path, dest: &Path) -> Result<(), ArtifactError> {
    if let Err(e) = std::fs::rename(tmp, dest) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(dest, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
