//! Path resolver — configured patterns to concrete files.
//!
//! Resolution order per pattern:
//! 1. An existing regular file resolves to itself; no glob evaluation.
//! 2. Otherwise the pattern is a glob. Invalid globs and globs without matches
//!    are logged and skipped.
//! 3. Matched directories expand recursively to the regular files beneath
//!    them; matched files are used directly.
//!
//! Every resolved file keeps the pattern it came from as provenance. A path
//! produced by several patterns is kept once, under the first pattern.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// One file to sync and the pattern that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub path: PathBuf,
    pub pattern: String,
}

/// Expand every pattern, in configuration order.
pub fn resolve(patterns: &[String]) -> Vec<ResolvedFile> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::new();

    for pattern in patterns {
        for path in expand(pattern) {
            if seen.insert(path.clone()) {
                resolved.push(ResolvedFile {
                    path,
                    pattern: pattern.clone(),
                });
            } else {
                tracing::debug!(path = %path.display(), %pattern, "already resolved by an earlier pattern");
            }
        }
    }

    resolved
}

fn expand(pattern: &str) -> Vec<PathBuf> {
    let literal = Path::new(pattern);
    if literal.is_file() {
        return vec![literal.to_path_buf()];
    }

    let entries = match glob::glob(pattern) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!(pattern, error = %e, "invalid glob pattern");
            return Vec::new();
        }
    };

    let mut matches = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => matches.push(path),
            Err(e) => {
                tracing::error!(pattern, path = %e.path().display(), error = %e.error(), "error reading glob match");
            }
        }
    }
    if matches.is_empty() {
        tracing::warn!(pattern, "no files matched glob");
        return Vec::new();
    }
    tracing::info!(pattern, count = matches.len(), "expanded glob");

    let mut files = Vec::new();
    for path in matches {
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => {
                let listed = list_files(&path);
                tracing::info!(path = %path.display(), count = listed.len(), "expanded directory");
                files.extend(listed);
            }
            Ok(meta) if meta.is_file() => files.push(path),
            Ok(_) => {
                tracing::warn!(path = %path.display(), pattern, "skipping non-regular file");
            }
            Err(e) => {
                tracing::error!(path = %path.display(), pattern, error = %e, "error querying path from glob");
            }
        }
    }
    files
}

/// Every regular file beneath `dir`, sorted by walk order.
///
/// Symlinks and directories are not listed. Unreadable subtrees are logged
/// and skipped.
pub fn list_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => {
                let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                tracing::error!(%path, error = %e, "error listing directory");
            }
        }
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"hello").unwrap();
    }

    #[test]
    fn list_files_recurses_all_levels() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("file.txt"));
        touch(&root.join("1/file.txt"));
        touch(&root.join("1/2/file.txt"));
        touch(&root.join("1/2/3/file.txt"));
        touch(&root.join("1/2/3/4/file.txt"));
        fs::create_dir_all(root.join("empty/dir")).unwrap();

        assert_eq!(list_files(root).len(), 5);
    }

    #[cfg(unix)]
    #[test]
    fn list_files_skips_symlinks() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("real.txt"));
        std::os::unix::fs::symlink(tmp.path().join("real.txt"), tmp.path().join("link.txt"))
            .unwrap();
        let files = list_files(tmp.path());
        assert_eq!(files, vec![tmp.path().join("real.txt")]);
    }

    #[test]
    fn literal_file_is_its_own_provenance() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("hosts");
        touch(&file);
        let pattern = file.display().to_string();

        let resolved = resolve(&[pattern.clone()]);
        assert_eq!(
            resolved,
            vec![ResolvedFile {
                path: file,
                pattern
            }]
        );
    }

    #[test]
    fn literal_path_with_glob_characters_is_not_expanded() {
        let tmp = TempDir::new().unwrap();
        let odd = tmp.path().join("[a].txt");
        touch(&odd);
        touch(&tmp.path().join("a.txt"));

        let resolved = resolve(&[odd.display().to_string()]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].path, odd);
    }

    #[test]
    fn glob_matches_are_sorted_and_tagged() {
        let tmp = TempDir::new().unwrap();
        for i in [3, 1, 2] {
            touch(&tmp.path().join(format!("{i}.txt")));
        }
        touch(&tmp.path().join("skip.log"));
        let pattern = format!("{}/*.txt", tmp.path().display());

        let resolved = resolve(&[pattern.clone()]);
        let names: Vec<_> = resolved
            .iter()
            .map(|r| r.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["1.txt", "2.txt", "3.txt"]);
        assert!(resolved.iter().all(|r| r.pattern == pattern));
    }

    #[test]
    fn first_pattern_wins_on_overlap() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.txt");
        touch(&file);
        let literal = file.display().to_string();
        let glob = format!("{}/*", tmp.path().display());

        let resolved = resolve(&[literal.clone(), glob]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].pattern, literal);
    }

    #[test]
    fn invalid_and_empty_globs_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let patterns = vec![
            format!("{}/[unclosed", tmp.path().display()),
            "/does/not/**/map/to/anything".to_string(),
        ];
        assert!(resolve(&patterns).is_empty());
    }
}
