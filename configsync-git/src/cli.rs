//! [`VersionControl`] backed by the installed `git` binary.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use semver::Version;

use crate::version::{check_supported, parse_version};
use crate::{GitError, VersionControl};

/// Shells out to `git` with the repository directory as working directory.
#[derive(Debug, Clone)]
pub struct GitCli {
    binary: PathBuf,
    repo_dir: PathBuf,
    version: Version,
}

impl GitCli {
    /// Verify the binary's version and bind it to `repo_dir`.
    ///
    /// `repo_dir` does not need to exist yet; it is only used by later calls.
    pub fn new(binary: impl Into<PathBuf>, repo_dir: impl Into<PathBuf>) -> Result<Self, GitError> {
        let binary = binary.into();
        let mut cmd = Command::new(&binary);
        cmd.arg("version");
        let stdout = finish(cmd)?;
        let version = check_supported(parse_version(&stdout)?)?;
        tracing::debug!(binary = %binary.display(), %version, "git binary accepted");

        Ok(Self {
            binary,
            repo_dir: repo_dir.into(),
            version,
        })
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .current_dir(&self.repo_dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null());
        cmd
    }

    fn exec<I, S>(&self, args: I) -> Result<String, GitError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        finish(self.command(args))
    }

    /// Run and report only whether git exited successfully.
    fn succeeds<I, S>(&self, args: I) -> Result<bool, GitError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = self.command(args);
        let status = cmd
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| GitError::Spawn {
                command: label(&cmd),
                source,
            })?;
        Ok(status.success())
    }

    /// Express `path` relative to the repository so git never sees a path
    /// spelled through a different symlinked prefix.
    fn relative(&self, path: &Path) -> PathBuf {
        match path.strip_prefix(&self.repo_dir) {
            Ok(rel) if rel.as_os_str().is_empty() => PathBuf::from("."),
            Ok(rel) => rel.to_path_buf(),
            Err(_) => path.to_path_buf(),
        }
    }

    fn path_args(&self, head: &[&str], paths: &[PathBuf]) -> Vec<PathBuf> {
        head.iter()
            .map(PathBuf::from)
            .chain(std::iter::once(PathBuf::from("--")))
            .chain(paths.iter().map(|p| self.relative(p)))
            .collect()
    }
}

impl VersionControl for GitCli {
    fn ensure_repository(&self) -> Result<(), GitError> {
        let mut cmd = self.command(["rev-parse", "--show-toplevel"]);
        let output = cmd.stderr(Stdio::null()).output().map_err(|source| GitError::Spawn {
            command: label(&cmd),
            source,
        })?;
        if output.status.success() {
            let toplevel = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
            if same_dir(&toplevel, &self.repo_dir) {
                return Ok(());
            }
            tracing::debug!(
                parent = %toplevel.display(),
                "work dir is nested inside another repository"
            );
        }

        self.exec(["init"])?;
        tracing::info!(path = %self.repo_dir.display(), "initialised git repository");
        Ok(())
    }

    fn current_branch(&self) -> Result<String, GitError> {
        // symbolic-ref also answers on an unborn branch, unlike rev-parse.
        self.exec(["symbolic-ref", "--short", "HEAD"])
    }

    fn checkout(&self, branch: &str) -> Result<(), GitError> {
        if self.current_branch().ok().as_deref() == Some(branch) {
            return Ok(());
        }
        let reference = format!("refs/heads/{branch}");
        let exists = self.succeeds(["rev-parse", "--verify", "--quiet", reference.as_str()])?;
        if exists {
            self.exec(["checkout", branch])?;
        } else {
            self.exec(["checkout", "-b", branch])?;
        }
        tracing::info!(branch, created = !exists, "checked out branch");
        Ok(())
    }

    fn pull(&self) -> Result<(), GitError> {
        self.exec(["pull"]).map(drop)
    }

    fn push(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        self.exec(["push", remote, branch]).map(drop)
    }

    fn has_changes(&self) -> Result<bool, GitError> {
        let status = self.exec(["status", "--porcelain"])?;
        Ok(!status.is_empty())
    }

    fn add(&self, paths: &[PathBuf]) -> Result<(), GitError> {
        if paths.is_empty() {
            return Ok(());
        }
        self.exec(self.path_args(&["add"], paths)).map(drop)
    }

    fn remove(&self, paths: &[PathBuf]) -> Result<(), GitError> {
        if paths.is_empty() {
            return Ok(());
        }
        self.exec(self.path_args(&["rm", "-f", "--ignore-unmatch"], paths))
            .map(drop)
    }

    fn commit(&self, message: &str, author: &str) -> Result<(), GitError> {
        let mut cmd = self.command(["commit", "-m", message, "--author", author]);
        // Unattended hosts often lack a committer identity; borrow the author's.
        if !self.succeeds(["config", "--get", "user.email"])? {
            if let Some((name, email)) = split_author(author) {
                cmd.env("GIT_COMMITTER_NAME", name)
                    .env("GIT_COMMITTER_EMAIL", email);
            }
        }
        finish(cmd).map(drop)
    }
}

/// Run `cmd`, returning trimmed stdout on success.
fn finish(mut cmd: Command) -> Result<String, GitError> {
    let output = cmd.output().map_err(|source| GitError::Spawn {
        command: label(&cmd),
        source,
    })?;
    if !output.status.success() {
        return Err(GitError::Failed {
            command: label(&cmd),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn label(cmd: &Command) -> String {
    std::iter::once("git".to_string())
        .chain(cmd.get_args().map(|a| a.to_string_lossy().into_owned()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Split `Name <email>` into its parts.
pub(crate) fn split_author(author: &str) -> Option<(&str, &str)> {
    let open = author.rfind('<')?;
    let email = author[open + 1..].strip_suffix('>')?.trim();
    let name = author[..open].trim();
    if name.is_empty() || email.is_empty() {
        return None;
    }
    Some((name, email))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_author_parses_name_and_email() {
        assert_eq!(
            split_author("configsync <configsync@box1>"),
            Some(("configsync", "configsync@box1"))
        );
        assert_eq!(split_author("no email"), None);
        assert_eq!(split_author("<only@email>"), None);
    }

    #[test]
    fn label_lists_arguments() {
        let mut cmd = Command::new("/usr/bin/git");
        cmd.args(["status", "--porcelain"]);
        assert_eq!(label(&cmd), "git status --porcelain");
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let err = GitCli::new("/nonexistent/git-binary", "/tmp").unwrap_err();
        assert!(matches!(err, GitError::Spawn { .. }), "got: {err}");
    }
}
