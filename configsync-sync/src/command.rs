//! Command execution with stdout capture.

use std::process::{Command, Stdio};

use configsync_core::CommandSpec;

use crate::error::ArtifactError;

/// Run `spec` to completion and return its standard output.
///
/// Stderr is only used for the error message. A non-zero exit is an error and
/// its stdout is discarded. No timeout is applied.
pub fn capture(spec: &CommandSpec) -> Result<Vec<u8>, ArtifactError> {
    let label = spec.display_line();
    let mut cmd = build(spec);
    let output = cmd.output().map_err(|source| ArtifactError::Spawn {
        command: label.clone(),
        source,
    })?;

    if !output.status.success() {
        return Err(ArtifactError::CommandFailed {
            command: label,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output.stdout)
}

fn build(spec: &CommandSpec) -> Command {
    let mut cmd = match (&spec.exe_path, &spec.command_line) {
        (Some(exe), _) => {
            let mut cmd = Command::new(exe);
            cmd.args(&spec.arguments);
            cmd
        }
        (None, line) => {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(line.as_deref().unwrap_or_default());
            cmd
        }
    };

    if let Some(dir) = &spec.work_dir {
        tracing::debug!(dir = %dir.display(), "setting command work dir");
        cmd.current_dir(dir);
    }

    if !spec.env.is_empty() {
        cmd.env_clear();
        for entry in &spec.env {
            match entry.split_once('=') {
                Some((key, value)) if !key.is_empty() => {
                    cmd.env(key, value);
                }
                _ => tracing::warn!(%entry, "ignoring malformed environment entry"),
            }
        }
        tracing::debug!(count = spec.env.len(), "replaced command environment");
    }

    apply_credentials(&mut cmd, spec);

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd
}

#[cfg(unix)]
fn apply_credentials(cmd: &mut Command, spec: &CommandSpec) {
    use std::os::unix::process::CommandExt;

    if let Some((uid, gid)) = spec.credentials() {
        tracing::debug!(uid, gid, "running command under alternate identity");
        cmd.gid(gid).uid(uid);
    }
}

#[cfg(not(unix))]
fn apply_credentials(_cmd: &mut Command, spec: &CommandSpec) {
    if spec.credentials().is_some() {
        tracing::warn!("uid/gid overrides are not supported on this platform; ignoring");
    }
}
