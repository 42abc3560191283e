//! `git version` output parsing.

use std::sync::OnceLock;

use regex::Regex;
use semver::Version;

use crate::GitError;

/// Oldest git release the adapter accepts.
pub const MINIMUM_VERSION: Version = Version::new(1, 7, 0);

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").expect("version pattern is valid")
    })
}

/// Extract the `major.minor.patch` triple from `git version` output.
///
/// Vendor suffixes such as `.windows.1` or `(Apple Git-137)` are ignored.
pub fn parse_version(output: &str) -> Result<Version, GitError> {
    let unknown = || GitError::UnknownVersion(output.trim().to_string());
    let caps = version_pattern().captures(output).ok_or_else(unknown)?;
    let part = |i: usize| -> Result<u64, GitError> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().map_err(|_| unknown()),
            None => Ok(0),
        }
    };
    Ok(Version::new(part(1)?, part(2)?, part(3)?))
}

/// Reject versions older than [`MINIMUM_VERSION`].
pub fn check_supported(found: Version) -> Result<Version, GitError> {
    if found < MINIMUM_VERSION {
        return Err(GitError::UnsupportedVersion {
            found,
            minimum: MINIMUM_VERSION,
        });
    }
    Ok(found)
}
