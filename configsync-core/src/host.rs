//! Host identity helpers.

use std::ffi::OsString;

/// The local hostname, or `None` when it cannot be determined.
pub fn hostname() -> Option<String> {
    match hostname::get() {
        Ok(raw) => normalize(raw),
        Err(e) => {
            tracing::debug!(error = %e, "cannot read hostname");
            None
        }
    }
}

fn normalize(raw: OsString) -> Option<String> {
    let name = raw.into_string().ok()?;
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}
