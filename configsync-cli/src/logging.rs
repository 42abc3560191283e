//! Per-run tracing subscriber.
//!
//! Library crates only emit events. The binary builds one [`Dispatch`] per
//! command and installs it with [`tracing::dispatcher::with_default`] for the
//! duration of that command; no global subscriber is ever set.

use clap::ValueEnum;
use tracing::Dispatch;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Build the subscriber for one run.
///
/// `RUST_LOG` wins when set; otherwise `debug` when verbose, else `warn`.
pub fn dispatch(verbose: bool, format: LogFormat) -> Dispatch {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => Dispatch::new(builder.finish()),
        LogFormat::Json => Dispatch::new(builder.json().finish()),
    }
}

/// Run `f` with the subscriber for this invocation installed.
pub fn scoped<T>(verbose: bool, format: LogFormat, f: impl FnOnce() -> T) -> T {
    let dispatch = dispatch(verbose, format);
    tracing::dispatcher::with_default(&dispatch, f)
}
