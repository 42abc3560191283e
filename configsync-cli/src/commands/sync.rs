//! `configsync sync` — run one sync.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use configsync_sync::{pipeline, status::format_duration, SyncReport, WriteResult};

use crate::logging::{self, LogFormat};

/// Arguments for `configsync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Config file (json, toml or yaml).
    pub config: Option<PathBuf>,

    /// Log progress and per-file decisions.
    #[arg(short, long)]
    pub verbose: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        logging::scoped(self.verbose, self.log_format, || self.execute())
    }

    fn execute(&self) -> Result<()> {
        let (path, cfg) = super::load_config(self.config.as_deref())?;

        let sync = || {
            tracing::info!(config = %path.display(), work_dir = %cfg.work_dir.display(), "starting sync");
            pipeline::run(&cfg)
        };
        // `verbose = true` in the config only becomes known after loading.
        let outcome = if cfg.verbose && !self.verbose {
            logging::scoped(true, self.log_format, sync)
        } else {
            sync()
        };
        let report =
            outcome.with_context(|| format!("sync failed for '{}'", cfg.work_dir.display()))?;

        print_report(&cfg.work_dir, &report);
        Ok(())
    }
}

fn print_report(work_dir: &std::path::Path, report: &SyncReport) {
    println!(
        "✓ '{}' synced ({} written, {} unchanged, {} failed, {} removed) in {}",
        work_dir.display(),
        report.written(),
        report.unchanged(),
        report.failed(),
        report.removed.len(),
        format_duration(report.duration),
    );

    for r in &report.writes {
        match r {
            WriteResult::Written { path } => println!("  ✎  {}", path.display()),
            WriteResult::Unchanged { .. } => {}
            WriteResult::Failed { path, reason } => {
                println!("  {}  {} ({reason})", "✗".red(), path.display())
            }
        }
    }
    for path in &report.removed {
        println!("  {}  {}", "-".yellow(), path.display());
    }

    println!("{}", commit_line(report));
}

fn commit_line(report: &SyncReport) -> String {
    match &report.commit_error {
        Some(reason) => format!("{} commit failed: {reason}", "✗".red()),
        None if report.committed => "committed changes".to_string(),
        None => "nothing to commit".to_string(),
    }
}
