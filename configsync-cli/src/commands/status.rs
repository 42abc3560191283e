//! `configsync status` — compare the last sync with the sources.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use configsync_sync::metadata;
use configsync_sync::status::{self, RecordState, RecordStatus};

use crate::logging::{self, LogFormat};

/// Arguments for `configsync status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Config file (json, toml or yaml).
    pub config: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        logging::scoped(false, LogFormat::Text, || self.execute())
    }

    fn execute(&self) -> Result<()> {
        let (_, cfg) = super::load_config(self.config.as_deref())?;
        let last_sync = status::last_synced(&cfg.work_dir);
        let doc = metadata::load(&metadata::path_in(&cfg.work_dir));
        let records = status::inspect(&cfg.work_dir, &doc);

        let report = StatusReport {
            work_dir: cfg.work_dir.display().to_string(),
            last_sync_age: last_sync
                .map(status::format_system_time_age)
                .unwrap_or_else(|| "never".to_string()),
            records,
        };
        if self.json {
            return print_json(report);
        }
        print_table(report);
        Ok(())
    }
}

struct StatusReport {
    work_dir: String,
    last_sync_age: String,
    records: Vec<RecordStatus>,
}

impl StatusReport {
    fn needs_sync(&self) -> usize {
        self.records.iter().filter(|r| r.state.needs_sync()).count()
    }
}

#[derive(Serialize)]
struct StatusReportJson {
    work_dir: String,
    last_sync_age: String,
    needs_sync: usize,
    records: Vec<RecordStatusJson>,
}

#[derive(Serialize)]
struct RecordStatusJson {
    path: String,
    source: String,
    destination: String,
    status: &'static str,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "path")]
    path: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "source")]
    source: String,
}

fn print_json(report: StatusReport) -> Result<()> {
    let payload = StatusReportJson {
        work_dir: report.work_dir.clone(),
        last_sync_age: report.last_sync_age.clone(),
        needs_sync: report.needs_sync(),
        records: report
            .records
            .into_iter()
            .map(|r| RecordStatusJson {
                path: r.path,
                source: r.source.to_string(),
                destination: r.destination.display().to_string(),
                status: r.state.as_str(),
            })
            .collect(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(report: StatusReport) {
    println!(
        "configsync v{} | {} | {} records | last sync {}",
        env!("CARGO_PKG_VERSION"),
        report.work_dir,
        report.records.len(),
        report.last_sync_age,
    );
    if report.records.is_empty() {
        println!("Nothing synced yet.");
        return;
    }

    let needs_sync = report.needs_sync();
    let rows: Vec<StatusTableRow> = report
        .records
        .into_iter()
        .map(|r| StatusTableRow {
            status: state_label(r.state),
            source: r.source.to_string(),
            path: r.path,
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if needs_sync > 0 {
        println!("{needs_sync} record(s) out of date. Run 'configsync sync' to update.");
    }
}

fn state_label(state: RecordState) -> String {
    let label = state.as_str();
    match state {
        RecordState::Current => label.green().to_string(),
        RecordState::Command => label.bright_black().to_string(),
        RecordState::Modified => label.yellow().to_string(),
        RecordState::MissingSource | RecordState::MissingDestination => label.red().to_string(),
    }
}
