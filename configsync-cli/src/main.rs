//! configsync — mirror configuration files and command output into git.
//!
//! # Usage
//!
//! ```text
//! configsync sync [CONFIG] [-v] [--log-format text|json]
//! configsync status [CONFIG] [--json]
//! configsync check [CONFIG]
//! ```
//!
//! Without `CONFIG` the file named by `$CONFIGSYNC_CONFIG` is used, then
//! `<config dir>/configsync/config.toml`.

mod commands;
mod logging;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{check::CheckArgs, status::StatusArgs, sync::SyncArgs};

#[derive(Parser, Debug)]
#[command(
    name = "configsync",
    version,
    about = "Keep a git history of configuration files and command output",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy configured files and command output into the work dir and commit.
    Sync(SyncArgs),

    /// Compare the last sync with the current state of every source.
    Status(StatusArgs),

    /// Validate the configuration and list what a sync would pick up.
    Check(CheckArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Check(args) => args.run(),
    }
}
