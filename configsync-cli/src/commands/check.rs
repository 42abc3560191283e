//! `configsync check` — validate the config and preview its sources.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use configsync_sync::{resolver, writer};

use crate::logging::{self, LogFormat};

/// Arguments for `configsync check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Config file (json, toml or yaml).
    pub config: Option<PathBuf>,
}

impl CheckArgs {
    pub fn run(self) -> Result<()> {
        logging::scoped(false, LogFormat::Text, || self.execute())
    }

    fn execute(&self) -> Result<()> {
        let (path, cfg) = super::load_config(self.config.as_deref())?;
        println!("{} {}", "✓".green(), path.display());
        println!("work dir: {}", cfg.work_dir.display());

        match cfg.git.resolve() {
            Ok(git) => {
                let remote = git.remote.as_deref().unwrap_or("disabled");
                println!(
                    "git: {} (branch {}, author {}, remote {remote})",
                    git.binary.display(),
                    git.branch,
                    git.author
                );
            }
            Err(e) => println!("{} git: {e}", "!".yellow()),
        }

        // Skipped patterns are logged as warnings on stderr.
        let files = resolver::resolve(&cfg.files);
        println!("files ({}):", files.len());
        for file in &files {
            println!("  {}  ← {}", file.path.display(), file.pattern.bright_black());
        }

        println!("commands ({}):", cfg.commands.len());
        for command in &cfg.commands {
            let dest = writer::destination_path(&cfg.work_dir, Path::new(&command.file_path));
            match dest {
                Ok(_) => println!("  {}  ← {}", command.file_path, command.display_line()),
                Err(e) => println!("  {}  {} ({e})", "✗".red(), command.file_path),
            }
        }
        Ok(())
    }
}
