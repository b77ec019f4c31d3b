use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;

#[derive(Parser)]
#[command(name = "tickerfetch")]
#[command(about = "Incremental ticker price archiver", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the configured tickers and append new rows to the archive
    Fetch {
        /// Path to the configuration file (default: config.ini next to the binary)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show what the archive currently holds, per ticker
    Status {
        /// Path to the configuration file (default: config.ini next to the binary)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn run() {
    let cli = Cli::parse();

    // Running with no arguments performs a fetch, matching the original
    // double-click-the-exe workflow.
    match cli.command {
        Some(Commands::Fetch { config }) => {
            commands::fetch::run(config);
        }
        None => {
            commands::fetch::run(None);
        }
        Some(Commands::Status { config }) => {
            commands::status::run(config);
        }
    }
}
