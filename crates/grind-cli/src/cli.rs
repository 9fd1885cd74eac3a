//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Split timer for study and break time.
///
/// Times focus and break intervals as labeled laps and keeps a per-day
/// history of focus time by category.
#[derive(Debug, Parser)]
#[command(name = "grind", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run an interactive timer session, one command per line on stdin.
    Run {
        /// Redraw a live status line on stderr.
        #[arg(long)]
        live: bool,
    },

    /// Show a monthly summary of focus time.
    Report {
        /// Month to report (YYYY-MM). Defaults to the current month.
        #[arg(long)]
        month: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show storage status and today's focus total.
    Status,

    /// Print the stored daily history as JSON.
    Export,

    /// Sync history to an external calendar.
    Sync,
}
