//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Cadence - Daily activity analytics for J, A and M
#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Temporal activity analytics over a shared daily log", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Analytics config file (TOML)
    ///
    /// Falls back to ~/.local/share/cadence/config/analytics.toml, then the
    /// built-in defaults.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Data source: a .csv/.xlsx path or gsheet:<SHEET_ID>
    ///
    /// When unset, GOOGLE_SHEET_ID is used as a Google Sheets source.
    #[arg(long, env = "CADENCE_SOURCE", global = true)]
    pub source: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load the source and print stats and insights
    Analyze {
        /// Reference date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        now: Option<String>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the synthesized insights
    Insights {
        /// Reference date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        now: Option<String>,

        /// Maximum number of insights to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Write the zero-filled daily timeline as CSV
    Timeline {
        /// Reference date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        now: Option<String>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "5000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory containing static files to serve (e.g., ui/dist)
        #[arg(long)]
        static_dir: Option<PathBuf>,

        /// Minutes between scheduled refreshes (0 disables)
        ///
        /// Defaults to CADENCE_REFRESH_MINUTES, or 60 when unset.
        #[arg(long)]
        refresh_minutes: Option<u64>,

        /// Allowed CORS origin (repeatable)
        #[arg(long = "allow-origin")]
        allowed_origins: Vec<String>,
    },
}
