//! Cadence CLI - Daily activity analytics
//!
//! Usage:
//!   cadence analyze                       Print stats and insights
//!   cadence insights --limit 3            Print the top insights
//!   cadence timeline --output out.csv     Export the zero-filled timeline
//!   cadence serve --port 5000             Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();

    let config = cli.config.as_deref();
    let source = cli.source.as_deref();

    match cli.command {
        Commands::Analyze { now, json } => {
            commands::cmd_analyze(config, source, now.as_deref(), json).await
        }
        Commands::Insights { now, limit } => {
            commands::cmd_insights(config, source, now.as_deref(), limit).await
        }
        Commands::Timeline { now, output } => {
            commands::cmd_timeline(config, source, now.as_deref(), output.as_deref()).await
        }
        Commands::Serve {
            port,
            host,
            static_dir,
            refresh_minutes,
            allowed_origins,
        } => {
            commands::cmd_serve(
                config,
                source,
                &host,
                port,
                static_dir.as_deref(),
                refresh_minutes,
                allowed_origins,
            )
            .await
        }
    }
}
