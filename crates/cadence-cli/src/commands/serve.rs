//! Server command implementation

use std::path::Path;

use anyhow::Result;
use cadence_core::AnalyticsEngine;
use cadence_server::{RefreshScheduleConfig, ServerConfig};

use super::{load_config, resolve_source};

pub async fn cmd_serve(
    config_path: Option<&Path>,
    source: Option<&str>,
    host: &str,
    port: u16,
    static_dir: Option<&Path>,
    refresh_minutes: Option<u64>,
    allowed_origins: Vec<String>,
) -> Result<()> {
    let analytics = load_config(config_path)?;
    let source = resolve_source(source)?;
    let refresh = match refresh_minutes {
        Some(minutes) => RefreshScheduleConfig::from_minutes(minutes),
        None => RefreshScheduleConfig::from_env(),
    };

    println!("🚀 Starting Cadence web server...");
    match &source {
        Some(source) => println!("   Source: {}", source),
        None => println!("   ⚠️  No source configured, serving without data"),
    }
    println!("   Listening: http://{}:{}", host, port);
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }
    match &refresh {
        Some(schedule) => println!("   Refresh: every {} minutes", schedule.interval_minutes),
        None => println!("   Refresh: on demand only (POST /api/refresh)"),
    }
    if !allowed_origins.is_empty() {
        println!("   CORS origins: {}", allowed_origins.join(", "));
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let config = ServerConfig {
        allowed_origins,
        refresh,
    };

    let static_dir_str = static_dir.and_then(|p| p.to_str());
    cadence_server::serve(
        source,
        AnalyticsEngine::new(analytics),
        host,
        port,
        static_dir_str,
        config,
    )
    .await
}
