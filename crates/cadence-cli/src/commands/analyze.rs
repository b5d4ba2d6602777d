//! Report command implementations

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use cadence_core::{AnalyticsReport, DayRecord, Entity, Insight, PersonStats};

use super::build_report;

/// Insights shown by `analyze` without `--json`
const SUMMARY_INSIGHTS: usize = 5;

pub async fn cmd_analyze(
    config_path: Option<&Path>,
    source: Option<&str>,
    now: Option<&str>,
    json: bool,
) -> Result<()> {
    let report = build_report(config_path, source, now).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_summary(&report);
    Ok(())
}

pub async fn cmd_insights(
    config_path: Option<&Path>,
    source: Option<&str>,
    now: Option<&str>,
    limit: Option<usize>,
) -> Result<()> {
    let report = build_report(config_path, source, now).await?;
    let limit = limit.unwrap_or(report.insights.len());

    println!("💡 Insights");
    println!();
    print_insights(&report.insights[..limit.min(report.insights.len())]);
    Ok(())
}

pub async fn cmd_timeline(
    config_path: Option<&Path>,
    source: Option<&str>,
    now: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    let report = build_report(config_path, source, now).await?;

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_timeline(&report.data_points, file)?;
            println!(
                "✅ Wrote {} days to {}",
                report.data_points.len(),
                path.display()
            );
        }
        None => write_timeline(&report.data_points, io::stdout().lock())?,
    }
    Ok(())
}

/// Write the timeline as `date,J,A,M` CSV
pub fn write_timeline<W: Write>(records: &[DayRecord], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header = vec!["date"];
    header.extend(Entity::ALL.iter().map(|e| e.as_str()));
    wtr.write_record(&header)?;

    for record in records {
        let mut row = vec![record.date.format("%Y-%m-%d").to_string()];
        row.extend(Entity::ALL.iter().map(|e| record.count(*e).to_string()));
        wtr.write_record(&row)?;
    }

    wtr.flush().context("Failed to write timeline")?;
    Ok(())
}

fn print_summary(report: &AnalyticsReport) {
    println!("📊 Activity Summary");
    println!();

    match &report.date_range {
        Some(range) => println!(
            "   Range: {} to {} ({} days)",
            range.start,
            range.end,
            report.data_points.len()
        ),
        None => {
            println!("   No observations found.");
            return;
        }
    }
    println!();

    println!(
        "   {:<6} {:>8} {:>8} {:>8} {:>8} {:>10} {:>8}",
        "Person", "Week", "Month", "Year", "Total", "Weekly avg", "Streak"
    );
    println!("   {}", "-".repeat(64));
    for stats in report.stats.iter() {
        print_stats_row(stats);
    }
    println!();

    let busiest = &report.patterns.busiest_weekday;
    println!("   Busiest weekday: {} ({})", busiest.day, busiest.total);
    for c in &report.patterns.correlations {
        println!(
            "   Correlation {}/{}: {:.2}",
            c.first, c.second, c.coefficient
        );
    }
    println!();

    println!("💡 Top insights");
    println!();
    let shown = report.insights.len().min(SUMMARY_INSIGHTS);
    print_insights(&report.insights[..shown]);
    if report.insights.len() > shown {
        println!(
            "   ... and {} more (cadence insights)",
            report.insights.len() - shown
        );
    }
}

fn print_stats_row(stats: &PersonStats) {
    println!(
        "   {:<6} {:>8} {:>8} {:>8} {:>8} {:>10.1} {:>8}",
        stats.entity.as_str(),
        stats.current_week,
        stats.current_month,
        stats.year_total,
        stats.total_count,
        stats.weekly_avg,
        stats.longest_streak
    );
}

fn print_insights(insights: &[Insight]) {
    if insights.is_empty() {
        println!("   No insights.");
        return;
    }

    for insight in insights {
        match &insight.metric {
            Some(metric) => println!("   [{}] {} ({})", insight.kind, insight.title, metric),
            None => println!("   [{}] {}", insight.kind, insight.title),
        }
        println!("      {}", insight.description);
    }
}
