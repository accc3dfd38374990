//! Statistics reporting.

use chrono::{DateTime, Utc};
use console::style;

use crate::download::HarvestSummary;

/// Print statistics for a harvest run.
pub fn print_harvest_summary(summary: &HarvestSummary) {
    let stats = &summary.stats;

    println!();
    println!("{}", style("═".repeat(50)).dim());
    println!(
        "{}",
        style(format!("Stopped: {}", summary.stop_reason)).bold()
    );
    println!("  Posts:    {} processed", stats.posts_processed);
    println!("  Pictures: {}", stats.pic_count);
    println!("  Videos:   {}", stats.vid_count);
    println!("  Skipped:  {} (already downloaded)", stats.skipped_existing);
    if stats.failed() > 0 {
        println!("  Failed:   {}", style(stats.failed()).red());
        for failure in &stats.failures {
            println!(
                "    {} (post {}): {}",
                failure.filename, failure.post_id, failure.message
            );
        }
    }
    println!("  Total:    {} downloaded", stats.downloaded);
    println!(
        "  Watermark: {} -> {}",
        format_watermark(summary.watermark_before),
        format_watermark(summary.watermark_after)
    );
    if stats.marker_failures > 0 {
        println!(
            "  {}",
            style(format!(
                "Watermark could not be updated {} time(s)",
                stats.marker_failures
            ))
            .yellow()
        );
    }
    if stats.timestamp_failures > 0 {
        println!(
            "  {}",
            style(format!(
                "File times could not be set on {} file(s)",
                stats.timestamp_failures
            ))
            .yellow()
        );
    }
    println!("{}", style("═".repeat(50)).dim());
}

fn format_watermark(secs: f64) -> String {
    if secs <= 0.0 {
        return "none".to_string();
    }
    DateTime::<Utc>::from_timestamp(secs.trunc() as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("{:.0}", secs))
}
