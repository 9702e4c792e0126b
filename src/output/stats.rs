//! Statistics reporting.

use console::style;

use crate::download::{ArchiveStats, GlobalStats};

/// Print statistics for a single channel.
pub fn print_channel_stats(stats: &ArchiveStats) {
    println!();
    println!(
        "{}",
        style(format!("Statistics for {}:", stats.label())).bold()
    );
    println!("  Messages:   {} ({} pages)", stats.messages, stats.pages);
    println!(
        "  Files:      {} downloaded, {} already present",
        stats.files_downloaded, stats.files_skipped
    );
    if stats.files_too_large > 0 {
        println!("  Too large:  {}", style(stats.files_too_large).yellow());
    }
    if stats.files_failed > 0 {
        println!("  Failed:     {}", style(stats.files_failed).red());
    }
    println!("  Text:       {} messages", stats.text_entries);
    println!("  Manifests:  {}", stats.manifests_written);
    if stats.chunks_failed > 0 {
        println!("  Lost chunks: {}", style(stats.chunks_failed).red());
    }
    if stats.cancelled {
        println!("  {}", style("Stopped early").yellow());
    }
}

/// Print global statistics across all channels.
pub fn print_global_stats(stats: &GlobalStats) {
    println!();
    println!("{}", style("═".repeat(50)).dim());
    println!("{}", style("Global Statistics:").bold());
    println!("  Channels archived: {}", stats.channels_archived);
    if stats.channels_failed > 0 {
        println!("  Channels failed:   {}", style(stats.channels_failed).red());
    }
    println!("  Messages:  {}", stats.messages);
    println!(
        "  Files:     {} downloaded ({}), {} already present",
        stats.files_downloaded,
        indicatif::HumanBytes(stats.bytes_downloaded),
        stats.files_skipped
    );
    println!(
        "  Skipped:   {} too large, {} failed",
        stats.files_too_large, stats.files_failed
    );
    println!("  Manifests: {}", stats.manifests_written);
    if stats.cancelled {
        println!("  {}", style("Interrupted: results are partial").yellow());
    }
    println!("{}", style("═".repeat(50)).dim());
}
