//! CLI output formatting utilities.

use crate::audio::ChapterMark;
use crate::wiki::SearchResult;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message to stderr.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message to stderr.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print numbered search candidates.
    pub fn candidates(results: &[SearchResult]) {
        for (i, result) in results.iter().enumerate() {
            println!(
                "  {} {}",
                style(format!("{:>2}.", i + 1)).cyan(),
                style(&result.title).bold()
            );
            if !result.snippet.is_empty() {
                println!("      {}", content_preview(&result.snippet, 120));
            }
            println!("      {}", style(&result.url).dim());
        }
    }

    /// Print chapter start times.
    pub fn chapters(chapters: &[ChapterMark]) {
        for chapter in chapters {
            println!(
                "  {} {} {}",
                style("*").cyan(),
                style(format_timestamp(chapter.start_time_ms)).cyan(),
                chapter.title
            );
        }
    }

    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Format milliseconds as `H:MM:SS` or `M:SS`.
pub fn format_timestamp(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Truncate content with ellipsis.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let cut: String = content.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
