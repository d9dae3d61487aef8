use owo_colors::OwoColorize;
use pagecraft_core::{BatchReport, PageRecord};

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "Pagecraft".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Fetch, clean, rewrite and format web pages\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a labelled detail line under a step
pub fn print_detail(label: &str, value: &str) {
    eprintln!("  {} {}", format!("{}:", label).dimmed(), value.bright_white());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

/// Print one line per failed item, then the batch counters
pub fn print_batch_summary<T>(records: &[PageRecord], report: &BatchReport<T>) {
    for (id, failure) in report.failures() {
        let url = records.iter().find(|r| r.id == id).map_or("", |r| r.url.as_str());
        let status = failure.http_status.map(|s| format!(" (HTTP {s})")).unwrap_or_default();
        print_error(&format!("#{id} {url} -> {}{status}", failure.message));
    }

    let summary = format!(
        "Processed {}/{}. Updated: {}. Errors: {}.",
        report.processed,
        records.len(),
        report.succeeded,
        report.failed
    );
    if report.failed == 0 { print_success(&summary) } else { print_warning(&summary) }
}

/// Format file size for display
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
