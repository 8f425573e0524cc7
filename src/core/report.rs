// src/core/report.rs

//! Colored, user-facing status lines. Diagnostics go through `log`; this is what the user reads.

use colored::Colorize;
use std::time::Duration;

/// Prints a section header.
pub fn header(text: &str) {
    println!("\n{}", format!("=== {} ===", text).bold().cyan());
}

pub fn info(text: &str) {
    println!("{}", text);
}

pub fn success(text: &str) {
    println!("{} {}", "✔".green().bold(), text.green());
}

pub fn warn(text: &str) {
    println!("{} {}", "!".yellow().bold(), text.yellow());
}

pub fn error(text: &str) {
    eprintln!("{} {}", "✖".red().bold(), text.red());
}

/// Formats a duration as `250ms`, `1.5s` or `2.0m`.
pub fn format_duration(duration: Duration) -> String {
    if duration < Duration::from_secs(1) {
        format!("{}ms", duration.as_millis())
    } else if duration < Duration::from_secs(60) {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        format!("{:.1}m", duration.as_secs_f64() / 60.0)
    }
}
