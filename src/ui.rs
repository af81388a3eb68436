#![allow(dead_code)]

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Spinner for a long-running step
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Unified diff lines between two versions of a file
pub fn diff_lines(before: &str, after: &str) -> Vec<String> {
    let diff = similar::TextDiff::from_lines(before, after);
    diff.iter_all_changes()
        .filter_map(|change| match change.tag() {
            similar::ChangeTag::Delete => Some(format!("- {}", change.as_str().unwrap_or_default())),
            similar::ChangeTag::Insert => Some(format!("+ {}", change.as_str().unwrap_or_default())),
            similar::ChangeTag::Equal => None,
        })
        .map(|line| line.trim_end_matches('\n').to_string())
        .collect()
}

/// Print what a write would change
pub fn print_diff(before: &str, after: &str) {
    let lines = diff_lines(before, after);
    if lines.is_empty() {
        println!("    {}", "(no changes)".dimmed());
        return;
    }
    for line in lines {
        if line.starts_with('+') {
            println!("    {}", line.green());
        } else {
            println!("    {}", line.red());
        }
    }
}
