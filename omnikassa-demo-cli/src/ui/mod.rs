//! Terminal output helpers

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use omnikassa_lib::{Money, OrderResult, OrderStatus};
use std::time::Duration;

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

pub fn warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print a section header
pub fn header(text: &str) {
    println!("\n{}", text.bold().underline());
}

pub fn key_value(key: &str, value: &str) {
    println!("  {}: {}", key.cyan(), value);
}

pub fn separator() {
    println!("{}", "─".repeat(60).dimmed());
}

/// Spinner on stderr; hidden when nobody is watching.
pub fn spinner(message: &str) -> ProgressBar {
    if !console::user_attended_stderr() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Ask for confirmation. Non-interactive sessions get `default`.
pub fn confirm(prompt: &str, default: bool) -> anyhow::Result<bool> {
    if !console::user_attended() {
        return Ok(default);
    }
    Ok(dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()?)
}

/// `EUR 49.99` from minor units.
pub fn money(amount: &Money) -> String {
    amount.to_string()
}

fn status(status: &OrderStatus) -> colored::ColoredString {
    match status {
        OrderStatus::Completed => status.as_str().green().bold(),
        OrderStatus::Cancelled | OrderStatus::Expired => status.as_str().red(),
        OrderStatus::InProgress => status.as_str().yellow(),
        OrderStatus::Other(_) => status.as_str().normal(),
    }
}

/// One line per order result.
pub fn order_result(result: &OrderResult) {
    let error = match result.error_code() {
        Some(code) if !code.is_empty() => format!(" error={}", code.red()),
        _ => String::new(),
    };
    println!(
        "  {} {} paid {} of {} at {}{}",
        result.merchant_order_id().cyan(),
        status(result.order_status()),
        money(result.paid_amount()),
        money(result.total_amount()),
        result.order_status_date_time_raw().dimmed(),
        error,
    );
}
