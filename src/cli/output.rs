//! Coloured terminal output. `colored` honours NO_COLOR and CLICOLOR_FORCE.
//!
//! Reports go to stdout, problems to stderr.

use std::fmt::Display;

use colored::Colorize;

pub fn error(msg: &(impl Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

pub fn warning(msg: &(impl Display + ?Sized)) {
    eprintln!("{}: {}", "warning".yellow(), msg);
}

/// A configuration entry that was dropped during resolution.
pub fn dropped(section: &str, reference: &str, reason: &str) {
    warning(&format!("{}: '{}' dropped ({})", section, reference, reason));
}

pub fn success(msg: &(impl Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

pub fn header(msg: &(impl Display + ?Sized)) {
    println!("\n{}", msg.to_string().cyan().bold());
}

/// `  1. MacBook Air 13 (M3) 2.417 (top: battery_hours)`
pub fn ranked(position: usize, label: &str, score: f64, factor: Option<&str>) {
    let factor = factor
        .map(|f| format!(" (top: {})", f).dimmed().to_string())
        .unwrap_or_default();
    println!(
        "  {:>2}. {} {}{}",
        position,
        label.bold(),
        format!("{:.3}", score).green(),
        factor
    );
}

/// One column with its inferred kind and the roles it plays.
pub fn column(name: &str, kind: &(impl Display + ?Sized), roles: &[&str]) {
    let roles = if roles.is_empty() {
        "-".dimmed().to_string()
    } else {
        roles.join(", ")
    };
    println!("  {:<20} {:<12} {}", name, kind.to_string(), roles);
}

/// Failure counts for one constrained column; zero counts are dimmed.
pub fn failure_counts(column: &str, failures: usize, first_failures: usize) {
    let line = format!(
        "  {:<20} {:>5} failing {:>5} first failing",
        column, failures, first_failures
    );
    if failures == 0 {
        println!("{}", line.dimmed());
    } else {
        println!("{}", line);
    }
}

/// A filtered-out option and the first constraint it broke.
pub fn rejected(label: &str, column: &str) {
    println!("  {} {} fails on {}", "✗".red(), label, column.yellow());
}

pub fn detail(msg: &(impl Display + ?Sized)) {
    println!("  {}", msg);
}

/// Uncoloured output, e.g. JSON, TOML or rendered trees.
pub fn plain(msg: &(impl Display + ?Sized)) {
    println!("{}", msg);
}
