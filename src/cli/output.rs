//! Output formatting for CLI

use crate::{harness::SimulationReport, program::Acceptance};

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:20} {}", format!("{}:", key), value);
}

/// Format a number with thousands separators
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i.is_multiple_of(3) {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

/// Print the counters of a batch below its headline reward
pub fn print_report_details(report: &SimulationReport) {
    print_kv("episodes", &format_number(report.episodes));
    print_kv("std dev", &format!("{:.4}", report.std_dev));
    if report.infeasible_attempts > 0 {
        print_kv("infeasible", &format_number(report.infeasible_attempts));
    }
    if report.penalties_charged > 0 {
        print_kv("penalties", &format_number(report.penalties_charged));
    }
    if report.truncated > 0 {
        print_kv("truncated", &format_number(report.truncated));
    }
    if report.dead_ends > 0 {
        print_kv("dead ends", &format_number(report.dead_ends));
    }
}

/// Print an acceptance check line
pub fn print_acceptance(label: &str, acceptance: &Acceptance) {
    let verdict = if acceptance.passed() { "PASS" } else { "FAIL" };
    println!(
        "{label} acceptance: expected {:.4}, measured {:.4}, tolerance {} -> {verdict}",
        acceptance.expected, acceptance.measured, acceptance.tolerance
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_thousands() {
        assert_eq!(format_number(7), "7");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }
}
