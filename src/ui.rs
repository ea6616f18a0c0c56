use crate::engine::MembershipReport;
use colored::Colorize;
use reconcile::ApplySummary;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
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

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a step indicator
pub fn step(num: usize, total: usize, msg: &str) {
    println!("{} {}", format!("[{num}/{total}]").blue().bold(), msg);
}

// ============================================================================
// Summaries
// ============================================================================

/// One-line rendering of a resource summary
pub fn format_summary(summary: &ApplySummary) -> String {
    let mut parts = Vec::new();
    for (count, label) in [
        (summary.created, "created"),
        (summary.modified, "updated"),
        (summary.removed, "removed"),
        (summary.skipped, "skipped"),
        (summary.no_change, "unchanged"),
    ] {
        if count > 0 {
            parts.push(format!("{count} {label}"));
        }
    }
    if parts.is_empty() {
        "nothing configured".to_string()
    } else {
        parts.join(", ")
    }
}

/// Print the outcome of one resource kind
pub fn summary(kind: &str, summary: &ApplySummary) {
    let line = format!("{kind}: {}", format_summary(summary));
    if summary.total_changes() > 0 {
        success(&line);
    } else {
        dim(&line);
    }
}

/// Print the outcome of a role membership pass
pub fn membership(kind: &str, report: &MembershipReport) {
    kv(&format!("{kind} granted"), &report.granted.len().to_string());
    kv(&format!("{kind} revoked"), &report.revoked.len().to_string());
    kv(&format!("{kind} unchanged"), &report.claimed.len().to_string());
    if !report.skipped.is_empty() {
        warn(&format!(
            "{} {kind} skipped: {}",
            report.skipped.len(),
            report.skipped.join(", ")
        ));
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_summary_lists_nonzero_counts() {
        let summary = ApplySummary {
            created: 2,
            removed: 1,
            no_change: 4,
            ..ApplySummary::default()
        };
        assert_eq!(format_summary(&summary), "2 created, 1 removed, 4 unchanged");
    }

    #[test]
    fn test_format_summary_empty() {
        assert_eq!(
            format_summary(&ApplySummary::default()),
            "nothing configured"
        );
    }
}
