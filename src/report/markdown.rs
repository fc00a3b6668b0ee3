//! Markdown rendering

use std::fmt::Write;

use crate::aggregator::AggregatedReport;

/// Render the report as a Markdown document
pub fn render_markdown(report: &AggregatedReport) -> String {
    let mut out = String::new();
    let metrics = &report.metrics;
    let state = &report.orchestration_state;

    // Writing into a String cannot fail
    let _ = writeln!(out, "# Validation Report\n");
    let _ = writeln!(out, "Session: `{}`\n", report.session_id);

    let _ = writeln!(out, "## Summary\n");
    let _ = writeln!(out, "| Metric | Value |");
    let _ = writeln!(out, "|---|---|");
    let _ = writeln!(out, "| Artifacts | {} |", metrics.total_artifacts);
    let _ = writeln!(out, "| Checked (sum over checks) | {} |", metrics.checked_artifacts);
    let _ = writeln!(out, "| Passed | {} |", metrics.passed);
    let _ = writeln!(out, "| Warnings | {} |", metrics.warnings);
    let _ = writeln!(out, "| Errors | {} |", metrics.errors);
    let _ = writeln!(
        out,
        "| Success rate | {:.1}% |\n",
        report.summary.success_rate * 100.0
    );

    if !report.summary.findings_by_category.is_empty() {
        let _ = writeln!(out, "## Categories\n");
        let _ = writeln!(out, "| Category | Checks | Passed | Warnings | Errors |");
        let _ = writeln!(out, "|---|---|---|---|---|");
        for (category, findings) in &report.summary.findings_by_category {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} |",
                category, findings.checks, findings.passed, findings.warnings, findings.errors
            );
        }
        out.push('\n');
    }

    let _ = writeln!(out, "## Phases\n");
    let _ = writeln!(out, "| Phase | Status | Attempts | Duration (ms) |");
    let _ = writeln!(out, "|---|---|---|---|");
    for outcome in state.outcomes() {
        let status = if outcome.success { "succeeded" } else { "failed" };
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} |",
            outcome.phase_id, status, outcome.attempts, outcome.duration_ms
        );
    }
    for phase_id in &state.skipped_phases {
        let _ = writeln!(out, "| {} | skipped | 0 | 0 |", phase_id);
    }
    out.push('\n');

    let failed: Vec<_> = state.outcomes().filter(|o| !o.success).collect();
    if !failed.is_empty() {
        let _ = writeln!(out, "### Phase errors\n");
        for outcome in failed {
            let _ = writeln!(
                out,
                "- **{}**: {}",
                outcome.phase_id,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
        out.push('\n');
    }

    let _ = writeln!(out, "## Recommendations\n");
    if report.recommendations.is_empty() {
        let _ = writeln!(out, "No issues found.");
    } else {
        for (idx, rec) in report.recommendations.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. **[{}]** {} ({} occurrences): {}",
                idx + 1,
                rec.priority,
                rec.issue_text,
                rec.occurrence_count,
                rec.suggested_action
            );
        }
    }

    out
}
