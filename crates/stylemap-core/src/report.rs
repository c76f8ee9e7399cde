//! Report: EnhancementResult → plain-text summary.

use crate::enhance::EnhancementResult;
use std::fmt::Write;

/// Render a human-readable coverage report.
#[must_use]
pub fn render_report(result: &EnhancementResult) -> String {
    let mut out = String::with_capacity(512);
    let stats = &result.statistics;

    let _ = writeln!(
        out,
        "Coverage: {:.0}% ({} of {} nodes mapped)",
        result.coverage * 100.0,
        stats.mapped_nodes,
        stats.total_nodes
    );
    let _ = writeln!(
        out,
        "Rules: {}  Conflicts: {}  Time: {:.2}ms",
        stats.rule_count, stats.conflict_count, stats.processing_time_ms
    );

    if !result.mappings.is_empty() {
        out.push_str("\nMappings:\n");
        for m in &result.mappings {
            let selectors: Vec<&str> = m.matched_rules.iter().map(|r| r.selector()).collect();
            let _ = writeln!(
                out,
                "  {} `{}` ({}) -> {} [{}, {:.2}]",
                m.node_id,
                m.node_name,
                m.node_type,
                selectors.join(" | "),
                m.method,
                m.confidence
            );
        }
    }

    if !result.conflicts.is_empty() {
        out.push_str("\nConflicts:\n");
        for c in &result.conflicts {
            let _ = writeln!(
                out,
                "  [{}] {} {} `{}` line {}: design {} vs css {}",
                c.severity,
                c.kind,
                c.node_id,
                c.selector,
                c.source_line,
                c.design_value,
                c.css_value
            );
        }
    }

    if !result.warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for w in &result.warnings {
            let _ = writeln!(out, "  {w}");
        }
    }

    if !result.suggestions.is_empty() {
        out.push_str("\nSuggestions:\n");
        for s in &result.suggestions {
            let _ = writeln!(out, "  - {s}");
        }
    }

    out
}
