//! Enhancement pipeline: parse → map → detect conflicts → summarize.
//!
//! `enhance` is one synchronous, uninterrupted pass over
//! (nodes × rules). It holds no state between calls; callers that need
//! responsiveness run it off their event loop and time it out from outside.

use crate::conflict::{Severity, StyleConflict, detect_conflicts};
use crate::error::EnhanceError;
use crate::mapper::{NodeStyleMapping, build_mappings};
use crate::model::DesignTree;
use crate::options::{EnhanceOptions, MappingStrategy};
use crate::parser::{ParseDiagnostic, parse_stylesheet};
use serde::Serialize;
use std::time::Instant;

const LOW_COVERAGE: f32 = 0.3;
const LOW_CONFIDENCE: f32 = 0.7;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancementStatistics {
    pub total_nodes: usize,
    pub mapped_nodes: usize,
    pub rule_count: usize,
    pub conflict_count: usize,
    /// Wall-clock duration of the whole call.
    pub processing_time_ms: f64,
}

/// Everything one enhancement call produced. Handed unmodified to a
/// rendering layer or a code emitter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancementResult {
    /// Accepted mappings, in depth-first pre-order of the tree.
    pub mappings: Vec<NodeStyleMapping>,
    /// mapped nodes / total nodes, 0 for an empty tree.
    pub coverage: f32,
    /// All mapping conflicts, flattened in mapping order.
    pub conflicts: Vec<StyleConflict>,
    /// At most `max_suggestions` entries.
    pub suggestions: Vec<String>,
    /// Stylesheet fragments the parser skipped.
    pub warnings: Vec<ParseDiagnostic>,
    pub statistics: EnhancementStatistics,
}

/// Map `style_text` onto `tree` and report coverage, conflicts and suggestions.
///
/// # Errors
/// Returns [`EnhanceError::Stylesheet`] only when the stylesheet scanner
/// itself fails. Malformed CSS, unmatched nodes and conflicts are reported
/// inside the result.
pub fn enhance(
    tree: &DesignTree,
    style_text: &str,
    options: &EnhanceOptions,
) -> Result<EnhancementResult, EnhanceError> {
    let started = Instant::now();
    let options = options.validated();
    if options.strict_matching {
        log::debug!("strict matching requested; scoring is unchanged");
    }

    let parsed = parse_stylesheet(style_text);
    if !parsed.is_valid {
        return Err(EnhanceError::Stylesheet {
            errors: parsed.errors,
        });
    }

    let mut mappings = build_mappings(tree, &parsed.rules, &options);
    let conflicts = detect_conflicts(&mappings, tree, &options);
    // Node ids are unique, so each conflict belongs to exactly one mapping.
    for mapping in &mut mappings {
        mapping.conflicts = conflicts
            .iter()
            .filter(|c| c.node_id == mapping.node_id)
            .cloned()
            .collect();
    }

    let total_nodes = tree.node_count();
    let coverage = coverage(mappings.len(), total_nodes);
    let suggestions = build_suggestions(&mappings, &conflicts, coverage, &parsed.warnings, &options);

    let statistics = EnhancementStatistics {
        total_nodes,
        mapped_nodes: mappings.len(),
        rule_count: parsed.rules.len(),
        conflict_count: conflicts.len(),
        processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
    };
    log::debug!(
        "enhanced {} nodes with {} rules: {} mapped ({:.0}%), {} conflicts in {:.2}ms",
        statistics.total_nodes,
        statistics.rule_count,
        statistics.mapped_nodes,
        coverage * 100.0,
        statistics.conflict_count,
        statistics.processing_time_ms
    );

    Ok(EnhancementResult {
        mappings,
        coverage,
        conflicts,
        suggestions,
        warnings: parsed.warnings,
        statistics,
    })
}

/// Fraction of nodes with an accepted mapping; 0 for an empty tree.
pub fn coverage(mapped: usize, total: usize) -> f32 {
    if total == 0 {
        0.0
    } else {
        (mapped as f32 / total as f32).clamp(0.0, 1.0)
    }
}

/// Rule-based suggestions, truncated to `options.max_suggestions`.
pub fn build_suggestions(
    mappings: &[NodeStyleMapping],
    conflicts: &[StyleConflict],
    coverage: f32,
    warnings: &[ParseDiagnostic],
    options: &EnhanceOptions,
) -> Vec<String> {
    let mut out = Vec::new();

    if mappings.is_empty() {
        out.push(
            "No design nodes matched any rule. Name selectors after design layers \
             (e.g. `.header` for a layer named `Header`) or lower the minimum confidence."
                .to_string(),
        );
    }

    if coverage < LOW_COVERAGE {
        out.push(format!(
            "Only {:.0}% of design nodes are mapped. Add class selectors named after \
             layers or try a different mapping strategy (currently `{}`).",
            coverage * 100.0,
            options.mapping_strategy
        ));
    }

    let high = conflicts
        .iter()
        .filter(|c| c.severity == Severity::High)
        .count();
    if high > 0 {
        out.push(format!(
            "{high} high-severity conflicts found. Review them before generating code; \
             the design values take precedence."
        ));
    }

    let weak = mappings
        .iter()
        .filter(|m| m.confidence < LOW_CONFIDENCE)
        .count();
    if !mappings.is_empty() && weak * 2 > mappings.len() {
        out.push(format!(
            "{weak} of {} mappings have confidence below {LOW_CONFIDENCE}. Switch the mapping \
             strategy to `{}`.",
            mappings.len(),
            alternative_strategy(options.mapping_strategy)
        ));
    }

    if !warnings.is_empty() {
        out.push(format!(
            "{} stylesheet fragments were skipped (first at line {}). Only flat \
             `selector {{ property: value; }}` rules are mapped.",
            warnings.len(),
            warnings[0].line
        ));
    }

    out.truncate(options.max_suggestions);
    out
}

fn alternative_strategy(current: MappingStrategy) -> MappingStrategy {
    match current {
        MappingStrategy::Hybrid => MappingStrategy::Class,
        _ => MappingStrategy::Hybrid,
    }
}
