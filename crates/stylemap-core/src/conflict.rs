//! Conflict detection between design values and stylesheet declarations.
//!
//! The design is authoritative. For every matched (node, rule, declaration)
//! triple whose property has a design counterpart on the node, the two
//! values are normalized and compared; a conflict is reported only when
//! they differ. A node that lacks the attribute never produces a conflict
//! for it.

use crate::id::NodeId;
use crate::mapper::NodeStyleMapping;
use crate::model::{ColorTarget, DesignNode, DesignTree, Padding};
use crate::options::EnhanceOptions;
use crate::stylesheet::{StyleDeclaration, StyleRule};
use crate::values::{
    first_font_family, format_number, format_px, normalize_color, parse_font_weight, parse_number,
    parse_px,
};
use serde::Serialize;
use std::fmt;

const PX_EPSILON: f32 = 0.01;

// ─── Conflict types ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    Color,
    Typography,
    Spacing,
    Layout,
    Effects,
}

impl ConflictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictKind::Color => "color",
            ConflictKind::Typography => "typography",
            ConflictKind::Spacing => "spacing",
            ConflictKind::Layout => "layout",
            ConflictKind::Effects => "effects",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mismatch between a node's design value and a declared CSS value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleConflict {
    pub kind: ConflictKind,
    pub property: String,
    /// Authoritative value from the design, in CSS notation.
    pub design_value: String,
    /// Declared value, normalized when a comparable form exists.
    pub css_value: String,
    pub severity: Severity,
    pub suggestion: String,
    pub node_id: NodeId,
    pub selector: String,
    pub source_line: usize,
}

// ─── Public API ──────────────────────────────────────────────────────────

/// Conflicts for every accepted mapping, in mapping → rule → declaration order.
#[must_use]
pub fn detect_conflicts(
    mappings: &[NodeStyleMapping],
    tree: &DesignTree,
    options: &EnhanceOptions,
) -> Vec<StyleConflict> {
    mappings
        .iter()
        .filter_map(|m| tree.node(m.node_index).map(|node| (node, m)))
        .flat_map(|(node, m)| detect_node_conflicts(node, &m.matched_rules, options))
        .collect()
}

/// Conflicts between one node and its matched rules.
#[must_use]
pub fn detect_node_conflicts(
    node: &DesignNode,
    rules: &[StyleRule],
    options: &EnhanceOptions,
) -> Vec<StyleConflict> {
    let mut conflicts = Vec::new();
    for rule in rules {
        for decl in rule.declarations() {
            if let Some(found) = compare_declaration(node, decl, options) {
                conflicts.push(StyleConflict {
                    suggestion: suggestion(&found, decl.property(), rule.selector()),
                    kind: found.kind,
                    property: decl.property().to_string(),
                    design_value: found.design_value,
                    css_value: found.css_value,
                    severity: found.severity,
                    node_id: node.id.clone(),
                    selector: rule.selector().to_string(),
                    source_line: decl.source_line(),
                });
            }
        }
    }
    conflicts
}

// ─── Comparison ──────────────────────────────────────────────────────────

/// A detected difference before it is tied to a rule.
struct Mismatch {
    kind: ConflictKind,
    design_value: String,
    css_value: String,
    severity: Severity,
}

impl Mismatch {
    fn new(kind: ConflictKind, severity: Severity, design: String, css: String) -> Self {
        Self {
            kind,
            design_value: design,
            css_value: css,
            severity,
        }
    }
}

fn compare_declaration(
    node: &DesignNode,
    decl: &StyleDeclaration,
    options: &EnhanceOptions,
) -> Option<Mismatch> {
    let value = decl.value();
    if let Some(target) = ColorTarget::of_property(decl.property()) {
        if options.ignore_colors {
            return None;
        }
        return compare_color(node.solid_color(target)?.to_css(), value);
    }
    match decl.property() {
        "font-size" if !options.ignore_typography => {
            compare_typography_px(node.typography.as_ref()?.size?, value)
        }
        "font-weight" if !options.ignore_typography => {
            let design = node.typography.as_ref()?.weight?;
            let differs = parse_font_weight(value) != Some(design);
            differs.then(|| typography(design.to_string(), value.to_string()))
        }
        "font-family" if !options.ignore_typography => {
            let design = node.typography.as_ref()?.family.as_ref()?;
            let css = first_font_family(value);
            let differs = !css.eq_ignore_ascii_case(design);
            differs.then(|| typography(design.clone(), value.to_string()))
        }
        "line-height" if !options.ignore_typography => {
            let typo = node.typography.as_ref()?;
            compare_line_height(typo.line_height?, typo.size, value)
        }
        "letter-spacing" if !options.ignore_typography => {
            compare_typography_px(node.typography.as_ref()?.letter_spacing?, value)
        }
        "width" if !options.ignore_spacing => {
            compare_px(ConflictKind::Layout, node.bounds?.width, value)
        }
        "height" if !options.ignore_spacing => {
            compare_px(ConflictKind::Layout, node.bounds?.height, value)
        }
        "border-radius" if !options.ignore_spacing => {
            compare_px(ConflictKind::Layout, node.corner_radius?, value)
        }
        "gap" | "row-gap" | "column-gap" if !options.ignore_spacing => {
            compare_px(ConflictKind::Spacing, node.layout?.item_spacing, value)
        }
        "padding" if !options.ignore_spacing => compare_padding(node.layout?.padding, value),
        "padding-top" if !options.ignore_spacing => {
            compare_px(ConflictKind::Spacing, node.layout?.padding.top, value)
        }
        "padding-right" if !options.ignore_spacing => {
            compare_px(ConflictKind::Spacing, node.layout?.padding.right, value)
        }
        "padding-bottom" if !options.ignore_spacing => {
            compare_px(ConflictKind::Spacing, node.layout?.padding.bottom, value)
        }
        "padding-left" if !options.ignore_spacing => {
            compare_px(ConflictKind::Spacing, node.layout?.padding.left, value)
        }
        "opacity" => {
            let design = node.opacity?;
            let differs = parse_number(value).is_none_or(|v| (v - design).abs() > PX_EPSILON);
            differs.then(|| {
                Mismatch::new(
                    ConflictKind::Effects,
                    Severity::Low,
                    format_number(design),
                    value.to_string(),
                )
            })
        }
        "box-shadow" => {
            let shadow = node.shadow()?;
            value.eq_ignore_ascii_case("none").then(|| {
                Mismatch::new(
                    ConflictKind::Effects,
                    Severity::Low,
                    shadow_css(shadow),
                    value.to_string(),
                )
            })
        }
        _ => None,
    }
}

fn typography(design: String, css: String) -> Mismatch {
    Mismatch::new(ConflictKind::Typography, Severity::Medium, design, css)
}

/// Two recognizable colors that differ are `medium`; a declared value with
/// no comparable form is `low`.
fn compare_color(design: String, value: &str) -> Option<Mismatch> {
    match normalize_color(value) {
        Some(css) if css == design => None,
        Some(css) => Some(Mismatch::new(ConflictKind::Color, Severity::Medium, design, css)),
        None => Some(Mismatch::new(
            ConflictKind::Color,
            Severity::Low,
            design,
            value.to_string(),
        )),
    }
}

fn px_differs(design: f32, value: &str) -> bool {
    parse_px(value).is_none_or(|v| (v - design).abs() > PX_EPSILON)
}

fn compare_px(kind: ConflictKind, design: f32, value: &str) -> Option<Mismatch> {
    px_differs(design, value)
        .then(|| Mismatch::new(kind, Severity::Low, format_px(design), value.to_string()))
}

fn compare_typography_px(design: f32, value: &str) -> Option<Mismatch> {
    px_differs(design, value).then(|| typography(format_px(design), value.to_string()))
}

/// `line-height` may be px, a unitless multiplier, or a percentage of the
/// font size. Relative values are not compared when the design has no size.
fn compare_line_height(design: f32, font_size: Option<f32>, value: &str) -> Option<Mismatch> {
    let v = value.trim();
    let css_px = if v.ends_with("px") {
        parse_px(v)
    } else if let Some(pct) = v.strip_suffix('%') {
        let font_size = font_size?;
        parse_number(pct).map(|p| p / 100.0 * font_size)
    } else {
        let font_size = font_size?;
        parse_number(v).map(|m| m * font_size)
    };
    let differs = css_px.is_none_or(|px| (px - design).abs() > PX_EPSILON);
    differs.then(|| typography(format_px(design), value.to_string()))
}

/// Expand a 1–4 value `padding` shorthand into (top, right, bottom, left).
fn expand_box_shorthand(value: &str) -> Option<Padding> {
    let parts: Vec<f32> = value
        .split_whitespace()
        .map(parse_px)
        .collect::<Option<Vec<_>>>()?;
    let (top, right, bottom, left) = match parts[..] {
        [a] => (a, a, a, a),
        [v, h] => (v, h, v, h),
        [t, h, b] => (t, h, b, h),
        [t, r, b, l] => (t, r, b, l),
        _ => return None,
    };
    Some(Padding {
        top,
        right,
        bottom,
        left,
    })
}

/// Shortest shorthand for a padding box.
fn padding_css(p: &Padding) -> String {
    let (t, r, b, l) = (p.top, p.right, p.bottom, p.left);
    let sides: Vec<f32> = if let Some(all) = p.uniform() {
        vec![all]
    } else if t == b && r == l {
        vec![t, r]
    } else if r == l {
        vec![t, r, b]
    } else {
        vec![t, r, b, l]
    };
    sides.into_iter().map(format_px).collect::<Vec<_>>().join(" ")
}

fn compare_padding(design: Padding, value: &str) -> Option<Mismatch> {
    let same = expand_box_shorthand(value).is_some_and(|css| {
        [
            (css.top, design.top),
            (css.right, design.right),
            (css.bottom, design.bottom),
            (css.left, design.left),
        ]
        .iter()
        .all(|(a, b)| (a - b).abs() <= PX_EPSILON)
    });
    (!same).then(|| {
        Mismatch::new(
            ConflictKind::Spacing,
            Severity::Low,
            padding_css(&design),
            value.to_string(),
        )
    })
}

fn shadow_css(shadow: &crate::model::Effect) -> String {
    let color = shadow
        .color
        .map(|c| format!(" {}", c.to_css()))
        .unwrap_or_default();
    format!(
        "{} {} {}{color}",
        format_px(shadow.offset_x),
        format_px(shadow.offset_y),
        format_px(shadow.radius)
    )
}

fn suggestion(found: &Mismatch, property: &str, selector: &str) -> String {
    match found.kind {
        ConflictKind::Color => format!(
            "Use the design color `{}` for `{property}` in `{selector}` instead of `{}`.",
            found.design_value, found.css_value
        ),
        _ => format!(
            "Set `{property}` to `{}` in `{selector}` to match the design (currently `{}`).",
            found.design_value, found.css_value
        ),
    }
}
