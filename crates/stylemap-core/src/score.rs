//! Match scoring between one design node and one stylesheet rule.
//!
//! A score is a selector-similarity part (driven by the mapping strategy)
//! plus a style-similarity bonus. Both are pure functions of their inputs.

use crate::model::{ColorTarget, DesignNode};
use crate::options::{EnhanceOptions, MappingStrategy};
use crate::stylesheet::StyleRule;
use crate::values::{normalize_color, parse_px};

const HYBRID_NAME_WEIGHT: f32 = 0.4;
const HYBRID_CLASS_WEIGHT: f32 = 0.4;
const HYBRID_ID_WEIGHT: f32 = 0.2;

const COLOR_MATCH_BONUS: f32 = 0.3;
const FONT_SIZE_MATCH_BONUS: f32 = 0.2;
const WIDTH_MATCH_BONUS: f32 = 0.1;

const FONT_SIZE_TOLERANCE_PX: f32 = 2.0;
const WIDTH_TOLERANCE_PX: f32 = 5.0;

/// Split on `-`, `_` and whitespace; lowercase; drop empty pieces.
pub fn tokenize(s: &str) -> Vec<String> {
    s.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn related(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

/// Selector features extracted once per rule and reused for every node.
#[derive(Debug, Clone)]
pub struct RuleFeatures {
    tokens: Vec<String>,
    classes: Vec<String>,
    ids: Vec<String>,
}

impl RuleFeatures {
    pub fn new(rule: &StyleRule) -> Self {
        let lower = |names: Vec<&str>| -> Vec<String> {
            names.into_iter().map(str::to_lowercase).collect()
        };
        Self {
            tokens: tokenize(rule.selector()),
            classes: lower(rule.class_names()),
            ids: lower(rule.id_names()),
        }
    }
}

/// Fraction of `candidates` related to some name token, over the larger of
/// the two counts.
fn overlap_score(name_tokens: &[String], candidates: &[String], count_name_side: bool) -> f32 {
    let denom = name_tokens.len().max(candidates.len());
    if denom == 0 {
        return 0.0;
    }
    let hits = if count_name_side {
        name_tokens
            .iter()
            .filter(|t| candidates.iter().any(|c| related(c, t)))
            .count()
    } else {
        candidates
            .iter()
            .filter(|c| name_tokens.iter().any(|t| related(c, t)))
            .count()
    };
    hits as f32 / denom as f32
}

/// Node-name tokens found in (or containing) some selector token.
pub fn name_score(name_tokens: &[String], features: &RuleFeatures) -> f32 {
    overlap_score(name_tokens, &features.tokens, true)
}

/// `.class` names related to some node-name token.
pub fn class_score(name_tokens: &[String], features: &RuleFeatures) -> f32 {
    overlap_score(name_tokens, &features.classes, false)
}

/// `#id` names related to some node-name token.
pub fn id_score(name_tokens: &[String], features: &RuleFeatures) -> f32 {
    overlap_score(name_tokens, &features.ids, false)
}

/// Selector similarity under `strategy`, in [0, 1].
pub fn selector_score(
    name_tokens: &[String],
    features: &RuleFeatures,
    strategy: MappingStrategy,
) -> f32 {
    match strategy {
        MappingStrategy::Name => name_score(name_tokens, features),
        MappingStrategy::Class => class_score(name_tokens, features),
        MappingStrategy::Id => id_score(name_tokens, features),
        MappingStrategy::Hybrid => {
            HYBRID_NAME_WEIGHT * name_score(name_tokens, features)
                + HYBRID_CLASS_WEIGHT * class_score(name_tokens, features)
                + HYBRID_ID_WEIGHT * id_score(name_tokens, features)
        }
    }
}

fn is_scored_typography(property: &str) -> bool {
    matches!(
        property,
        "font-size" | "font-weight" | "font-family" | "line-height"
    )
}

fn is_scored_spacing(property: &str) -> bool {
    matches!(property, "width" | "height" | "gap")
        || property.starts_with("margin")
        || property.starts_with("padding")
}

/// Bonus for declared values that already agree with the design, averaged
/// over the checks that apply to this (node, rule) pair.
pub fn style_bonus(node: &DesignNode, rule: &StyleRule, options: &EnhanceOptions) -> f32 {
    let mut total = 0.0;
    let mut checks = 0u32;

    if !options.ignore_colors {
        // Each color declaration paired with the paint it describes, when the
        // node has that paint.
        let comparable: Vec<(String, &str)> = rule
            .declarations()
            .iter()
            .filter_map(|d| {
                let target = ColorTarget::of_property(d.property())?;
                Some((node.solid_color(target)?.to_css(), d.value()))
            })
            .collect();
        if !comparable.is_empty() {
            checks += 1;
            let matched = comparable
                .iter()
                .any(|(design, value)| normalize_color(value).as_deref() == Some(design.as_str()));
            if matched {
                total += COLOR_MATCH_BONUS;
            }
        }
    }

    if !options.ignore_typography
        && rule.declares(is_scored_typography)
        && let Some(typo) = &node.typography
    {
        checks += 1;
        let close = typo.size.is_some_and(|design| {
            rule.get("font-size")
                .and_then(|d| parse_px(d.value()))
                .is_some_and(|size| (size - design).abs() < FONT_SIZE_TOLERANCE_PX)
        });
        if close {
            total += FONT_SIZE_MATCH_BONUS;
        }
    }

    if !options.ignore_spacing
        && rule.declares(is_scored_spacing)
        && let Some(bounds) = &node.bounds
    {
        checks += 1;
        let close = rule
            .get("width")
            .and_then(|d| parse_px(d.value()))
            .is_some_and(|w| (w - bounds.width).abs() < WIDTH_TOLERANCE_PX);
        if close {
            total += WIDTH_MATCH_BONUS;
        }
    }

    if checks == 0 {
        0.0
    } else {
        total / checks as f32
    }
}

/// Full match score of `rule` for `node`: selector similarity plus style bonus.
pub fn score(
    node: &DesignNode,
    rule: &StyleRule,
    strategy: MappingStrategy,
    options: &EnhanceOptions,
) -> f32 {
    let name_tokens = tokenize(&node.name);
    score_prepared(node, &name_tokens, rule, &RuleFeatures::new(rule), strategy, options)
}

/// Same as [`score`] with the node tokens and rule features precomputed.
pub fn score_prepared(
    node: &DesignNode,
    name_tokens: &[String],
    rule: &StyleRule,
    features: &RuleFeatures,
    strategy: MappingStrategy,
    options: &EnhanceOptions,
) -> f32 {
    selector_score(name_tokens, features, strategy) + style_bonus(node, rule, options)
}

/// A rule that scored above zero for some node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredRule {
    /// Position of the rule in parse order.
    pub index: usize,
    pub score: f32,
}

/// Score every rule for `node`, drop zero scores, and sort best-first.
/// Equal scores keep parse order.
pub fn rank_rules(
    node: &DesignNode,
    rules: &[StyleRule],
    features: &[RuleFeatures],
    options: &EnhanceOptions,
) -> Vec<ScoredRule> {
    let name_tokens = tokenize(&node.name);
    let mut ranked: Vec<ScoredRule> = rules
        .iter()
        .zip(features)
        .enumerate()
        .map(|(index, (rule, feat))| ScoredRule {
            index,
            score: score_prepared(
                node,
                &name_tokens,
                rule,
                feat,
                options.mapping_strategy,
                options,
            ),
        })
        .filter(|s| s.score > 0.0)
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}
