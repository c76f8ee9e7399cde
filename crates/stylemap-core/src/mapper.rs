//! Node mapper: associates design nodes with their best-matching rules.
//!
//! Walks the tree depth-first (pre-order), ranks every rule for every node,
//! derives a confidence value and a method label, and keeps only mappings
//! at or above the configured threshold. Traversal order and rule order are
//! both stable, so identical inputs always produce identical mappings.

use crate::conflict::StyleConflict;
use crate::id::NodeId;
use crate::model::{DesignNode, DesignTree, NodeType};
use crate::options::EnhanceOptions;
use crate::score::{RuleFeatures, ScoredRule, rank_rules};
use crate::stylesheet::StyleRule;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use std::fmt;

const NAME_IN_SELECTOR_BOOST: f32 = 1.2;
const GENERIC_TAG_DISCOUNT: f32 = 0.8;

/// How a mapping was established, derived from the top-ranked selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingMethod {
    Id,
    Class,
    Name,
    Auto,
    Manual,
}

impl MappingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingMethod::Id => "id",
            MappingMethod::Class => "class",
            MappingMethod::Name => "name",
            MappingMethod::Auto => "auto",
            MappingMethod::Manual => "manual",
        }
    }
}

impl fmt::Display for MappingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One design node and the rules that style it, best-first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStyleMapping {
    /// Position of the node in the tree the mapping was built from.
    #[serde(skip)]
    pub node_index: NodeIndex,
    pub node_id: NodeId,
    pub node_name: String,
    pub node_type: NodeType,
    /// Never empty. Sorted by descending match score, parse order on ties.
    pub matched_rules: Vec<StyleRule>,
    /// Match score of each entry in `matched_rules`, same order.
    pub match_scores: Vec<f32>,
    /// In [0, 1].
    pub confidence: f32,
    pub method: MappingMethod,
    /// Filled in by the conflict detector.
    pub conflicts: Vec<StyleConflict>,
}

/// Build mappings for every node of `tree` in depth-first pre-order.
#[must_use]
pub fn build_mappings(
    tree: &DesignTree,
    rules: &[StyleRule],
    options: &EnhanceOptions,
) -> Vec<NodeStyleMapping> {
    let features: Vec<RuleFeatures> = rules.iter().map(RuleFeatures::new).collect();
    let mut mappings = Vec::new();

    for idx in tree.walk_preorder() {
        let Some(node) = tree.node(idx) else {
            continue;
        };
        let ranked = rank_rules(node, rules, &features, options);
        if ranked.is_empty() {
            continue;
        }

        let confidence = confidence(node, rules, &ranked);
        log::trace!(
            "node {} `{}`: {} candidate rules, confidence {confidence:.3}",
            node.id,
            node.name,
            ranked.len()
        );
        if confidence < options.min_confidence {
            continue;
        }

        let top = &rules[ranked[0].index];
        mappings.push(NodeStyleMapping {
            node_index: idx,
            node_id: node.id.clone(),
            node_name: node.name.clone(),
            node_type: node.node_type,
            matched_rules: ranked.iter().map(|s| rules[s.index].clone()).collect(),
            match_scores: ranked.iter().map(|s| s.score).collect(),
            confidence,
            method: mapping_method(node, top, options),
            conflicts: Vec::new(),
        });
    }

    mappings
}

fn selector_contains_name(selector: &str, node: &DesignNode) -> bool {
    let name = node.name.trim().to_lowercase();
    !name.is_empty() && selector.to_lowercase().contains(&name)
}

/// Mean candidate score, boosted when a selector spells out the node name,
/// discounted when a candidate is a bare generic tag, clipped to [0, 1].
pub fn confidence(node: &DesignNode, rules: &[StyleRule], ranked: &[ScoredRule]) -> f32 {
    if ranked.is_empty() {
        return 0.0;
    }
    let mean = ranked.iter().map(|s| s.score).sum::<f32>() / ranked.len() as f32;
    let candidates = || ranked.iter().map(|s| &rules[s.index]);

    let mut confidence = mean;
    if candidates().any(|r| selector_contains_name(r.selector(), node)) {
        confidence *= NAME_IN_SELECTOR_BOOST;
    }
    if candidates().any(StyleRule::is_generic_tag) {
        confidence *= GENERIC_TAG_DISCOUNT;
    }
    confidence.clamp(0.0, 1.0)
}

/// Label a mapping by the shape of its top-ranked selector.
pub fn mapping_method(
    node: &DesignNode,
    top: &StyleRule,
    options: &EnhanceOptions,
) -> MappingMethod {
    let selector = top.selector();
    if selector.contains('#') {
        MappingMethod::Id
    } else if selector.contains('.') {
        MappingMethod::Class
    } else if selector_contains_name(selector, node) {
        MappingMethod::Name
    } else if options.enable_auto_mapping {
        MappingMethod::Auto
    } else {
        MappingMethod::Manual
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::MappingStrategy;
    use crate::parser::parse_stylesheet;

    fn tree_of(names: &[&str]) -> DesignTree {
        let mut tree = DesignTree::with_root(DesignNode::new(
            NodeId::new("page"),
            "Page",
            NodeType::Canvas,
        ));
        let root = tree.root().unwrap();
        for name in names {
            tree.add_node(
                root,
                DesignNode::new(NodeId::new(&format!("n-{name}")), *name, NodeType::Frame),
            )
            .unwrap();
        }
        tree
    }

    fn options(strategy: MappingStrategy, min_confidence: f32) -> EnhanceOptions {
        EnhanceOptions {
            mapping_strategy: strategy,
            min_confidence,
            ..Default::default()
        }
    }

    #[test]
    fn maps_in_preorder_and_skips_unmatched() {
        let tree = tree_of(&["Header", "Footer", "Sidebar"]);
        let rules = parse_stylesheet(".footer { color: red; } .header { color: blue; }").rules;
        let mappings = build_mappings(&tree, &rules, &EnhanceOptions::default());

        let names: Vec<&str> = mappings.iter().map(|m| m.node_name.as_str()).collect();
        assert_eq!(names, ["Header", "Footer"]);
        assert!(mappings.iter().all(|m| m.method == MappingMethod::Class));
        assert!(mappings.iter().all(|m| !m.matched_rules.is_empty()));
    }

    #[test]
    fn confidence_boost_is_clipped() {
        let tree = tree_of(&["Header"]);
        let rules = parse_stylesheet(".header { color: red; }").rules;
        let m = build_mappings(&tree, &rules, &options(MappingStrategy::Name, 0.0));
        // 1.0 × 1.2 clipped
        assert_eq!(m[0].confidence, 1.0);

        let m = build_mappings(&tree, &rules, &EnhanceOptions::default());
        assert!((m[0].confidence - 0.96).abs() < 1e-5);
    }

    #[test]
    fn generic_tag_discount() {
        let tree = tree_of(&["Div Box"]);
        let opts = options(MappingStrategy::Name, 0.0);

        let generic = parse_stylesheet("div { display: block; }").rules;
        let named = parse_stylesheet("div-wrap { display: block; }").rules;
        let g = build_mappings(&tree, &generic, &opts);
        let n = build_mappings(&tree, &named, &opts);

        assert_eq!(g.len(), 1);
        assert_eq!(n.len(), 1);
        assert!(g[0].confidence <= 0.8 * n[0].confidence + 1e-6);
        assert_eq!(g[0].method, MappingMethod::Auto);
    }

    #[test]
    fn below_threshold_is_discarded() {
        let tree = tree_of(&["Main Header"]);
        let rules = parse_stylesheet(".main { color: red; }").rules;
        // name 0.5, class 0.5 → 0.4 hybrid
        assert!(build_mappings(&tree, &rules, &options(MappingStrategy::Hybrid, 0.5)).is_empty());
        let kept = build_mappings(&tree, &rules, &options(MappingStrategy::Hybrid, 0.4));
        assert_eq!(kept.len(), 1);
        assert!(kept.iter().all(|m| m.confidence >= 0.4));
    }

    #[test]
    fn method_labels() {
        let node = DesignNode::new(NodeId::new("x"), "Card", NodeType::Frame);
        let auto = EnhanceOptions::default();
        let manual = EnhanceOptions {
            enable_auto_mapping: false,
            ..Default::default()
        };
        let rule = |sel: &str| StyleRule::new(sel, Vec::new(), 1, 1);

        assert_eq!(mapping_method(&node, &rule("#card"), &auto), MappingMethod::Id);
        assert_eq!(mapping_method(&node, &rule("main.card"), &auto), MappingMethod::Class);
        assert_eq!(mapping_method(&node, &rule("card"), &auto), MappingMethod::Name);
        assert_eq!(mapping_method(&node, &rule("article"), &auto), MappingMethod::Auto);
        assert_eq!(mapping_method(&node, &rule("article"), &manual), MappingMethod::Manual);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let tree = tree_of(&["Header", "Nav Item", "Footer Links"]);
        let rules = parse_stylesheet(
            ".header { color: red; } .nav-item { padding: 4px; } #footer .links { gap: 8px; }",
        )
        .rules;
        let opts = options(MappingStrategy::Hybrid, 0.0);
        assert_eq!(
            build_mappings(&tree, &rules, &opts),
            build_mappings(&tree, &rules, &opts)
        );
    }
}
