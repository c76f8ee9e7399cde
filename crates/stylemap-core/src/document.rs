//! Design document boundary: JSON export → validated `DesignTree`.
//!
//! The raw types mirror the node shape of a design-tool REST export
//! (`absoluteBoundingBox`, `layoutMode`, `style.fontSize`, ...). Everything
//! past this module works on the typed model only, so validation happens
//! here once: ids are non-empty and unique, color channels are finite and
//! in [0, 1], bounding boxes have non-negative size.

use crate::error::DocumentError;
use crate::id::NodeId;
use crate::model::*;
use petgraph::graph::NodeIndex;
use serde::Deserialize;
use smallvec::SmallVec;

// ─── Raw export shapes ───────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub node_type: Option<NodeType>,
    #[serde(default)]
    pub children: Vec<RawNode>,
    #[serde(default)]
    pub fills: Vec<RawPaint>,
    #[serde(default)]
    pub strokes: Vec<RawPaint>,
    pub stroke_weight: Option<f32>,
    #[serde(default)]
    pub effects: Vec<RawEffect>,
    pub style: Option<RawTypeStyle>,
    pub absolute_bounding_box: Option<RawBounds>,
    pub layout_mode: Option<String>,
    pub item_spacing: Option<f32>,
    pub padding_left: Option<f32>,
    pub padding_right: Option<f32>,
    pub padding_top: Option<f32>,
    pub padding_bottom: Option<f32>,
    pub corner_radius: Option<f32>,
    pub opacity: Option<f32>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    #[serde(default = "one")]
    pub a: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawGradientStop {
    pub position: f32,
    pub color: RawColor,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPaint {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "yes")]
    pub visible: bool,
    pub opacity: Option<f32>,
    pub color: Option<RawColor>,
    #[serde(default)]
    pub gradient_stops: Vec<RawGradientStop>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RawVector {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEffect {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "yes")]
    pub visible: bool,
    #[serde(default)]
    pub radius: f32,
    pub offset: Option<RawVector>,
    pub color: Option<RawColor>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTypeStyle {
    pub font_family: Option<String>,
    pub font_weight: Option<f32>,
    pub font_size: Option<f32>,
    pub line_height_px: Option<f32>,
    pub letter_spacing: Option<f32>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

fn one() -> f32 {
    1.0
}

fn yes() -> bool {
    true
}

// ─── Public API ──────────────────────────────────────────────────────────

/// Parse and validate a design document exported as JSON.
pub fn load_design_tree(json: &str) -> Result<DesignTree, DocumentError> {
    let raw: RawNode = serde_json::from_str(json)?;
    DesignTree::from_raw(raw)
}

impl DesignTree {
    /// Build a tree from a raw export, validating every node.
    ///
    /// Children keep their document order. The whole document is rejected on
    /// the first invalid node.
    pub fn from_raw(mut root: RawNode) -> Result<Self, DocumentError> {
        let children = std::mem::take(&mut root.children);
        let (mut tree, root_idx) = DesignTree::rooted(convert_node(root)?);
        let mut stack: Vec<(NodeIndex, RawNode)> =
            children.into_iter().rev().map(|c| (root_idx, c)).collect();

        while let Some((parent, mut raw)) = stack.pop() {
            let children = std::mem::take(&mut raw.children);
            let idx = tree.add_node(parent, convert_node(raw)?)?;
            stack.extend(children.into_iter().rev().map(|c| (idx, c)));
        }

        log::debug!("loaded design tree with {} nodes", tree.node_count());
        Ok(tree)
    }
}

// ─── Conversion ──────────────────────────────────────────────────────────

fn convert_node(raw: RawNode) -> Result<DesignNode, DocumentError> {
    if raw.id.trim().is_empty() {
        return Err(DocumentError::EmptyId { name: raw.name });
    }

    let mut node = DesignNode::new(
        NodeId::new(&raw.id),
        raw.name.as_str(),
        raw.node_type.unwrap_or(NodeType::Other),
    );

    for paint in &raw.fills {
        if let Some(p) = convert_paint(&raw.id, paint)? {
            node.fills.push(p);
        }
    }
    let weight = raw.stroke_weight.unwrap_or(1.0);
    for paint in &raw.strokes {
        if let Some(p) = convert_paint(&raw.id, paint)? {
            node.strokes.push(Stroke { paint: p, weight });
        }
    }
    node.effects = raw
        .effects
        .iter()
        .filter_map(|e| convert_effect(&raw.id, e).transpose())
        .collect::<Result<SmallVec<_>, _>>()?;

    node.typography = raw
        .style
        .as_ref()
        .map(convert_type_style)
        .filter(|t| !t.is_empty());

    if let Some(b) = raw.absolute_bounding_box {
        let valid = |v: f32| v.is_finite() && v >= 0.0;
        if !valid(b.width) || !valid(b.height) {
            return Err(DocumentError::InvalidBounds {
                id: raw.id,
                width: b.width,
                height: b.height,
            });
        }
        node.bounds = Some(BoundingBox {
            x: b.x,
            y: b.y,
            width: b.width,
            height: b.height,
        });
    }

    let direction = match raw.layout_mode.as_deref() {
        Some("HORIZONTAL") => Some(LayoutDirection::Horizontal),
        Some("VERTICAL") => Some(LayoutDirection::Vertical),
        _ => None,
    };
    node.layout = direction.map(|direction| AutoLayout {
        direction,
        item_spacing: raw.item_spacing.unwrap_or(0.0),
        padding: Padding {
            top: raw.padding_top.unwrap_or(0.0),
            right: raw.padding_right.unwrap_or(0.0),
            bottom: raw.padding_bottom.unwrap_or(0.0),
            left: raw.padding_left.unwrap_or(0.0),
        },
    });

    node.corner_radius = raw.corner_radius;
    node.opacity = raw.opacity;
    Ok(node)
}

fn convert_color(id: &str, raw: RawColor) -> Result<Color, DocumentError> {
    for value in [raw.r, raw.g, raw.b, raw.a] {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(DocumentError::InvalidColor {
                id: id.to_string(),
                value,
            });
        }
    }
    Ok(Color::rgba(raw.r, raw.g, raw.b, raw.a))
}

fn convert_stops(id: &str, stops: &[RawGradientStop]) -> Result<Vec<GradientStop>, DocumentError> {
    stops
        .iter()
        .map(|s| {
            Ok(GradientStop {
                offset: s.position,
                color: convert_color(id, s.color)?,
            })
        })
        .collect()
}

/// `Ok(None)` for invisible paints and kinds the model has no place for.
fn convert_paint(id: &str, raw: &RawPaint) -> Result<Option<Paint>, DocumentError> {
    if !raw.visible {
        return Ok(None);
    }
    let paint = match raw.kind.as_str() {
        "SOLID" => {
            let Some(color) = raw.color else {
                log::debug!("node {id}: solid paint without a color dropped");
                return Ok(None);
            };
            let mut color = convert_color(id, color)?;
            if let Some(opacity) = raw.opacity {
                color.a *= opacity.clamp(0.0, 1.0);
            }
            Paint::Solid(color)
        }
        "GRADIENT_LINEAR" => Paint::LinearGradient {
            stops: convert_stops(id, &raw.gradient_stops)?,
        },
        "GRADIENT_RADIAL" | "GRADIENT_ANGULAR" | "GRADIENT_DIAMOND" => Paint::RadialGradient {
            stops: convert_stops(id, &raw.gradient_stops)?,
        },
        "IMAGE" => Paint::Image,
        other => {
            log::debug!("node {id}: unknown paint kind `{other}` dropped");
            return Ok(None);
        }
    };
    Ok(Some(paint))
}

fn convert_effect(id: &str, raw: &RawEffect) -> Result<Option<Effect>, DocumentError> {
    if !raw.visible {
        return Ok(None);
    }
    let kind = match raw.kind.as_str() {
        "DROP_SHADOW" => EffectKind::DropShadow,
        "INNER_SHADOW" => EffectKind::InnerShadow,
        "LAYER_BLUR" => EffectKind::LayerBlur,
        "BACKGROUND_BLUR" => EffectKind::BackgroundBlur,
        other => {
            log::debug!("node {id}: unknown effect kind `{other}` dropped");
            return Ok(None);
        }
    };
    let offset = raw.offset.unwrap_or_default();
    Ok(Some(Effect {
        kind,
        radius: raw.radius,
        offset_x: offset.x,
        offset_y: offset.y,
        color: raw.color.map(|c| convert_color(id, c)).transpose()?,
    }))
}

/// Only what the export states. Missing fields stay `None`.
fn convert_type_style(raw: &RawTypeStyle) -> Typography {
    Typography {
        family: raw.font_family.clone(),
        weight: raw
            .font_weight
            .map(|w| w.round().clamp(1.0, 1000.0) as u16),
        size: raw.font_size,
        line_height: raw.line_height_px,
        letter_spacing: raw.letter_spacing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"{
        "id": "0:1",
        "name": "Page",
        "type": "CANVAS",
        "children": [
            {
                "id": "1:1",
                "name": "Header",
                "type": "FRAME",
                "fills": [
                    { "type": "SOLID", "color": { "r": 0, "g": 0, "b": 1, "a": 1 } },
                    { "type": "SOLID", "visible": false, "color": { "r": 1, "g": 0, "b": 0, "a": 1 } }
                ],
                "absoluteBoundingBox": { "x": 0, "y": 0, "width": 1440, "height": 80 },
                "layoutMode": "HORIZONTAL",
                "itemSpacing": 16,
                "paddingLeft": 24, "paddingRight": 24, "paddingTop": 12, "paddingBottom": 12,
                "children": [
                    {
                        "id": "1:2",
                        "name": "Title",
                        "type": "TEXT",
                        "style": { "fontFamily": "Inter", "fontWeight": 700, "fontSize": 18, "lineHeightPx": 27 }
                    }
                ]
            },
            {
                "id": "2:1",
                "name": "Hero Card",
                "type": "FANCY_NEW_THING",
                "fills": [ { "type": "VIDEO" }, { "type": "GRADIENT_LINEAR", "gradientStops": [] } ],
                "effects": [ { "type": "DROP_SHADOW", "radius": 4, "offset": { "x": 0, "y": 2 }, "color": { "r": 0, "g": 0, "b": 0, "a": 0.25 } } ],
                "cornerRadius": 8,
                "someField": "ignored"
            }
        ]
    }"#;

    #[test]
    fn loads_export_in_document_order() {
        let tree = load_design_tree(PAGE).unwrap();
        assert_eq!(tree.node_count(), 4);
        let names: Vec<&str> = tree
            .walk_preorder()
            .into_iter()
            .map(|i| tree.node(i).unwrap().name.as_str())
            .collect();
        assert_eq!(names, ["Page", "Header", "Title", "Hero Card"]);
    }

    #[test]
    fn converts_attributes() {
        let tree = load_design_tree(PAGE).unwrap();

        let header = tree.get_by_id("1:1").unwrap();
        assert_eq!(header.fills.len(), 1);
        assert_eq!(header.solid_fill().unwrap().to_css(), "rgb(0, 0, 255)");
        assert_eq!(header.bounds.unwrap().width, 1440.0);
        let layout = header.layout.unwrap();
        assert_eq!(layout.direction, LayoutDirection::Horizontal);
        assert_eq!(layout.padding.left, 24.0);

        let title = tree.get_by_id("1:2").unwrap();
        let typo = title.typography.as_ref().unwrap();
        assert_eq!(typo.weight, Some(700));
        assert_eq!(typo.line_height, Some(27.0));

        let card = tree.get_by_id("2:1").unwrap();
        assert_eq!(card.node_type, NodeType::Other);
        assert_eq!(card.fills.len(), 1);
        assert!(card.solid_fill().is_none());
        assert_eq!(card.shadow().unwrap().offset_y, 2.0);
        assert_eq!(card.corner_radius, Some(8.0));
    }

    #[test]
    fn paint_opacity_scales_alpha() {
        let tree = load_design_tree(
            r#"{ "id": "a", "name": "A", "type": "RECTANGLE",
                 "fills": [ { "type": "SOLID", "opacity": 0.5, "color": { "r": 0, "g": 0, "b": 0, "a": 1 } } ] }"#,
        )
        .unwrap();
        let fill = tree.node(tree.root().unwrap()).unwrap().solid_fill().unwrap();
        assert_eq!(fill.to_css(), "rgba(0, 0, 0, 0.5)");
    }

    #[test]
    fn missing_text_style_fields_stay_unset() {
        let tree = load_design_tree(
            r#"{ "id": "t:1", "name": "Title", "type": "TEXT", "style": { "fontSize": 18 } }"#,
        )
        .unwrap();
        let typo = tree.get_by_id("t:1").unwrap().typography.clone().unwrap();
        assert_eq!(
            typo,
            Typography {
                size: Some(18.0),
                ..Default::default()
            }
        );

        let tree = load_design_tree(r#"{ "id": "t:2", "name": "Blank", "style": {} }"#).unwrap();
        assert!(tree.get_by_id("t:2").unwrap().typography.is_none());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = load_design_tree(
            r#"{ "id": "a", "name": "A", "children": [ { "id": "a", "name": "B" } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, DocumentError::DuplicateId { id } if id == "a"));
    }

    #[test]
    fn rejects_empty_id() {
        let err = load_design_tree(r#"{ "id": " ", "name": "Nameless" }"#).unwrap_err();
        assert!(matches!(err, DocumentError::EmptyId { name } if name == "Nameless"));
    }

    #[test]
    fn rejects_out_of_range_color() {
        let err = load_design_tree(
            r#"{ "id": "a", "name": "A", "fills": [ { "type": "SOLID", "color": { "r": 255, "g": 0, "b": 0 } } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, DocumentError::InvalidColor { value, .. } if value == 255.0));
    }

    #[test]
    fn rejects_negative_bounds() {
        let err = load_design_tree(
            r#"{ "id": "a", "name": "A", "absoluteBoundingBox": { "x": 0, "y": 0, "width": -1, "height": 4 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, DocumentError::InvalidBounds { .. }));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let err = load_design_tree("{ \"id\": ").unwrap_err();
        assert!(matches!(err, DocumentError::Json(_)));
        assert!(err.to_string().starts_with("Invalid design document JSON"));
    }
}
