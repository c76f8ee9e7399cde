//! Design-node data model.
//!
//! The design document is a tree: every node owns its children in document
//! order, and the tree is read-only once it leaves the `document` boundary.
//! Nodes live in a `petgraph` directed graph (parent → child edges) so the
//! tree can be walked and indexed without reference juggling.

use crate::error::DocumentError;
use crate::id::NodeId;
use crate::values::format_number;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;

// ─── Colors & Paint ──────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
pub fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Build from 0–255 channels and a 0–1 alpha.
    pub fn from_rgb8(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self::rgba(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a)
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let short = |i: usize| hex_val(bytes[i]).map(|v| v * 17);
        let long = |i: usize| Some(hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?);

        let (r, g, b, a) = match bytes.len() {
            3 => (short(0)?, short(1)?, short(2)?, 255),
            4 => (short(0)?, short(1)?, short(2)?, short(3)?),
            6 => (long(0)?, long(2)?, long(4)?, 255),
            8 => (long(0)?, long(2)?, long(4)?, long(6)?),
            _ => return None,
        };
        Some(Self::from_rgb8(r, g, b, a as f32 / 255.0))
    }

    /// Channels as 0–255 integers.
    pub fn to_rgb8(&self) -> (u8, u8, u8) {
        let ch = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        (ch(self.r), ch(self.g), ch(self.b))
    }

    /// Whether the alpha channel is visually opaque at 8-bit precision.
    pub fn is_opaque(&self) -> bool {
        (self.a.clamp(0.0, 1.0) * 255.0).round() >= 255.0
    }

    /// Canonical CSS form used for every color comparison:
    /// `rgb(R, G, B)`, or `rgba(R, G, B, A)` when not fully opaque.
    pub fn to_css(&self) -> String {
        let (r, g, b) = self.to_rgb8();
        if self.is_opaque() {
            format!("rgb({r}, {g}, {b})")
        } else {
            format!("rgba({r}, {g}, {b}, {})", format_number(self.a.clamp(0.0, 1.0)))
        }
    }
}

/// A gradient stop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientStop {
    pub offset: f32, // 0.0 .. 1.0
    pub color: Color,
}

/// Fill or stroke paint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Paint {
    Solid(Color),
    LinearGradient { stops: Vec<GradientStop> },
    RadialGradient { stops: Vec<GradientStop> },
    Image,
}

impl Paint {
    pub fn as_solid(&self) -> Option<Color> {
        match self {
            Paint::Solid(c) => Some(*c),
            _ => None,
        }
    }
}

// ─── Stroke ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stroke {
    pub paint: Paint,
    pub weight: f32,
}

// ─── Effects ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    DropShadow,
    InnerShadow,
    LayerBlur,
    BackgroundBlur,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
    pub radius: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub color: Option<Color>,
}

impl Effect {
    pub fn is_shadow(&self) -> bool {
        matches!(self.kind, EffectKind::DropShadow | EffectKind::InnerShadow)
    }
}

// ─── Typography ──────────────────────────────────────────────────────────

/// Text style as exported. Every field is optional: a design that leaves
/// one out has no value for it, and nothing is compared against it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Typography {
    pub family: Option<String>,
    pub weight: Option<u16>, // 100..900
    pub size: Option<f32>,
    /// Line height in px, when the design pins one.
    pub line_height: Option<f32>,
    pub letter_spacing: Option<f32>,
}

impl Typography {
    pub fn is_empty(&self) -> bool {
        self.family.is_none()
            && self.weight.is_none()
            && self.size.is_none()
            && self.line_height.is_none()
            && self.letter_spacing.is_none()
    }
}

// ─── Geometry & Layout ───────────────────────────────────────────────────

/// Absolute bounding box as reported by the design tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutDirection {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Padding {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Padding {
    /// Whether all four sides carry the same value.
    pub fn uniform(&self) -> Option<f32> {
        let same = self.top == self.right && self.right == self.bottom && self.bottom == self.left;
        same.then_some(self.top)
    }
}

/// Auto-layout attributes (flex-like stacking of children).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutoLayout {
    pub direction: LayoutDirection,
    pub item_spacing: f32,
    pub padding: Padding,
}

/// Which paint of a node a CSS color property describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTarget {
    Fill,
    Stroke,
}

impl ColorTarget {
    /// `color`, `background` and `fill` describe the fill; `border-color`,
    /// `stroke` and `outline-color` the stroke. Other properties are not colors.
    pub fn of_property(property: &str) -> Option<Self> {
        match property {
            "color" | "background" | "background-color" | "fill" => Some(ColorTarget::Fill),
            "border-color" | "stroke" | "outline-color" => Some(ColorTarget::Stroke),
            _ => None,
        }
    }
}

// ─── Design Nodes ────────────────────────────────────────────────────────

/// The node types a design document can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Document,
    Canvas,
    Frame,
    Group,
    Section,
    Component,
    ComponentSet,
    Instance,
    Text,
    Rectangle,
    Ellipse,
    Line,
    Vector,
    BooleanOperation,
    Star,
    Polygon,
    Slice,
    #[serde(other)]
    Other,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Document => "DOCUMENT",
            NodeType::Canvas => "CANVAS",
            NodeType::Frame => "FRAME",
            NodeType::Group => "GROUP",
            NodeType::Section => "SECTION",
            NodeType::Component => "COMPONENT",
            NodeType::ComponentSet => "COMPONENT_SET",
            NodeType::Instance => "INSTANCE",
            NodeType::Text => "TEXT",
            NodeType::Rectangle => "RECTANGLE",
            NodeType::Ellipse => "ELLIPSE",
            NodeType::Line => "LINE",
            NodeType::Vector => "VECTOR",
            NodeType::BooleanOperation => "BOOLEAN_OPERATION",
            NodeType::Star => "STAR",
            NodeType::Polygon => "POLYGON",
            NodeType::Slice => "SLICE",
            NodeType::Other => "OTHER",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single node in the design tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignNode {
    pub id: NodeId,

    /// Layer name as typed by the designer (e.g. `Header`, `cta-button`).
    pub name: String,

    pub node_type: NodeType,

    /// Visible fills, top-most last as in the design tool.
    pub fills: SmallVec<[Paint; 2]>,

    /// Visible strokes.
    pub strokes: SmallVec<[Stroke; 1]>,

    /// Visible effects (shadows, blurs).
    pub effects: SmallVec<[Effect; 1]>,

    /// Text style. Only text nodes (and some instances) carry one.
    pub typography: Option<Typography>,

    pub bounds: Option<BoundingBox>,

    /// Auto-layout attributes, when the node stacks its children.
    pub layout: Option<AutoLayout>,

    pub corner_radius: Option<f32>,
    pub opacity: Option<f32>,
}

impl DesignNode {
    pub fn new(id: NodeId, name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id,
            name: name.into(),
            node_type,
            fills: SmallVec::new(),
            strokes: SmallVec::new(),
            effects: SmallVec::new(),
            typography: None,
            bounds: None,
            layout: None,
            corner_radius: None,
            opacity: None,
        }
    }

    /// The first solid fill, if any. Gradients and images are not comparable.
    pub fn solid_fill(&self) -> Option<Color> {
        self.fills.iter().find_map(Paint::as_solid)
    }

    /// The first solid stroke color, if any.
    pub fn solid_stroke(&self) -> Option<Color> {
        self.strokes.iter().find_map(|s| s.paint.as_solid())
    }

    /// The solid design color a color property is compared against.
    pub fn solid_color(&self, target: ColorTarget) -> Option<Color> {
        match target {
            ColorTarget::Fill => self.solid_fill(),
            ColorTarget::Stroke => self.solid_stroke(),
        }
    }

    /// The first shadow effect, if any.
    pub fn shadow(&self) -> Option<&Effect> {
        self.effects.iter().find(|e| e.is_shadow())
    }
}

// ─── Design Tree ─────────────────────────────────────────────────────────

/// The complete design document handed to the enhancement engine.
///
/// Edges go from parent → child. The tree may be empty (no root), in which
/// case every traversal yields nothing. Nodes can only be added as fresh
/// leaves under an existing node, so ids stay unique and the graph stays a
/// tree.
#[derive(Debug, Clone, Default)]
pub struct DesignTree {
    graph: DiGraph<DesignNode, ()>,
    root: Option<NodeIndex>,
    id_index: HashMap<NodeId, NodeIndex>,
}

impl DesignTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tree holding a single root node.
    #[must_use]
    pub fn with_root(root: DesignNode) -> Self {
        Self::rooted(root).0
    }

    /// A single-node tree and the index of its root.
    pub(crate) fn rooted(root: DesignNode) -> (Self, NodeIndex) {
        let mut tree = Self::new();
        let id = root.id.clone();
        let idx = tree.graph.add_node(root);
        tree.id_index.insert(id, idx);
        tree.root = Some(idx);
        (tree, idx)
    }

    /// Add a node as the last child of `parent`. Returns the new node's index.
    ///
    /// # Errors
    /// [`DocumentError::DuplicateId`] when the id is already in the tree,
    /// [`DocumentError::UnknownParent`] when `parent` is not.
    pub fn add_node(
        &mut self,
        parent: NodeIndex,
        node: DesignNode,
    ) -> Result<NodeIndex, DocumentError> {
        if self.id_index.contains_key(&node.id) {
            return Err(DocumentError::DuplicateId {
                id: node.id.to_string(),
            });
        }
        if self.graph.node_weight(parent).is_none() {
            return Err(DocumentError::UnknownParent {
                id: node.id.to_string(),
            });
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, ());
        self.id_index.insert(id, idx);
        Ok(idx)
    }

    /// The root node index, `None` for an empty document.
    pub fn root(&self) -> Option<NodeIndex> {
        self.root
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&DesignNode> {
        self.graph.node_weight(idx)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Look up a node by its ID.
    pub fn get_by_id(&self, id: &str) -> Option<&DesignNode> {
        self.index_of(id).and_then(|idx| self.node(idx))
    }

    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.id_index.get(id).copied()
    }

    /// Get the parent index of a node.
    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph.neighbors_directed(idx, Direction::Incoming).next()
    }

    /// Get children of a node in document (insertion) order.
    ///
    /// Sorts by `NodeIndex` so the result does not depend on how `petgraph`
    /// iterates its adjacency list.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        children.sort();
        children
    }

    /// Depth-first pre-order walk from the root: parent before children,
    /// children in document order.
    pub fn walk_preorder(&self) -> Vec<NodeIndex> {
        let mut order = Vec::with_capacity(self.node_count());
        let Some(root) = self.root else {
            return order;
        };
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            order.push(idx);
            stack.extend(self.children(idx).into_iter().rev());
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, name: &str, ty: NodeType) -> DesignNode {
        DesignNode::new(NodeId::new(id), name, ty)
    }

    #[test]
    fn tree_basics() {
        let mut tree = DesignTree::with_root(node("0:1", "Page", NodeType::Frame));
        let root = tree.root().unwrap();
        let idx = tree
            .add_node(root, node("0:2", "Header", NodeType::Frame))
            .unwrap();

        assert_eq!(tree.node_count(), 2);
        assert_eq!(tree.children(root), vec![idx]);
        assert_eq!(tree.parent(idx), Some(root));
        assert_eq!(tree.get_by_id("0:2").unwrap().name, "Header");
        assert!(tree.get_by_id("0:3").is_none());
    }

    #[test]
    fn preorder_visits_parent_then_children_in_order() {
        let mut tree = DesignTree::with_root(node("p", "Page", NodeType::Frame));
        let root = tree.root().unwrap();
        let a = tree.add_node(root, node("a", "A", NodeType::Frame)).unwrap();
        tree.add_node(a, node("a1", "A1", NodeType::Text)).unwrap();
        tree.add_node(a, node("a2", "A2", NodeType::Text)).unwrap();
        tree.add_node(root, node("b", "B", NodeType::Rectangle)).unwrap();

        let names: Vec<&str> = tree
            .walk_preorder()
            .into_iter()
            .map(|i| tree.node(i).unwrap().name.as_str())
            .collect();
        assert_eq!(names, ["Page", "A", "A1", "A2", "B"]);
    }

    #[test]
    fn add_node_rejects_duplicate_ids() {
        let mut tree = DesignTree::with_root(node("d:1", "Page", NodeType::Frame));
        let root = tree.root().unwrap();
        let first = tree.add_node(root, node("d:2", "First", NodeType::Frame)).unwrap();

        let err = tree
            .add_node(root, node("d:2", "Second", NodeType::Frame))
            .unwrap_err();
        assert!(matches!(err, DocumentError::DuplicateId { ref id } if id == "d:2"));
        assert!(matches!(
            tree.add_node(root, node("d:1", "Root again", NodeType::Frame)),
            Err(DocumentError::DuplicateId { .. })
        ));

        // the rejected nodes left no trace
        assert_eq!(tree.node_count(), 2);
        assert_eq!(tree.index_of("d:2"), Some(first));
        assert_eq!(tree.get_by_id("d:2").unwrap().name, "First");
        assert_eq!(tree.walk_preorder().len(), 2);
    }

    #[test]
    fn add_node_rejects_unknown_parent() {
        let mut tree = DesignTree::new();
        let err = tree
            .add_node(NodeIndex::new(3), node("u:1", "Orphan", NodeType::Frame))
            .unwrap_err();
        assert!(matches!(err, DocumentError::UnknownParent { .. }));
        assert_eq!(tree.node_count(), 0);
    }

    #[test]
    fn color_properties_target_fill_or_stroke() {
        let mut n = node("s", "Card", NodeType::Rectangle);
        n.fills.push(Paint::Solid(Color::rgba(1.0, 1.0, 1.0, 1.0)));
        n.strokes.push(Stroke {
            paint: Paint::Solid(Color::rgba(0.0, 0.0, 0.0, 1.0)),
            weight: 1.0,
        });
        let css = |p: &str| {
            ColorTarget::of_property(p)
                .and_then(|t| n.solid_color(t))
                .map(|c| c.to_css())
        };
        assert_eq!(css("background").as_deref(), Some("rgb(255, 255, 255)"));
        assert_eq!(css("border-color").as_deref(), Some("rgb(0, 0, 0)"));
        assert_eq!(css("outline-color").as_deref(), Some("rgb(0, 0, 0)"));
        assert_eq!(css("opacity"), None);
    }

    #[test]
    fn empty_tree_walks_nothing() {
        let tree = DesignTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 0);
        assert!(tree.walk_preorder().is_empty());
    }

    #[test]
    fn color_css_forms() {
        assert_eq!(Color::rgba(0.0, 0.0, 1.0, 1.0).to_css(), "rgb(0, 0, 255)");
        assert_eq!(Color::from_hex("#F00").unwrap().to_css(), "rgb(255, 0, 0)");
        assert_eq!(
            Color::from_hex("#00000080").unwrap().to_css(),
            "rgba(0, 0, 0, 0.5)"
        );
        assert!(Color::from_hex("#12345").is_none());
    }

    #[test]
    fn solid_fill_skips_gradients() {
        let mut n = node("g", "Card", NodeType::Rectangle);
        n.fills.push(Paint::LinearGradient { stops: Vec::new() });
        assert!(n.solid_fill().is_none());
        n.fills.push(Paint::Solid(Color::rgba(1.0, 1.0, 1.0, 1.0)));
        assert_eq!(n.solid_fill().unwrap().to_css(), "rgb(255, 255, 255)");
    }
}
