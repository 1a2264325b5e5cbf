//! Design node snapshots.
//!
//! A [`DesignNode`] is a plain-data copy of one node in the host design tool,
//! including its whole subtree. The serializer only ever reads these
//! snapshots; live nodes are reached through [`crate::host::SceneHost`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of node kinds the generator understands.
///
/// Anything else the host reports is kept verbatim in [`NodeType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    Frame,
    Group,
    Component,
    Instance,
    Rectangle,
    Ellipse,
    Text,
    Vector,
    BooleanOperation,
    Line,
    Star,
    Polygon,
    Other(String),
}

impl NodeType {
    pub fn as_str(&self) -> &str {
        match self {
            NodeType::Frame => "FRAME",
            NodeType::Group => "GROUP",
            NodeType::Component => "COMPONENT",
            NodeType::Instance => "INSTANCE",
            NodeType::Rectangle => "RECTANGLE",
            NodeType::Ellipse => "ELLIPSE",
            NodeType::Text => "TEXT",
            NodeType::Vector => "VECTOR",
            NodeType::BooleanOperation => "BOOLEAN_OPERATION",
            NodeType::Line => "LINE",
            NodeType::Star => "STAR",
            NodeType::Polygon => "POLYGON",
            NodeType::Other(raw) => raw.as_str(),
        }
    }

    /// Frames, groups, components and instances hold children.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            NodeType::Frame | NodeType::Group | NodeType::Component | NodeType::Instance
        )
    }

    /// Shapes whose children are baked into a single raster export.
    pub fn flattens_children(&self) -> bool {
        matches!(
            self,
            NodeType::BooleanOperation | NodeType::Line | NodeType::Star | NodeType::Polygon
        )
    }
}

impl From<String> for NodeType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "FRAME" => NodeType::Frame,
            "GROUP" => NodeType::Group,
            "COMPONENT" => NodeType::Component,
            "INSTANCE" => NodeType::Instance,
            "RECTANGLE" => NodeType::Rectangle,
            "ELLIPSE" => NodeType::Ellipse,
            "TEXT" => NodeType::Text,
            "VECTOR" => NodeType::Vector,
            "BOOLEAN_OPERATION" => NodeType::BooleanOperation,
            "LINE" => NodeType::Line,
            "STAR" => NodeType::Star,
            "POLYGON" => NodeType::Polygon,
            _ => NodeType::Other(raw),
        }
    }
}

impl From<&str> for NodeType {
    fn from(raw: &str) -> Self {
        NodeType::from(raw.to_string())
    }
}

impl From<NodeType> for String {
    fn from(kind: NodeType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RGB color, each channel in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }
}

/// RGBA color used by effects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaintType {
    Solid,
    Image,
    GradientLinear,
    GradientRadial,
    GradientAngular,
    GradientDiamond,
    #[serde(other)]
    Other,
}

impl PaintType {
    pub fn is_gradient(&self) -> bool {
        matches!(
            self,
            PaintType::GradientLinear
                | PaintType::GradientRadial
                | PaintType::GradientAngular
                | PaintType::GradientDiamond
        )
    }
}

/// One entry of a fill or stroke list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paint {
    #[serde(rename = "type")]
    pub paint_type: PaintType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_hash: Option<String>,
}

impl Paint {
    pub fn solid(color: Rgb) -> Self {
        Self {
            paint_type: PaintType::Solid,
            color: Some(color),
            opacity: None,
            visible: None,
            image_hash: None,
        }
    }

    pub fn image(hash: impl Into<String>) -> Self {
        Self {
            paint_type: PaintType::Image,
            color: None,
            opacity: None,
            visible: None,
            image_hash: Some(hash.into()),
        }
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = Some(false);
        self
    }

    /// Only an explicit `visible: false` hides a paint.
    pub fn is_visible(&self) -> bool {
        self.visible != Some(false)
    }
}

/// Drop shadows, blurs and the like.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effect {
    #[serde(rename = "type")]
    pub effect_type: String,
    #[serde(default)]
    pub radius: f64,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<Vector2>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

/// An explicit export setting attached to a node in the design tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSetting {
    #[serde(default = "default_export_format")]
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontName {
    pub family: String,
    pub style: String,
}

impl FontName {
    pub fn new(family: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            style: style.into(),
        }
    }
}

impl Default for FontName {
    fn default() -> Self {
        Self::new("Inter", "Regular")
    }
}

impl fmt::Display for FontName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.family, self.style)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextAlignHorizontal {
    Left,
    Center,
    Right,
    Justified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextAlignVertical {
    Top,
    Center,
    Bottom,
}

/// A plain-data copy of a host node and its subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignNode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fills: Vec<Paint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strokes: Vec<Paint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<Effect>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub export_settings: Vec<ExportSetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characters: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_name: Option<FontName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align_horizontal: Option<TextAlignHorizontal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align_vertical: Option<TextAlignVertical>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DesignNode>,
}

impl DesignNode {
    /// A bare node with no styling; mostly useful for building trees in code.
    pub fn new(id: impl Into<String>, name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            node_type,
            visible: true,
            opacity: 1.0,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            fills: Vec::new(),
            strokes: Vec::new(),
            stroke_weight: None,
            corner_radius: None,
            effects: Vec::new(),
            export_settings: Vec::new(),
            characters: None,
            font_size: None,
            font_name: None,
            text_align_horizontal: None,
            text_align_vertical: None,
            children: Vec::new(),
        }
    }

    pub fn with_bounds(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_fill(mut self, paint: Paint) -> Self {
        self.fills.push(paint);
        self
    }

    pub fn with_child(mut self, child: DesignNode) -> Self {
        self.children.push(child);
        self
    }

    /// Hidden nodes and fully transparent nodes produce no output.
    pub fn is_rendered(&self) -> bool {
        self.visible && self.opacity > 0.0
    }

    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn has_visible_image_fill(&self) -> bool {
        self.fills
            .iter()
            .any(|f| f.paint_type == PaintType::Image && f.is_visible())
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(DesignNode::count).sum::<usize>()
    }
}

fn default_true() -> bool {
    true
}

fn default_opacity() -> f64 {
    1.0
}

fn default_export_format() -> String {
    "PNG".to_string()
}
