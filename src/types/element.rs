//! Serializer output types.
//!
//! An [`Element`] is the flattened, anchor-annotated representation of one
//! rendered design node. Elements only live for a single generation pass.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::style::TextAnchor;

/// Name used as the parent of the top-level element.
pub const ROOT_PARENT: &str = "root";

/// Mapping from node id to uploaded image URL for one generation pass.
pub type UrlMap = HashMap<String, String>;

/// How an element is rendered in the target UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Image,
    Text,
    Panel,
}

/// A bounding box expressed as fractions of the parent's size, origin bottom-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorRect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl AnchorRect {
    pub const FULL: AnchorRect = AnchorRect {
        min_x: 0.0,
        min_y: 0.0,
        max_x: 1.0,
        max_y: 1.0,
    };

    /// `"minX minY"`, the format the UI runtime expects.
    pub fn min_string(&self) -> String {
        format!("{} {}", format_fraction(self.min_x), format_fraction(self.min_y))
    }

    pub fn max_string(&self) -> String {
        format!("{} {}", format_fraction(self.max_x), format_fraction(self.max_y))
    }
}

fn format_fraction(v: f64) -> String {
    format!("{:.4}", v)
}

/// One render component attached to an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Component {
    RawImage {
        url: String,
        color: String,
    },
    Text {
        text: String,
        font_size: f64,
        color: String,
        align: TextAnchor,
    },
    Image {
        color: String,
    },
    RectTransform {
        anchor_min: String,
        anchor_max: String,
        offset_min: String,
        offset_max: String,
    },
}

impl Component {
    /// Fully qualified Unity component name, as printed in the summary.
    pub fn type_name(&self) -> &'static str {
        match self {
            Component::RawImage { .. } => "UnityEngine.UI.RawImage",
            Component::Text { .. } => "UnityEngine.UI.Text",
            Component::Image { .. } => "UnityEngine.UI.Image",
            Component::RectTransform { .. } => "RectTransform",
        }
    }

    pub fn rect_transform(anchor: &AnchorRect) -> Self {
        Component::RectTransform {
            anchor_min: anchor.min_string(),
            anchor_max: anchor.max_string(),
            offset_min: "0 0".to_string(),
            offset_max: "0 0".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub name: String,
    pub parent_name: String,
    /// Index of the parent element in the pass output, `None` for the root.
    pub parent: Option<usize>,
    pub source_id: String,
    pub source_name: String,
    pub depth: usize,
    pub kind: ElementKind,
    pub components: Vec<Component>,
    /// `None` when the live parent has zero area.
    pub anchor: Option<AnchorRect>,
}

/// A rasterized node waiting for an externally resolved URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub node_id: String,
    pub bytes: Vec<u8>,
    pub file_name: String,
}

impl ImageReference {
    /// File name without its `.png` extension.
    pub fn asset_key(&self) -> &str {
        self.file_name
            .strip_suffix(".png")
            .unwrap_or(&self.file_name)
    }
}
