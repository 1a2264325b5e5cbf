//! Picking and rasterizing nodes that cannot be expressed as flat CUI.

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::host::Rasterizer;
use crate::naming::{sanitize_file_name, FileNameAllocator};
use crate::types::{DesignNode, ImageReference, NodeType, UrlMap};

/// Why a node is exported as a bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterReason {
    ExportSettings,
    Shape(NodeType),
    ImageFill,
    Gradient,
    RoundedRectangle,
    Effects,
}

impl fmt::Display for RasterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterReason::ExportSettings => f.write_str("explicit export settings"),
            RasterReason::Shape(t) => write!(f, "{} shape", t),
            RasterReason::ImageFill => f.write_str("image fill"),
            RasterReason::Gradient => f.write_str("gradient fill"),
            RasterReason::RoundedRectangle => f.write_str("rounded corners"),
            RasterReason::Effects => f.write_str("visible effects"),
        }
    }
}

pub fn rasterization_reason(node: &DesignNode) -> Option<RasterReason> {
    if node.node_type == NodeType::Text {
        return None;
    }
    if !node.export_settings.is_empty() {
        return Some(RasterReason::ExportSettings);
    }
    if node.node_type.is_container() {
        return None;
    }
    if node.node_type == NodeType::Vector || node.node_type.flattens_children() {
        return Some(RasterReason::Shape(node.node_type.clone()));
    }
    if node.has_visible_image_fill() {
        return Some(RasterReason::ImageFill);
    }
    if node
        .fills
        .iter()
        .any(|p| p.is_visible() && p.paint_type.is_gradient())
    {
        return Some(RasterReason::Gradient);
    }
    if node.node_type == NodeType::Rectangle && node.corner_radius.is_some_and(|r| r > 0.0) {
        return Some(RasterReason::RoundedRectangle);
    }
    if node.effects.iter().any(|e| e.visible) {
        return Some(RasterReason::Effects);
    }
    None
}

/// A node that could not be rasterized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFailure {
    pub node_id: String,
    pub node_name: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ImageBatch {
    pub images: Vec<ImageReference>,
    pub failures: Vec<ExportFailure>,
}

impl ImageBatch {
    /// Node id to asset key, for plugins that load images from disk.
    pub fn asset_keys(&self) -> UrlMap {
        self.images
            .iter()
            .map(|image| (image.node_id.clone(), image.asset_key().to_string()))
            .collect()
    }
}

/// Rasterize every node that needs it, one at a time in pre-order.
///
/// A failed export is logged and left out of the batch.
pub async fn collect_image_refs<R: Rasterizer>(
    root: &DesignNode,
    rasterizer: &R,
    scale: f64,
) -> ImageBatch {
    let mut pending = Vec::new();
    gather(root, &mut pending);

    let mut files = FileNameAllocator::new();
    let mut batch = ImageBatch::default();
    for (node, reason) in pending {
        debug!(node = %node.id, %reason, "rasterizing");
        match rasterizer.export_png(node, scale).await {
            Ok(bytes) => {
                let base = files.allocate(&sanitize_file_name(&node.name));
                batch.images.push(ImageReference {
                    node_id: node.id.clone(),
                    bytes,
                    file_name: format!("{base}.png"),
                });
            }
            Err(err) => {
                warn!(node = %node.id, name = %node.name, error = %err, "rasterization failed");
                batch.failures.push(ExportFailure {
                    node_id: node.id.clone(),
                    node_name: node.name.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }
    batch
}

fn gather<'a>(node: &'a DesignNode, out: &mut Vec<(&'a DesignNode, RasterReason)>) {
    if !node.is_rendered() {
        return;
    }
    let reason = rasterization_reason(node);
    let flattened = reason.is_some() && node.node_type.flattens_children();
    if let Some(reason) = reason {
        out.push((node, reason));
    }
    if flattened {
        return;
    }
    for child in &node.children {
        gather(child, out);
    }
}
