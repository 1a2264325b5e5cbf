//! Design tree to UI elements.
//!
//! [`serialize_tree`] flattens a [`DesignNode`] tree into pre-ordered
//! [`Element`]s. The two text encodings are rendered from that list:
//!
//! - [`summary::render_summary`] - a comment block for debugging
//! - [`plugin::render_plugin`] - an Oxide plugin declaring CUI elements
//!
//! Image collection ([`images`]) runs before serialization so that the URL
//! map is complete when elements are classified.

pub mod images;
pub mod plugin;
pub mod summary;

use tracing::warn;

use crate::geometry::node_anchor;
use crate::naming::sanitize_name;
use crate::style::{fill_color, panel_color, text_anchor, OPAQUE_WHITE};
use crate::types::{
    AnchorRect, Component, DesignNode, Element, ElementKind, NodeType, UrlMap, ROOT_PARENT,
};

pub use images::{collect_image_refs, rasterization_reason, ExportFailure, ImageBatch, RasterReason};
pub use plugin::{render_plugin, PluginSource};
pub use summary::render_summary;

/// Font size used when a text node does not carry one.
pub const DEFAULT_FONT_SIZE: f64 = 14.0;

/// Flatten `root` into elements, parents before children.
///
/// Hidden or fully transparent nodes are dropped together with their
/// subtrees. The function holds no state between calls.
pub fn serialize_tree(root: &DesignNode, urls: &UrlMap) -> Vec<Element> {
    let mut elements = Vec::with_capacity(root.count());
    if root.is_rendered() {
        walk(root, None, None, 0, urls, &mut elements);
    }
    elements
}

fn walk(
    node: &DesignNode,
    live_parent: Option<&DesignNode>,
    parent: Option<usize>,
    depth: usize,
    urls: &UrlMap,
    out: &mut Vec<Element>,
) {
    let parent_name = match parent {
        Some(idx) => out[idx].name.clone(),
        None => ROOT_PARENT.to_string(),
    };
    let anchor = match live_parent {
        Some(p) => node_anchor(node, p),
        None => Some(AnchorRect::FULL),
    };

    let (kind, primary) = classify(node, urls);
    let mut components = vec![primary];
    if let Some(anchor) = &anchor {
        components.push(Component::rect_transform(anchor));
    }

    let index = out.len();
    out.push(Element {
        name: sanitize_name(&format!("{}_{}", parent_name, node.name)),
        parent_name,
        parent,
        source_id: node.id.clone(),
        source_name: node.name.clone(),
        depth,
        kind,
        components,
        anchor,
    });

    if kind == ElementKind::Image && node.node_type.flattens_children() {
        return;
    }
    for child in node.children.iter().filter(|c| c.is_rendered()) {
        walk(child, Some(node), Some(index), depth + 1, urls, out);
    }
}

/// Decide how a node renders. Image beats text beats panel.
pub fn classify(node: &DesignNode, urls: &UrlMap) -> (ElementKind, Component) {
    let url = urls.get(&node.id);
    if url.is_some() || node.has_visible_image_fill() {
        let url = match url {
            Some(url) => url.clone(),
            None => {
                warn!(node = %node.id, name = %node.name, "image node has no uploaded url");
                String::new()
            }
        };
        return (
            ElementKind::Image,
            Component::RawImage {
                url,
                color: OPAQUE_WHITE.to_string(),
            },
        );
    }

    if node.node_type == NodeType::Text {
        return (
            ElementKind::Text,
            Component::Text {
                text: node.characters.clone().unwrap_or_default(),
                font_size: node.font_size.unwrap_or(DEFAULT_FONT_SIZE),
                color: fill_color(&node.fills),
                align: text_anchor(node.text_align_horizontal, node.text_align_vertical),
            },
        );
    }

    (
        ElementKind::Panel,
        Component::Image {
            color: panel_color(node),
        },
    )
}
