//! In-memory scene graph and a flat-color rasterizer.
//!
//! [`MemoryScene`] behaves like the design tool's scripting API closely
//! enough to drive the deserializer and the session outside the host: text
//! cannot be edited before its font is loaded, only frames hold children, and
//! creation can be refused.

use std::collections::HashSet;
use std::io::Cursor;

use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};

use super::{HostError, HostResult, NodeHandle, Rasterizer, SceneHost, ShapeKind};
use crate::style::top_visible_fill;
use crate::types::{
    DesignNode, Effect, ExportSetting, FontName, NodeType, Paint, PaintType, TextAlignHorizontal,
    TextAlignVertical,
};

/// Largest raster edge the flat rasterizer will produce.
const MAX_RASTER_EDGE: u32 = 8192;

#[derive(Debug, Clone)]
struct SceneNode {
    id: String,
    node_type: NodeType,
    name: String,
    visible: bool,
    opacity: f64,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    fills: Vec<Paint>,
    strokes: Vec<Paint>,
    stroke_weight: Option<f64>,
    corner_radius: Option<f64>,
    effects: Vec<Effect>,
    export_settings: Vec<ExportSetting>,
    font: Option<FontName>,
    font_size: Option<f64>,
    align_h: Option<TextAlignHorizontal>,
    align_v: Option<TextAlignVertical>,
    characters: Option<String>,
    children: Vec<usize>,
    parent: Option<usize>,
    removed: bool,
}

impl SceneNode {
    fn blank(id: String, node_type: NodeType) -> Self {
        let (width, height) = match node_type {
            NodeType::Text => (0.0, 0.0),
            _ => (100.0, 100.0),
        };
        let is_text = node_type == NodeType::Text;
        Self {
            id,
            name: node_type.as_str().to_string(),
            node_type,
            visible: true,
            opacity: 1.0,
            x: 0.0,
            y: 0.0,
            width,
            height,
            fills: Vec::new(),
            strokes: Vec::new(),
            stroke_weight: None,
            corner_radius: None,
            effects: Vec::new(),
            export_settings: Vec::new(),
            font: is_text.then(FontName::default),
            font_size: None,
            align_h: None,
            align_v: None,
            characters: is_text.then(String::new),
            children: Vec::new(),
            parent: None,
            removed: false,
        }
    }

    fn shape_kind(&self) -> ShapeKind {
        shape_kind_of(&self.node_type)
    }
}

fn shape_kind_of(node_type: &NodeType) -> ShapeKind {
    match node_type {
        t if t.is_container() => ShapeKind::Frame,
        NodeType::Text => ShapeKind::Text,
        NodeType::Ellipse => ShapeKind::Ellipse,
        _ => ShapeKind::Rectangle,
    }
}

/// An arena-backed scene graph implementing [`SceneHost`].
#[derive(Debug, Default)]
pub struct MemoryScene {
    nodes: Vec<SceneNode>,
    page: Vec<usize>,
    selection: Option<usize>,
    loaded_fonts: HashSet<FontName>,
    unavailable_fonts: HashSet<FontName>,
    refused_kinds: HashSet<ShapeKind>,
    font_loads: usize,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scene from a snapshot, place it on the page and select it.
    pub fn from_snapshot(root: &DesignNode) -> (Self, NodeHandle) {
        let mut scene = Self::new();
        let handle = scene.import(root, None);
        scene.page.push(handle.0);
        scene.selection = Some(handle.0);
        (scene, handle)
    }

    fn import(&mut self, node: &DesignNode, parent: Option<usize>) -> NodeHandle {
        let idx = self.nodes.len();
        let mut scene_node = SceneNode::blank(node.id.clone(), node.node_type.clone());
        scene_node.name = node.name.clone();
        scene_node.visible = node.visible;
        scene_node.opacity = node.opacity;
        scene_node.x = node.x;
        scene_node.y = node.y;
        scene_node.width = node.width;
        scene_node.height = node.height;
        scene_node.fills = node.fills.clone();
        scene_node.strokes = node.strokes.clone();
        scene_node.stroke_weight = node.stroke_weight;
        scene_node.corner_radius = node.corner_radius;
        scene_node.effects = node.effects.clone();
        scene_node.export_settings = node.export_settings.clone();
        scene_node.font = node.font_name.clone().or(scene_node.font);
        scene_node.font_size = node.font_size;
        scene_node.align_h = node.text_align_horizontal;
        scene_node.align_v = node.text_align_vertical;
        scene_node.characters = node.characters.clone().or(scene_node.characters);
        scene_node.parent = parent;
        self.nodes.push(scene_node);

        for child in &node.children {
            let child_handle = self.import(child, Some(idx));
            self.nodes[idx].children.push(child_handle.0);
        }
        NodeHandle(idx)
    }

    /// Make `kind` creation fail, as a host does for unsupported primitives.
    pub fn refuse(&mut self, kind: ShapeKind) {
        self.refused_kinds.insert(kind);
    }

    pub fn mark_font_unavailable(&mut self, font: FontName) {
        self.unavailable_fonts.insert(font);
    }

    /// How many times `load_font` reached the host.
    pub fn font_loads(&self) -> usize {
        self.font_loads
    }

    pub fn select(&mut self, node: NodeHandle) {
        self.selection = Some(node.0);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Top-level nodes on the page, in insertion order.
    pub fn page_nodes(&self) -> Vec<NodeHandle> {
        self.page
            .iter()
            .copied()
            .filter(|&i| !self.nodes[i].removed)
            .map(NodeHandle)
            .collect()
    }

    /// Live (not removed) node count.
    pub fn live_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.removed).count()
    }

    pub fn characters(&self, node: NodeHandle) -> HostResult<Option<String>> {
        Ok(self.get(node)?.characters.clone())
    }

    pub fn font_of(&self, node: NodeHandle) -> HostResult<Option<FontName>> {
        Ok(self.get(node)?.font.clone())
    }

    fn get(&self, node: NodeHandle) -> HostResult<&SceneNode> {
        self.nodes
            .get(node.0)
            .filter(|n| !n.removed)
            .ok_or_else(|| HostError::UnknownNode(node.to_string()))
    }

    fn get_mut(&mut self, node: NodeHandle) -> HostResult<&mut SceneNode> {
        self.nodes
            .get_mut(node.0)
            .filter(|n| !n.removed)
            .ok_or_else(|| HostError::UnknownNode(node.to_string()))
    }

    fn detach(&mut self, idx: usize) {
        if let Some(parent) = self.nodes[idx].parent.take() {
            self.nodes[parent].children.retain(|&c| c != idx);
        }
        self.page.retain(|&p| p != idx);
    }

    fn build_snapshot(&self, idx: usize) -> DesignNode {
        let n = &self.nodes[idx];
        DesignNode {
            id: n.id.clone(),
            name: n.name.clone(),
            node_type: n.node_type.clone(),
            visible: n.visible,
            opacity: n.opacity,
            x: n.x,
            y: n.y,
            width: n.width,
            height: n.height,
            fills: n.fills.clone(),
            strokes: n.strokes.clone(),
            stroke_weight: n.stroke_weight,
            corner_radius: n.corner_radius,
            effects: n.effects.clone(),
            export_settings: n.export_settings.clone(),
            characters: n.characters.clone(),
            font_size: n.font_size,
            font_name: n.font.clone(),
            text_align_horizontal: n.align_h,
            text_align_vertical: n.align_v,
            children: n
                .children
                .iter()
                .filter(|&&c| !self.nodes[c].removed)
                .map(|&c| self.build_snapshot(c))
                .collect(),
        }
    }

    fn require_text(&self, node: NodeHandle) -> HostResult<()> {
        match self.get(node)?.shape_kind() {
            ShapeKind::Text => Ok(()),
            _ => Err(HostError::UnknownNode(format!("{node} is not a text node"))),
        }
    }
}

impl SceneHost for MemoryScene {
    fn create_node(&mut self, kind: ShapeKind) -> Option<NodeHandle> {
        if self.refused_kinds.contains(&kind) {
            return None;
        }
        let node_type = match kind {
            ShapeKind::Frame => NodeType::Frame,
            ShapeKind::Rectangle => NodeType::Rectangle,
            ShapeKind::Ellipse => NodeType::Ellipse,
            ShapeKind::Text => NodeType::Text,
        };
        let idx = self.nodes.len();
        let mut node = SceneNode::blank(format!("mem:{idx}"), node_type);
        if kind == ShapeKind::Frame {
            node.fills = vec![Paint::solid(crate::types::Rgb::new(1.0, 1.0, 1.0))];
        }
        self.nodes.push(node);
        Some(NodeHandle(idx))
    }

    fn kind_of(&self, node: NodeHandle) -> HostResult<ShapeKind> {
        Ok(self.get(node)?.shape_kind())
    }

    fn set_name(&mut self, node: NodeHandle, name: &str) -> HostResult<()> {
        self.get_mut(node)?.name = name.to_string();
        Ok(())
    }

    fn set_visible(&mut self, node: NodeHandle, visible: bool) -> HostResult<()> {
        self.get_mut(node)?.visible = visible;
        Ok(())
    }

    fn set_opacity(&mut self, node: NodeHandle, opacity: f64) -> HostResult<()> {
        self.get_mut(node)?.opacity = opacity.clamp(0.0, 1.0);
        Ok(())
    }

    fn resize(&mut self, node: NodeHandle, width: f64, height: f64) -> HostResult<()> {
        if !(width.is_finite() && height.is_finite()) || width < 0.0 || height < 0.0 {
            return Err(HostError::InvalidSize { width, height });
        }
        let n = self.get_mut(node)?;
        n.width = width;
        n.height = height;
        Ok(())
    }

    fn set_position(&mut self, node: NodeHandle, x: f64, y: f64) -> HostResult<()> {
        let n = self.get_mut(node)?;
        n.x = x;
        n.y = y;
        Ok(())
    }

    fn set_fills(&mut self, node: NodeHandle, fills: Vec<Paint>) -> HostResult<()> {
        self.get_mut(node)?.fills = fills;
        Ok(())
    }

    fn set_strokes(&mut self, node: NodeHandle, strokes: Vec<Paint>) -> HostResult<()> {
        self.get_mut(node)?.strokes = strokes;
        Ok(())
    }

    fn set_stroke_weight(&mut self, node: NodeHandle, weight: f64) -> HostResult<()> {
        self.get_mut(node)?.stroke_weight = Some(weight);
        Ok(())
    }

    fn supports_corner_radius(&self, node: NodeHandle) -> bool {
        matches!(
            self.get(node).map(SceneNode::shape_kind),
            Ok(ShapeKind::Frame | ShapeKind::Rectangle)
        )
    }

    fn set_corner_radius(&mut self, node: NodeHandle, radius: f64) -> HostResult<()> {
        self.get_mut(node)?.corner_radius = Some(radius);
        Ok(())
    }

    fn set_effects(&mut self, node: NodeHandle, effects: Vec<Effect>) -> HostResult<()> {
        self.get_mut(node)?.effects = effects;
        Ok(())
    }

    async fn load_font(&mut self, font: &FontName) -> HostResult<()> {
        self.font_loads += 1;
        tokio::task::yield_now().await;
        if self.unavailable_fonts.contains(font) {
            return Err(HostError::FontUnavailable(font.to_string()));
        }
        self.loaded_fonts.insert(font.clone());
        Ok(())
    }

    fn set_font(&mut self, node: NodeHandle, font: &FontName) -> HostResult<()> {
        self.require_text(node)?;
        if !self.loaded_fonts.contains(font) {
            return Err(HostError::FontNotLoaded(font.to_string()));
        }
        self.get_mut(node)?.font = Some(font.clone());
        Ok(())
    }

    fn set_font_size(&mut self, node: NodeHandle, size: f64) -> HostResult<()> {
        self.require_text(node)?;
        self.get_mut(node)?.font_size = Some(size);
        Ok(())
    }

    fn set_text_align(
        &mut self,
        node: NodeHandle,
        horizontal: Option<TextAlignHorizontal>,
        vertical: Option<TextAlignVertical>,
    ) -> HostResult<()> {
        self.require_text(node)?;
        let n = self.get_mut(node)?;
        n.align_h = horizontal.or(n.align_h);
        n.align_v = vertical.or(n.align_v);
        Ok(())
    }

    fn set_characters(&mut self, node: NodeHandle, characters: &str) -> HostResult<()> {
        self.require_text(node)?;
        let font = self.get(node)?.font.clone().unwrap_or_default();
        if !self.loaded_fonts.contains(&font) {
            return Err(HostError::FontNotLoaded(font.to_string()));
        }
        self.get_mut(node)?.characters = Some(characters.to_string());
        Ok(())
    }

    fn append_child(&mut self, parent: NodeHandle, child: NodeHandle) -> HostResult<()> {
        if self.get(parent)?.shape_kind() != ShapeKind::Frame {
            return Err(HostError::NotAContainer(parent.to_string()));
        }
        self.get(child)?;
        self.detach(child.0);
        self.nodes[child.0].parent = Some(parent.0);
        self.nodes[parent.0].children.push(child.0);
        Ok(())
    }

    fn remove(&mut self, node: NodeHandle) {
        if self.get(node).is_err() {
            return;
        }
        self.detach(node.0);
        let mut stack = vec![node.0];
        while let Some(idx) = stack.pop() {
            self.nodes[idx].removed = true;
            stack.extend(self.nodes[idx].children.iter().copied());
        }
        if self.selection == Some(node.0) {
            self.selection = None;
        }
    }

    fn append_to_page(&mut self, node: NodeHandle) -> HostResult<()> {
        self.get(node)?;
        self.detach(node.0);
        self.page.push(node.0);
        Ok(())
    }

    fn selection(&self) -> Option<DesignNode> {
        self.selection
            .filter(|&i| !self.nodes[i].removed)
            .map(|i| self.build_snapshot(i))
    }

    fn snapshot(&self, node: NodeHandle) -> HostResult<DesignNode> {
        self.get(node)?;
        Ok(self.build_snapshot(node.0))
    }
}

/// Rasterizes a node as a single flat rectangle of its top visible fill.
///
/// Image fills have no pixel data outside the host, so they render as the
/// same light gray the deserializer uses for image placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatRasterizer;

impl FlatRasterizer {
    fn pixel_for(node: &DesignNode) -> Rgba<u8> {
        let to_u8 = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        match top_visible_fill(&node.fills) {
            Some(paint) => match (&paint.paint_type, paint.color) {
                (PaintType::Solid, Some(c)) => Rgba([
                    to_u8(c.r),
                    to_u8(c.g),
                    to_u8(c.b),
                    to_u8(paint.opacity.unwrap_or(1.0) * node.opacity),
                ]),
                (PaintType::Image, _) => Rgba([204, 204, 204, to_u8(node.opacity)]),
                _ => Rgba([255, 255, 255, to_u8(node.opacity)]),
            },
            None => Rgba([0, 0, 0, 0]),
        }
    }
}

impl Rasterizer for FlatRasterizer {
    async fn export_png(&self, node: &DesignNode, scale: f64) -> HostResult<Vec<u8>> {
        let export_err = |reason: String| HostError::Export {
            node: node.id.clone(),
            reason,
        };

        let width = (node.width * scale).round();
        let height = (node.height * scale).round();
        if !(width >= 1.0 && height >= 1.0) {
            return Err(export_err(format!(
                "raster size {}x{} is empty",
                width, height
            )));
        }
        let (width, height) = (width as u32, height as u32);
        if width > MAX_RASTER_EDGE || height > MAX_RASTER_EDGE {
            return Err(export_err(format!(
                "raster size {width}x{height} exceeds {MAX_RASTER_EDGE}px"
            )));
        }

        let img = RgbaImage::from_pixel(width, height, Self::pixel_for(node));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .map_err(|e| export_err(e.to_string()))?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rgb;

    fn sample_tree() -> DesignNode {
        DesignNode::new("1:1", "Menu", NodeType::Frame)
            .with_bounds(0.0, 0.0, 200.0, 100.0)
            .with_child(
                DesignNode::new("1:2", "Play", NodeType::Rectangle)
                    .with_bounds(10.0, 10.0, 40.0, 20.0)
                    .with_fill(Paint::solid(Rgb::new(1.0, 0.0, 0.0))),
            )
    }

    #[test]
    fn snapshot_round_trips_imported_tree() {
        let tree = sample_tree();
        let (scene, root) = MemoryScene::from_snapshot(&tree);
        assert_eq!(scene.snapshot(root).expect("snapshot"), tree);
        assert_eq!(scene.selection().expect("selection").id, "1:1");
    }

    #[tokio::test]
    async fn characters_require_loaded_font() {
        let mut scene = MemoryScene::new();
        let text = scene.create_node(ShapeKind::Text).expect("text node");
        assert!(matches!(
            scene.set_characters(text, "hi"),
            Err(HostError::FontNotLoaded(_))
        ));
        scene.load_font(&FontName::default()).await.expect("load font");
        scene.set_characters(text, "hi").expect("set characters");
        assert_eq!(scene.characters(text).expect("chars").as_deref(), Some("hi"));
    }

    #[test]
    fn only_frames_hold_children() {
        let mut scene = MemoryScene::new();
        let rect = scene.create_node(ShapeKind::Rectangle).expect("rect");
        let other = scene.create_node(ShapeKind::Ellipse).expect("ellipse");
        assert!(matches!(
            scene.append_child(rect, other),
            Err(HostError::NotAContainer(_))
        ));
    }

    #[test]
    fn remove_drops_subtree() {
        let (mut scene, root) = MemoryScene::from_snapshot(&sample_tree());
        assert_eq!(scene.live_count(), 2);
        scene.remove(root);
        assert_eq!(scene.live_count(), 0);
        assert!(scene.selection().is_none());
        assert!(scene.page_nodes().is_empty());
    }

    #[test]
    fn refused_kinds_are_not_created() {
        let mut scene = MemoryScene::new();
        scene.refuse(ShapeKind::Ellipse);
        assert!(scene.create_node(ShapeKind::Ellipse).is_none());
        assert!(scene.create_node(ShapeKind::Rectangle).is_some());
    }

    #[tokio::test]
    async fn flat_rasterizer_scales_and_encodes_png() {
        let node = sample_tree().children.remove(0);
        let bytes = FlatRasterizer.export_png(&node, 2.0).await.expect("png");
        let decoded = image::load_from_memory(&bytes).expect("decode png");
        assert_eq!(decoded.width(), 80);
        assert_eq!(decoded.height(), 40);
        assert_eq!(decoded.to_rgba8().get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
    }

    #[tokio::test]
    async fn flat_rasterizer_rejects_empty_nodes() {
        let node = DesignNode::new("9", "line", NodeType::Line).with_bounds(0.0, 0.0, 10.0, 0.0);
        let result = FlatRasterizer.export_png(&node, 2.0).await;
        assert!(matches!(result, Err(HostError::Export { .. })));
    }
}
