//! JSON document to live scene nodes.
//!
//! The input is deliberately loosely typed: every node is decoded on its own,
//! so one malformed subtree is removed and skipped while its siblings and
//! ancestors are still built.

pub mod fonts;

use futures::future::{FutureExt, LocalBoxFuture};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{CuiError, Result};
use crate::geometry::finite_or_zero;
use crate::host::{NodeHandle, SceneHost, ShapeKind};
use crate::types::{
    Effect, FontName, NodeType, Paint, PaintType, Rgb, Rgba, TextAlignHorizontal,
    TextAlignVertical, Vector2,
};

pub use fonts::FontCache;

/// Fill used in place of image paints, which cannot be restored from JSON.
pub const IMAGE_PLACEHOLDER: Rgb = Rgb::new(0.8, 0.8, 0.8);
pub const EFFECT_COLOR: Rgba = Rgba {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 0.25,
};
pub const EFFECT_OFFSET: Vector2 = Vector2 { x: 0.0, y: 4.0 };

/// Type given to nodes whose `type` is missing or not a string.
pub const UNKNOWN_TYPE: &str = "UNKNOWN";

/// One node of the input document, without its children.
///
/// Fields are decoded one at a time. A field with the wrong JSON type is
/// dropped and listed in `invalid`; it never invalidates the node.
#[derive(Debug, Clone)]
pub struct SourceNode {
    pub node_type: NodeType,
    pub name: Option<String>,
    pub visible: Option<bool>,
    pub opacity: Option<f64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub fills: Option<Vec<Value>>,
    pub strokes: Option<Vec<Value>>,
    pub stroke_weight: Option<f64>,
    pub corner_radius: Option<f64>,
    pub effects: Option<Vec<Value>>,
    pub characters: Option<String>,
    pub font_size: Option<f64>,
    pub font_name: Option<FontName>,
    pub text_align_horizontal: Option<TextAlignHorizontal>,
    pub text_align_vertical: Option<TextAlignVertical>,
    /// Keys present in the input but not usable.
    pub invalid: Vec<&'static str>,
}

impl SourceNode {
    /// Decode `value`. Only a non-object value is an error.
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| CuiError::deserialize("node is not a JSON object"))?;
        let mut fields = Fields {
            obj,
            invalid: Vec::new(),
        };

        let node_type = match obj.get("type") {
            Some(Value::String(raw)) => NodeType::from(raw.as_str()),
            Some(_) => {
                fields.invalid.push("type");
                NodeType::Other(UNKNOWN_TYPE.to_string())
            }
            None => NodeType::Other(UNKNOWN_TYPE.to_string()),
        };

        Ok(Self {
            node_type,
            name: fields.get("name"),
            visible: fields.get("visible"),
            opacity: fields.get("opacity"),
            x: fields.get("x"),
            y: fields.get("y"),
            width: fields.get("width"),
            height: fields.get("height"),
            fills: fields.get("fills"),
            strokes: fields.get("strokes"),
            stroke_weight: fields.get("strokeWeight"),
            corner_radius: fields.get("cornerRadius"),
            effects: fields.get("effects"),
            characters: fields.get("characters"),
            font_size: fields.get("fontSize"),
            font_name: fields.get("fontName"),
            text_align_horizontal: fields.get("textAlignHorizontal"),
            text_align_vertical: fields.get("textAlignVertical"),
            invalid: fields.invalid,
        })
    }

    /// Host name for a placeholder standing in for an unsupported type.
    fn placeholder_name(&self) -> String {
        match self.name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => format!("{}: {}", self.node_type, name),
            None => self.node_type.to_string(),
        }
    }
}

struct Fields<'a> {
    obj: &'a Map<String, Value>,
    invalid: Vec<&'static str>,
}

impl Fields<'_> {
    /// `None` when `key` is absent or null, or when it does not decode as `T`.
    fn get<T: DeserializeOwned>(&mut self, key: &'static str) -> Option<T> {
        let value = self.obj.get(key).filter(|v| !v.is_null())?;
        match T::deserialize(value) {
            Ok(v) => Some(v),
            Err(_) => {
                self.invalid.push(key);
                None
            }
        }
    }
}

/// How a source type is realized in the host, and whether it is a stand-in.
pub fn shape_for(node_type: &NodeType) -> (ShapeKind, bool) {
    match node_type {
        NodeType::Frame | NodeType::Group => (ShapeKind::Frame, false),
        NodeType::Rectangle => (ShapeKind::Rectangle, false),
        NodeType::Ellipse => (ShapeKind::Ellipse, false),
        NodeType::Text => (ShapeKind::Text, false),
        _ => (ShapeKind::Rectangle, true),
    }
}

/// A subtree that was left out of the reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedNode {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub root: NodeHandle,
    pub name: String,
    /// Live nodes in the reconstructed tree.
    pub node_count: usize,
    pub skipped: Vec<SkippedNode>,
}

/// Build the tree described by `data` and return its detached root.
///
/// `data` may also be a string holding the JSON document.
pub async fn build_tree<H: SceneHost>(
    host: &mut H,
    fonts: &mut FontCache,
    data: &Value,
    default_font: &FontName,
) -> Result<BuildReport> {
    let parsed;
    let data = match data {
        Value::String(raw) => {
            parsed = serde_json::from_str::<Value>(raw)?;
            &parsed
        }
        other => other,
    };

    let mut builder = TreeBuilder {
        host: &mut *host,
        fonts: &mut *fonts,
        default_font,
        skipped: Vec::new(),
    };
    let root = builder
        .build_node(data, "root".to_string())
        .await
        .map_err(|e| match e {
            CuiError::Deserialize(msg) => CuiError::deserialize(format!("root: {msg}")),
            other => other,
        })?;

    let skipped = builder.skipped;
    let snapshot = host.snapshot(root)?;
    Ok(BuildReport {
        root,
        name: snapshot.name.clone(),
        node_count: snapshot.count(),
        skipped,
    })
}

struct TreeBuilder<'h, H> {
    host: &'h mut H,
    fonts: &'h mut FontCache,
    default_font: &'h FontName,
    skipped: Vec<SkippedNode>,
}

impl<'h, H: SceneHost + 'h> TreeBuilder<'h, H> {
    fn build_node<'s>(
        &'s mut self,
        value: &'s Value,
        path: String,
    ) -> LocalBoxFuture<'s, Result<NodeHandle>>
    where
        'h: 's,
        H: 's,
    {
        async move {
            let source = SourceNode::from_value(value)?;
            for field in &source.invalid {
                warn!(%path, field, "ignoring malformed field");
            }
            let (kind, placeholder) = shape_for(&source.node_type);
            let node = self.host.create_node(kind).ok_or_else(|| {
                CuiError::deserialize(format!("host could not create a {} node", source.node_type))
            })?;

            match self.populate(node, kind, placeholder, &source, value, &path).await {
                Ok(()) => Ok(node),
                Err(err) => {
                    self.host.remove(node);
                    Err(err)
                }
            }
        }
        .boxed_local()
    }

    async fn populate(
        &mut self,
        node: NodeHandle,
        kind: ShapeKind,
        placeholder: bool,
        source: &SourceNode,
        value: &Value,
        path: &str,
    ) -> Result<()> {
        let host = &mut *self.host;

        if placeholder {
            host.set_name(node, &source.placeholder_name())?;
        } else if let Some(name) = &source.name {
            host.set_name(node, name)?;
        }
        if let Some(visible) = source.visible {
            host.set_visible(node, visible)?;
        }
        if let Some(opacity) = source.opacity {
            host.set_opacity(node, finite_or_zero(opacity))?;
        }

        if let (Some(w), Some(h)) = (source.width, source.height) {
            host.resize(node, finite_or_zero(w).max(0.0), finite_or_zero(h).max(0.0))?;
        }
        if let (Some(x), Some(y)) = (source.x, source.y) {
            host.set_position(node, finite_or_zero(x), finite_or_zero(y))?;
        }

        if source.node_type == NodeType::Group {
            host.set_fills(node, Vec::new())?;
        } else if let Some(fills) = &source.fills {
            host.set_fills(node, fills.iter().filter_map(map_fill).collect())?;
        }

        if let Some(strokes) = &source.strokes {
            let strokes: Vec<Paint> = strokes.iter().filter_map(map_stroke).collect();
            let has_stroke = !strokes.is_empty();
            host.set_strokes(node, strokes)?;
            if let (true, Some(weight)) = (has_stroke, source.stroke_weight) {
                host.set_stroke_weight(node, finite_or_zero(weight))?;
            }
        }

        if let Some(radius) = source.corner_radius {
            if host.supports_corner_radius(node) {
                host.set_corner_radius(node, finite_or_zero(radius))?;
            }
        }

        if let Some(effects) = &source.effects {
            host.set_effects(node, effects.iter().filter_map(map_effect).collect())?;
        }

        if kind == ShapeKind::Text {
            let requested = source
                .font_name
                .clone()
                .unwrap_or_else(|| self.default_font.clone());
            let font = self
                .fonts
                .resolve(&mut *self.host, &requested, self.default_font)
                .await?;
            let host = &mut *self.host;
            host.set_font(node, &font)?;
            if let Some(size) = source.font_size.filter(|s| s.is_finite() && *s > 0.0) {
                host.set_font_size(node, size)?;
            }
            if source.text_align_horizontal.is_some() || source.text_align_vertical.is_some() {
                host.set_text_align(
                    node,
                    source.text_align_horizontal,
                    source.text_align_vertical,
                )?;
            }
            host.set_characters(node, source.characters.as_deref().unwrap_or_default())?;
        }

        if kind == ShapeKind::Frame {
            let children = value
                .get("children")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for (i, child) in children.iter().enumerate() {
                let child_path = format!("{path}/{i}");
                match self.build_node(child, child_path.clone()).await {
                    Ok(handle) => {
                        if let Err(err) = self.host.append_child(node, handle) {
                            self.host.remove(handle);
                            self.skip(child_path, err.to_string());
                        }
                    }
                    Err(err) => self.skip(child_path, err.to_string()),
                }
            }
        }

        debug!(%path, %node, "node built");
        Ok(())
    }

    fn skip(&mut self, path: String, reason: String) {
        warn!(%path, %reason, "skipping node");
        self.skipped.push(SkippedNode { path, reason });
    }
}

fn map_fill(value: &Value) -> Option<Paint> {
    let paint = Paint::deserialize(value).ok()?;
    match paint.paint_type {
        PaintType::Solid => solid_copy(paint),
        PaintType::Image => Some(Paint {
            paint_type: PaintType::Solid,
            color: Some(IMAGE_PLACEHOLDER),
            opacity: Some(1.0),
            visible: paint.visible,
            image_hash: None,
        }),
        _ => None,
    }
}

fn map_stroke(value: &Value) -> Option<Paint> {
    let paint = Paint::deserialize(value).ok()?;
    match paint.paint_type {
        PaintType::Solid => solid_copy(paint),
        _ => None,
    }
}

fn solid_copy(paint: Paint) -> Option<Paint> {
    let color = paint.color?;
    Some(Paint {
        paint_type: PaintType::Solid,
        color: Some(color),
        opacity: Some(paint.opacity.map(finite_or_zero).unwrap_or(1.0)),
        visible: paint.visible,
        image_hash: None,
    })
}

fn map_effect(value: &Value) -> Option<Effect> {
    let effect = Effect::deserialize(value).ok()?;
    Some(Effect {
        effect_type: effect.effect_type,
        radius: finite_or_zero(effect.radius),
        visible: effect.visible,
        color: Some(EFFECT_COLOR),
        offset: Some(EFFECT_OFFSET),
    })
}
