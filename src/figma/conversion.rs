//! Mapping REST nodes onto [`DesignNode`] snapshots.
//!
//! The REST API reports absolute canvas boxes; snapshots carry positions
//! relative to the immediate parent.

use crate::types::{
    DesignNode, Effect, ExportSetting, FontName, NodeType, Paint, Rgb, Rgba,
    TextAlignHorizontal, TextAlignVertical, Vector2,
};

use super::api_types::{
    FigmaBoundingBox, FigmaColor, FigmaEffectData, FigmaNodeData, FigmaPaintData, FigmaTypeStyle,
};

/// Convert a REST subtree. The root keeps its absolute position.
pub fn to_design_node(root: &FigmaNodeData) -> DesignNode {
    convert(root, 0.0, 0.0)
}

fn bb_or_zero(node: &FigmaNodeData) -> FigmaBoundingBox {
    node.absolute_bounding_box.unwrap_or(FigmaBoundingBox {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    })
}

fn convert(node: &FigmaNodeData, parent_x: f64, parent_y: f64) -> DesignNode {
    let bb = bb_or_zero(node);
    let mut out = DesignNode::new(
        node.id.clone(),
        node.name.clone(),
        NodeType::from(node.node_type.as_str()),
    )
    .with_bounds(bb.x - parent_x, bb.y - parent_y, bb.width, bb.height);

    out.visible = node.visible;
    out.opacity = node.opacity.unwrap_or(1.0);
    out.fills = node.fills.iter().map(map_paint).collect();
    out.strokes = node.strokes.iter().map(map_paint).collect();
    out.stroke_weight = node.stroke_weight;
    out.corner_radius = node.corner_radius;
    out.effects = node.effects.iter().map(map_effect).collect();
    out.export_settings = node
        .export_settings
        .iter()
        .map(|s| ExportSetting {
            format: s.format.clone(),
            suffix: s.suffix.clone(),
        })
        .collect();

    if out.node_type == NodeType::Text {
        out.characters = node.characters.clone();
        if let Some(style) = &node.style {
            out.font_size = style.font_size;
            out.font_name = style.font_family.as_ref().map(|family| FontName {
                family: family.clone(),
                style: font_style(style),
            });
            out.text_align_horizontal = style
                .text_align_horizontal
                .as_deref()
                .and_then(map_align_horizontal);
            out.text_align_vertical = style
                .text_align_vertical
                .as_deref()
                .and_then(map_align_vertical);
        }
    }

    out.children = node
        .children
        .iter()
        .map(|child| convert(child, bb.x, bb.y))
        .collect();
    out
}

/// Map Figma paint data. Color alpha folds into paint opacity.
pub fn map_paint(paint: &FigmaPaintData) -> Paint {
    let alpha = paint.color.map(|c| c.a).unwrap_or(1.0);
    let opacity = paint.opacity.unwrap_or(1.0) * alpha;
    Paint {
        paint_type: paint.paint_type.clone(),
        color: paint.color.map(rgb),
        opacity: ((opacity - 1.0).abs() > f64::EPSILON).then_some(opacity),
        visible: (!paint.visible).then_some(false),
        image_hash: paint.image_ref.clone(),
    }
}

fn map_effect(effect: &FigmaEffectData) -> Effect {
    Effect {
        effect_type: effect.effect_type.clone(),
        radius: effect.radius,
        visible: effect.visible,
        color: effect.color.map(|c| Rgba {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }),
        offset: effect.offset.map(|o| Vector2 { x: o.x, y: o.y }),
    }
}

fn rgb(c: FigmaColor) -> Rgb {
    Rgb::new(c.r, c.g, c.b)
}

/// Derive a style name ("Bold", "Light Italic") from weight and slant.
pub fn font_style(style: &FigmaTypeStyle) -> String {
    let weight = match style.font_weight.unwrap_or(400.0).round() as i64 {
        i64::MIN..=149 => "Thin",
        150..=249 => "Extra Light",
        250..=349 => "Light",
        350..=449 => "Regular",
        450..=549 => "Medium",
        550..=649 => "Semi Bold",
        650..=749 => "Bold",
        750..=849 => "Extra Bold",
        _ => "Black",
    };
    match (style.italic, weight) {
        (false, w) => w.to_string(),
        (true, "Regular") => "Italic".to_string(),
        (true, w) => format!("{w} Italic"),
    }
}

fn map_align_horizontal(raw: &str) -> Option<TextAlignHorizontal> {
    match raw {
        "LEFT" => Some(TextAlignHorizontal::Left),
        "CENTER" => Some(TextAlignHorizontal::Center),
        "RIGHT" => Some(TextAlignHorizontal::Right),
        "JUSTIFIED" => Some(TextAlignHorizontal::Justified),
        _ => None,
    }
}

fn map_align_vertical(raw: &str) -> Option<TextAlignVertical> {
    match raw {
        "TOP" => Some(TextAlignVertical::Top),
        "CENTER" => Some(TextAlignVertical::Center),
        "BOTTOM" => Some(TextAlignVertical::Bottom),
        _ => None,
    }
}
