//! Color flattening and text alignment mapping.
//!
//! Colors are emitted as four space separated decimals (`"r g b a"`), the
//! format the CUI runtime parses. The exact formatting is load-bearing.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{DesignNode, Paint, PaintType, TextAlignHorizontal, TextAlignVertical};

/// Fully transparent, used when a node has no fills at all.
pub const TRANSPARENT: &str = "0 0 0 0";
/// Opaque white, used for paints that cannot be flattened (gradients, images).
pub const OPAQUE_WHITE: &str = "1 1 1 1";
/// Half-transparent white, the panel color when nothing usable is painted.
pub const PANEL_FALLBACK: &str = "1 1 1 0.5";

/// The paint that determines the flattened color: the last one not hidden.
pub fn top_visible_fill(fills: &[Paint]) -> Option<&Paint> {
    fills.iter().rev().find(|p| p.is_visible())
}

/// Flatten a fill list to an `"r g b a"` string.
pub fn fill_color(fills: &[Paint]) -> String {
    if fills.is_empty() {
        return TRANSPARENT.to_string();
    }
    match top_visible_fill(fills) {
        Some(paint) => paint_color(paint),
        None => TRANSPARENT.to_string(),
    }
}

/// Color of a single paint. Non-solid paints flatten to opaque white.
pub fn paint_color(paint: &Paint) -> String {
    match (&paint.paint_type, paint.color) {
        (PaintType::Solid, Some(c)) => {
            let a = paint.opacity.unwrap_or(1.0);
            format!(
                "{} {} {} {}",
                format_channel(c.r),
                format_channel(c.g),
                format_channel(c.b),
                format_channel(a)
            )
        }
        _ => OPAQUE_WHITE.to_string(),
    }
}

/// Panel color: the flattened fill, or [`PANEL_FALLBACK`] when no fill is usable.
pub fn panel_color(node: &DesignNode) -> String {
    match top_visible_fill(&node.fills) {
        Some(paint) => paint_color(paint),
        None => PANEL_FALLBACK.to_string(),
    }
}

fn format_channel(v: f64) -> String {
    let v = if v.is_finite() { v } else { 0.0 };
    format!("{:.2}", v)
}

/// Unity `TextAnchor` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAnchor {
    UpperLeft,
    UpperCenter,
    UpperRight,
    MiddleLeft,
    MiddleCenter,
    MiddleRight,
    LowerLeft,
    LowerCenter,
    LowerRight,
}

impl TextAnchor {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAnchor::UpperLeft => "UpperLeft",
            TextAnchor::UpperCenter => "UpperCenter",
            TextAnchor::UpperRight => "UpperRight",
            TextAnchor::MiddleLeft => "MiddleLeft",
            TextAnchor::MiddleCenter => "MiddleCenter",
            TextAnchor::MiddleRight => "MiddleRight",
            TextAnchor::LowerLeft => "LowerLeft",
            TextAnchor::LowerCenter => "LowerCenter",
            TextAnchor::LowerRight => "LowerRight",
        }
    }
}

impl fmt::Display for TextAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map design-tool text alignment onto a Unity text anchor.
///
/// The vertical band comes first (`Upper`, `Middle`, `Lower`); a centered
/// horizontal axis always reads `Center`, so `(CENTER, TOP)` is `UpperCenter`.
pub fn text_anchor(
    horizontal: Option<TextAlignHorizontal>,
    vertical: Option<TextAlignVertical>,
) -> TextAnchor {
    use TextAlignHorizontal as H;
    use TextAlignVertical as V;

    match (vertical, horizontal) {
        (Some(V::Top), Some(H::Left)) => TextAnchor::UpperLeft,
        (Some(V::Top), Some(H::Right)) => TextAnchor::UpperRight,
        (Some(V::Top), _) => TextAnchor::UpperCenter,
        (Some(V::Bottom), Some(H::Left)) => TextAnchor::LowerLeft,
        (Some(V::Bottom), Some(H::Right)) => TextAnchor::LowerRight,
        (Some(V::Bottom), _) => TextAnchor::LowerCenter,
        (_, Some(H::Left)) => TextAnchor::MiddleLeft,
        (_, Some(H::Right)) => TextAnchor::MiddleRight,
        _ => TextAnchor::MiddleCenter,
    }
}
