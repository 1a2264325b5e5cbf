//! Parent-relative anchor computation.

use crate::types::{AnchorRect, DesignNode};

/// Replace NaN and infinities with zero.
pub fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Round to `digits` decimal places.
pub fn round_to(v: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    finite_or_zero((v * factor).round() / factor)
}

fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

/// Anchor rectangle of a child at `(x, y, w, h)` inside a parent of size
/// `(parent_w, parent_h)`.
///
/// The source tree has a top-left origin and the UI runtime a bottom-left
/// one, so the Y axis is flipped. Returns `None` for a zero-area parent.
pub fn anchor_rect(
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    parent_w: f64,
    parent_h: f64,
) -> Option<AnchorRect> {
    if !(parent_w > 0.0 && parent_h > 0.0) {
        return None;
    }

    let min_x = x / parent_w;
    let max_x = (x + w) / parent_w;
    let min_y = (parent_h - (y + h)) / parent_h;
    let max_y = (parent_h - y) / parent_h;

    Some(AnchorRect {
        min_x: round_to(clamp01(min_x), 4),
        min_y: round_to(clamp01(min_y), 4),
        max_x: round_to(clamp01(max_x), 4),
        max_y: round_to(clamp01(max_y), 4),
    })
}

/// Anchor of `child` relative to its live `parent`.
pub fn node_anchor(child: &DesignNode, parent: &DesignNode) -> Option<AnchorRect> {
    anchor_rect(
        child.x,
        child.y,
        child.width,
        child.height,
        parent.width,
        parent.height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn child_rectangle_in_wide_frame() {
        let anchor = anchor_rect(10.0, 10.0, 40.0, 20.0, 200.0, 100.0).expect("anchor");
        assert!(approx(anchor.min_x, 0.05));
        assert!(approx(anchor.max_x, 0.25));
        assert!(approx(anchor.min_y, 0.70));
        assert!(approx(anchor.max_y, 0.90));
    }

    #[test]
    fn zero_area_parent_has_no_anchor() {
        assert!(anchor_rect(0.0, 0.0, 10.0, 10.0, 0.0, 100.0).is_none());
        assert!(anchor_rect(0.0, 0.0, 10.0, 10.0, 100.0, 0.0).is_none());
        assert!(anchor_rect(0.0, 0.0, 10.0, 10.0, f64::NAN, 100.0).is_none());
    }

    #[test]
    fn overflowing_child_is_clamped_into_unit_square() {
        let anchor = anchor_rect(-20.0, 90.0, 300.0, 40.0, 200.0, 100.0).expect("anchor");
        assert!(0.0 <= anchor.min_x && anchor.min_x <= anchor.max_x && anchor.max_x <= 1.0);
        assert!(0.0 <= anchor.min_y && anchor.min_y <= anchor.max_y && anchor.max_y <= 1.0);
        assert!(approx(anchor.min_y, 0.0));
    }

    #[test]
    fn rounding_keeps_four_digits() {
        let anchor = anchor_rect(1.0, 0.0, 1.0, 3.0, 3.0, 3.0).expect("anchor");
        assert!(approx(anchor.min_x, 0.3333));
        assert!(approx(anchor.max_x, 0.6667));
    }

    #[test]
    fn finite_or_zero_scrubs_non_finite() {
        assert_eq!(finite_or_zero(f64::INFINITY), 0.0);
        assert_eq!(finite_or_zero(f64::NAN), 0.0);
        assert_eq!(finite_or_zero(1.5), 1.5);
    }
}
