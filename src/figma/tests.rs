//! Tests for REST node conversion.

use crate::figma::api_types::{FigmaNodeData, FigmaNodesResponse, FigmaTypeStyle};
use crate::figma::conversion::{font_style, to_design_node};
use crate::types::{NodeType, PaintType, TextAlignHorizontal, TextAlignVertical};
use serde_json::json;

fn node(value: serde_json::Value) -> FigmaNodeData {
    serde_json::from_value(value).expect("figma node")
}

fn style(weight: f64, italic: bool) -> FigmaTypeStyle {
    FigmaTypeStyle {
        font_family: Some("Inter".to_string()),
        font_size: Some(12.0),
        font_weight: Some(weight),
        italic,
        text_align_horizontal: None,
        text_align_vertical: None,
    }
}

#[test]
fn children_get_parent_relative_positions() {
    let root = node(json!({
        "id": "1:1",
        "name": "Menu",
        "type": "FRAME",
        "absoluteBoundingBox": {"x": 100.0, "y": 50.0, "width": 400.0, "height": 300.0},
        "children": [{
            "id": "1:2",
            "name": "Panel",
            "type": "GROUP",
            "absoluteBoundingBox": {"x": 120.0, "y": 80.0, "width": 200.0, "height": 100.0},
            "children": [{
                "id": "1:3",
                "name": "Dot",
                "type": "ELLIPSE",
                "absoluteBoundingBox": {"x": 130.0, "y": 90.0, "width": 10.0, "height": 10.0}
            }]
        }]
    }));

    let snapshot = to_design_node(&root);
    assert_eq!((snapshot.x, snapshot.y), (100.0, 50.0));
    let panel = &snapshot.children[0];
    assert_eq!(panel.node_type, NodeType::Group);
    assert_eq!((panel.x, panel.y, panel.width, panel.height), (20.0, 30.0, 200.0, 100.0));
    let dot = &panel.children[0];
    assert_eq!((dot.x, dot.y), (10.0, 10.0));
    assert_eq!(snapshot.count(), 3);
}

#[test]
fn text_nodes_carry_font_and_alignment() {
    let text = node(json!({
        "id": "2:1",
        "name": "Title",
        "type": "TEXT",
        "characters": "Hello",
        "absoluteBoundingBox": {"x": 0.0, "y": 0.0, "width": 80.0, "height": 20.0},
        "style": {
            "fontFamily": "Roboto",
            "fontSize": 18.0,
            "fontWeight": 700.0,
            "textAlignHorizontal": "CENTER",
            "textAlignVertical": "BOTTOM"
        },
        "fills": [{"type": "SOLID", "color": {"r": 1.0, "g": 0.0, "b": 0.0, "a": 1.0}}]
    }));

    let snapshot = to_design_node(&text);
    assert_eq!(snapshot.characters.as_deref(), Some("Hello"));
    assert_eq!(snapshot.font_size, Some(18.0));
    let font = snapshot.font_name.expect("font");
    assert_eq!((font.family.as_str(), font.style.as_str()), ("Roboto", "Bold"));
    assert_eq!(snapshot.text_align_horizontal, Some(TextAlignHorizontal::Center));
    assert_eq!(snapshot.text_align_vertical, Some(TextAlignVertical::Bottom));
    assert_eq!(snapshot.fills[0].opacity, None);
}

#[test]
fn paints_fold_alpha_and_keep_visibility() {
    let frame = node(json!({
        "id": "3:1",
        "name": "Card",
        "type": "FRAME",
        "opacity": 0.5,
        "fills": [
            {"type": "SOLID", "opacity": 0.5, "color": {"r": 0.0, "g": 0.0, "b": 0.0, "a": 0.5}},
            {"type": "IMAGE", "imageRef": "abc", "visible": false},
            {"type": "GRADIENT_LINEAR"},
            {"type": "EMOJI"}
        ],
        "effects": [{"type": "DROP_SHADOW", "radius": 4.0, "visible": false}]
    }));

    let snapshot = to_design_node(&frame);
    assert_eq!(snapshot.opacity, 0.5);
    assert_eq!(snapshot.fills[0].opacity, Some(0.25));
    assert_eq!(snapshot.fills[1].paint_type, PaintType::Image);
    assert_eq!(snapshot.fills[1].image_hash.as_deref(), Some("abc"));
    assert!(!snapshot.fills[1].is_visible());
    assert!(snapshot.fills[2].paint_type.is_gradient());
    assert_eq!(snapshot.fills[3].paint_type, PaintType::Other);
    assert!(!snapshot.effects[0].visible);
}

#[test]
fn unknown_node_types_are_kept_verbatim() {
    let snapshot = to_design_node(&node(json!({"id": "4", "name": "S", "type": "SECTION"})));
    assert_eq!(snapshot.node_type, NodeType::Other("SECTION".to_string()));
    assert_eq!((snapshot.width, snapshot.height), (0.0, 0.0));
}

#[test]
fn font_style_names_follow_weight() {
    assert_eq!(font_style(&style(400.0, false)), "Regular");
    assert_eq!(font_style(&style(400.0, true)), "Italic");
    assert_eq!(font_style(&style(600.0, false)), "Semi Bold");
    assert_eq!(font_style(&style(300.0, true)), "Light Italic");
    assert_eq!(font_style(&style(900.0, false)), "Black");
}

#[test]
fn nodes_response_tolerates_missing_entries() {
    let response: FigmaNodesResponse =
        serde_json::from_value(json!({"nodes": {"1:1": null}})).expect("response");
    assert!(response.nodes["1:1"].is_none());
}
