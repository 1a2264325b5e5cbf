use figcui_lib::types::TextAlignHorizontal;
use figcui_lib::{
    run_import, serialize_tree, CuiError, DesignNode, MemoryScene, NodeType, SceneHost,
    SessionSettings, UrlMap,
};
use serde_json::json;

fn document() -> serde_json::Value {
    json!({
        "type": "FRAME", "name": "Menu", "x": 0, "y": 0, "width": 200, "height": 100,
        "fills": [{"type": "SOLID", "color": {"r": 0.1, "g": 0.2, "b": 0.3}}],
        "children": [
            {
                "type": "RECTANGLE", "name": "Button", "x": 10, "y": 10, "width": 40, "height": 20,
                "fills": [{"type": "SOLID", "color": {"r": 1, "g": 0, "b": 0}, "opacity": 0.5}]
            },
            {
                "type": "TEXT", "name": "Title", "x": 60, "y": 10, "width": 100, "height": 20,
                "characters": "Play", "fontSize": 18, "textAlignHorizontal": "LEFT"
            },
            {"type": "CIRCLE", "name": "Dot", "x": 5, "y": 70, "width": 10, "height": 10},
            {
                "type": "GROUP", "name": "Row", "x": 0, "y": 50, "width": 200, "height": 20,
                "children": [{"type": "ELLIPSE", "name": "Bullet", "x": 2, "y": 2, "width": 4, "height": 4}]
            }
        ]
    })
}

async fn import(data: serde_json::Value) -> (figcui_lib::Import, DesignNode) {
    let (loaded, scene) = run_import(MemoryScene::new(), data, SessionSettings::default())
        .await
        .expect("import");
    let root = *scene.page_nodes().last().expect("root on page");
    let snapshot = scene.snapshot(root).expect("snapshot");
    (loaded, snapshot)
}

fn names(node: &DesignNode) -> Vec<String> {
    let mut out = vec![node.name.clone()];
    for child in &node.children {
        out.extend(names(child));
    }
    out
}

#[tokio::test]
async fn rebuilt_tree_keeps_names_and_structure() {
    let (loaded, snapshot) = import(document()).await;
    assert_eq!(loaded.name, "Menu");
    assert_eq!(loaded.node_count, 6);
    assert_eq!(loaded.skipped, 0);
    assert_eq!(loaded.root_id, snapshot.id);
    assert_eq!(snapshot.count(), 6);
    assert_eq!(
        names(&snapshot),
        vec!["Menu", "Button", "Title", "CIRCLE: Dot", "Row", "Bullet"]
    );
}

#[tokio::test]
async fn geometry_survives_the_round_trip() {
    let (_, snapshot) = import(document()).await;
    let button = &snapshot.children[0];
    assert_eq!(
        (button.x, button.y, button.width, button.height),
        (10.0, 10.0, 40.0, 20.0)
    );
    assert_eq!(button.fills[0].opacity, Some(0.5));

    let title = &snapshot.children[1];
    assert_eq!(title.characters.as_deref(), Some("Play"));
    assert_eq!(title.font_size, Some(18.0));
    assert_eq!(title.text_align_horizontal, Some(TextAlignHorizontal::Left));

    let original = serialize_tree(
        &serde_json::from_value::<DesignNode>(with_ids(document())).expect("design node"),
        &UrlMap::new(),
    );
    let rebuilt = serialize_tree(&snapshot, &UrlMap::new());
    assert_eq!(original.len(), rebuilt.len());
    let anchors = |els: &[figcui_lib::Element]| -> Vec<_> { els.iter().map(|e| e.anchor).collect() };
    assert_eq!(anchors(&original), anchors(&rebuilt));
}

#[tokio::test]
async fn unknown_type_becomes_a_named_placeholder() {
    let (loaded, snapshot) = import(json!({"type": "CIRCLE", "name": "X"})).await;
    assert_eq!(loaded.node_count, 1);
    assert_eq!(snapshot.node_type, NodeType::Rectangle);
    assert_eq!(snapshot.name, "CIRCLE: X");
}

#[tokio::test]
async fn non_object_root_is_reported() {
    let err = run_import(MemoryScene::new(), json!([1, 2]), SessionSettings::default())
        .await
        .expect_err("array root");
    match err {
        CuiError::Session {
            message,
            remediation,
        } => {
            assert!(message.starts_with("root:"));
            assert!(remediation.is_some());
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn nodes_without_type_are_kept_as_placeholders() {
    let (loaded, snapshot) = import(json!({
        "name": "X", "width": 120, "height": 60,
        "children": [{"type": "RECTANGLE", "name": "Inner"}]
    }))
    .await;
    assert_eq!(loaded.name, "UNKNOWN: X");
    assert_eq!(loaded.node_count, 1);
    assert_eq!(snapshot.node_type, NodeType::Rectangle);
    assert_eq!((snapshot.width, snapshot.height), (120.0, 60.0));

    let (loaded, snapshot) = import(json!({
        "type": "FRAME", "name": "Menu",
        "children": [{"name": "Loose"}, {"type": "RECTANGLE", "name": "Kept"}]
    }))
    .await;
    assert_eq!(loaded.skipped, 0);
    assert_eq!(names(&snapshot), vec!["Menu", "UNKNOWN: Loose", "Kept"]);
}

#[tokio::test]
async fn malformed_field_on_a_container_keeps_its_children() {
    let (loaded, snapshot) = import(json!({
        "type": "FRAME", "name": "Panel", "opacity": "0.5", "width": 100, "height": 100,
        "children": [
            {"type": "RECTANGLE", "name": "A"},
            {"type": "RECTANGLE", "name": "B"}
        ]
    }))
    .await;
    assert_eq!(loaded.node_count, 3);
    assert_eq!(loaded.skipped, 0);
    assert_eq!(names(&snapshot), vec!["Panel", "A", "B"]);
}

/// The import format carries no ids; give every object one so it reads as a snapshot.
fn with_ids(mut value: serde_json::Value) -> serde_json::Value {
    fn assign(value: &mut serde_json::Value, next: &mut usize) {
        if let Some(obj) = value.as_object_mut() {
            obj.insert("id".to_string(), json!(next.to_string()));
            *next += 1;
            if let Some(children) = obj.get_mut("children").and_then(|c| c.as_array_mut()) {
                for child in children {
                    assign(child, next);
                }
            }
        }
    }
    let mut next = 1;
    assign(&mut value, &mut next);
    value
}
