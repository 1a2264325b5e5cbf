use figcui_lib::FigcuiOutput;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn figcui(dir: &Path, args: &[&str]) -> Output {
    let config = dir.join("figcui.toml");
    if !config.exists() {
        std::fs::write(&config, "author = \"Tester\"\n").expect("write config");
    }
    Command::new(env!("CARGO_BIN_EXE_figcui"))
        .args(args)
        .arg("--config")
        .arg(&config)
        .env_remove("FIGMA_TOKEN")
        .env_remove("FIGMA_OAUTH_TOKEN")
        .env_remove("FIGCUI_API_TOKEN")
        .output()
        .expect("run figcui")
}

fn parse(output: &Output) -> FigcuiOutput {
    serde_json::from_slice(&output.stdout).expect("json report on stdout")
}

fn write_snapshot(dir: &Path) -> PathBuf {
    let snapshot = json!({
        "id": "1:1", "name": "Menu", "type": "FRAME", "width": 200, "height": 100,
        "fills": [{"type": "SOLID", "color": {"r": 0.1, "g": 0.1, "b": 0.1}}],
        "children": [
            {"id": "1:2", "name": "Play", "type": "RECTANGLE", "x": 10, "y": 10, "width": 40, "height": 20,
             "fills": [{"type": "SOLID", "color": {"r": 0, "g": 0.5, "b": 1}}]},
            {"id": "1:3", "name": "Logo", "type": "RECTANGLE", "x": 100, "y": 10, "width": 32, "height": 32,
             "fills": [{"type": "IMAGE", "imageHash": "abc"}]}
        ]
    });
    let path = dir.join("menu.json");
    std::fs::write(&path, snapshot.to_string()).expect("write snapshot");
    path
}

#[test]
fn generate_from_snapshot_writes_plugin_summary_and_images() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_snapshot(dir.path());
    let out_dir = dir.path().join("out");

    let output = figcui(
        dir.path(),
        &[
            "generate",
            "--input",
            input.to_str().expect("utf-8 path"),
            "--output-dir",
            out_dir.to_str().expect("utf-8 path"),
        ],
    );
    assert_eq!(output.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    match parse(&output) {
        FigcuiOutput::Generate(body) => {
            assert_eq!(body.frame_name, "Menu");
            assert_eq!(body.class_name, "MenuUI");
            assert_eq!(body.element_count, 3);
            assert_eq!(body.images, vec!["Logo.png".to_string()]);
            assert_eq!(body.uploaded, 1);
        }
        other => panic!("unexpected output {other:?}"),
    }

    let plugin = std::fs::read_to_string(out_dir.join("MenuUI.cs")).expect("plugin source");
    assert!(plugin.contains("[Info(\"MenuUI\", \"Tester\""));
    assert!(plugin.contains("file://"));
    let summary = std::fs::read_to_string(out_dir.join("summary.txt")).expect("summary");
    assert!(summary.starts_with("/* Rust CUI Elements (summary) */"));
    assert!(out_dir.join("images").join("Logo.png").exists());
}

#[test]
fn data_asset_mode_keeps_images_local_and_keys_them() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_snapshot(dir.path());
    let out_dir = dir.path().join("out");

    let output = figcui(
        dir.path(),
        &[
            "generate",
            "--input",
            input.to_str().expect("utf-8 path"),
            "--output-dir",
            out_dir.to_str().expect("utf-8 path"),
            "--asset-mode",
            "data",
        ],
    );
    assert_eq!(output.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    match parse(&output) {
        FigcuiOutput::Generate(body) => {
            assert_eq!(body.images, vec!["Logo.png".to_string()]);
            assert_eq!(body.uploaded, 0);
        }
        other => panic!("unexpected output {other:?}"),
    }
    let plugin = std::fs::read_to_string(out_dir.join("MenuUI.cs")).expect("plugin source");
    assert!(plugin.contains("Png = assets?.Get(\"Logo\")"));
    assert!(!plugin.contains("Url = \"file://"));
    assert!(out_dir.join("images").join("Logo.png").exists());
}

#[test]
fn generate_with_missing_input_exits_with_error_report() {
    let dir = TempDir::new().expect("tempdir");
    let missing = dir.path().join("nope.json");

    let output = figcui(
        dir.path(),
        &["generate", "--input", missing.to_str().expect("utf-8 path")],
    );
    assert_eq!(output.status.code(), Some(2));
    match parse(&output) {
        FigcuiOutput::Error(body) => {
            assert!(body.error.message.contains("nope.json"));
            assert!(body.error.remediation.is_some());
        }
        other => panic!("unexpected output {other:?}"),
    }
}

#[test]
fn generate_from_figma_url_requires_a_token() {
    let dir = TempDir::new().expect("tempdir");
    let output = figcui(
        dir.path(),
        &[
            "generate",
            "--input",
            "https://www.figma.com/design/KEY123/Menu?node-id=1-2",
            "--output-dir",
            dir.path().join("out").to_str().expect("utf-8 path"),
        ],
    );
    assert_eq!(output.status.code(), Some(2));
    match parse(&output) {
        FigcuiOutput::Error(body) => assert!(body.error.message.contains("FIGMA_TOKEN")),
        other => panic!("unexpected output {other:?}"),
    }
}

#[test]
fn generate_rejects_non_positive_scale() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_snapshot(dir.path());
    let output = figcui(
        dir.path(),
        &[
            "generate",
            "--input",
            input.to_str().expect("utf-8 path"),
            "--scale",
            "0",
        ],
    );
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn generate_from_a_leaf_selection_fails() {
    let dir = TempDir::new().expect("tempdir");
    let input = dir.path().join("leaf.json");
    std::fs::write(
        &input,
        json!({"id": "9", "name": "Lonely", "type": "RECTANGLE", "width": 10, "height": 10}).to_string(),
    )
    .expect("write snapshot");

    let output = figcui(
        dir.path(),
        &[
            "generate",
            "--input",
            input.to_str().expect("utf-8 path"),
            "--output-dir",
            dir.path().join("out").to_str().expect("utf-8 path"),
        ],
    );
    assert_eq!(output.status.code(), Some(2));
    match parse(&output) {
        FigcuiOutput::Error(body) => assert!(body.error.message.contains("not a frame")),
        other => panic!("unexpected output {other:?}"),
    }
}

#[test]
fn import_writes_snapshot_file() {
    let dir = TempDir::new().expect("tempdir");
    let input = dir.path().join("doc.json");
    std::fs::write(
        &input,
        json!({
            "type": "FRAME", "name": "Doc", "width": 300, "height": 200,
            "children": [
                {"type": "TEXT", "name": "Title", "characters": "Hello", "x": 10, "y": 10, "width": 100, "height": 20},
                {"type": "CIRCLE", "name": "Dot"}
            ]
        })
        .to_string(),
    )
    .expect("write doc");
    let snapshot_path = dir.path().join("snapshot.json");

    let output = figcui(
        dir.path(),
        &[
            "import",
            "--input",
            input.to_str().expect("utf-8 path"),
            "-o",
            snapshot_path.to_str().expect("utf-8 path"),
        ],
    );
    assert_eq!(output.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    match parse(&output) {
        FigcuiOutput::Import(body) => {
            assert_eq!(body.name, "Doc");
            assert_eq!(body.node_count, 3);
            assert_eq!(body.snapshot_path.as_deref(), Some(snapshot_path.as_path()));
            assert!(body.snapshot.is_none());
        }
        other => panic!("unexpected output {other:?}"),
    }

    let snapshot: figcui_lib::DesignNode =
        serde_json::from_str(&std::fs::read_to_string(&snapshot_path).expect("snapshot file"))
            .expect("snapshot json");
    assert_eq!(snapshot.children[1].name, "CIRCLE: Dot");
}

#[test]
fn import_of_garbage_exits_with_error() {
    let dir = TempDir::new().expect("tempdir");
    let input = dir.path().join("bad.json");
    std::fs::write(&input, "{ not json").expect("write doc");
    let output = figcui(
        dir.path(),
        &["import", "--input", input.to_str().expect("utf-8 path")],
    );
    assert_eq!(output.status.code(), Some(2));
    assert!(matches!(parse(&output), FigcuiOutput::Error(_)));
}

#[test]
fn pretty_format_prints_human_report() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_snapshot(dir.path());
    let output = figcui(
        dir.path(),
        &[
            "generate",
            "--input",
            input.to_str().expect("utf-8 path"),
            "--output-dir",
            dir.path().join("out").to_str().expect("utf-8 path"),
            "--format",
            "pretty",
        ],
    );
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[GENERATE] MenuUI from frame \"Menu\""));
}
