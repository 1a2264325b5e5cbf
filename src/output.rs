use crate::error::ErrorPayload;
use crate::types::DesignNode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Schema version for output payloads.
pub const FIGCUI_OUTPUT_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum FigcuiOutput {
    Generate(GenerateOutput),
    Import(ImportOutput),
    Error(ErrorOutput),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputKind {
    Snapshot,
    Figma,
    Document,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub kind: InputKind,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOutput {
    pub version: String,
    pub input: InputDescriptor,
    pub frame_name: String,
    pub class_name: String,
    pub element_count: usize,
    pub plugin_path: PathBuf,
    pub summary_path: PathBuf,
    /// Image files rasterized for this pass.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    pub uploaded: usize,
    /// Progress messages the session reported while generating.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub log: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutput {
    pub version: String,
    pub input: InputDescriptor,
    pub root_id: String,
    pub name: String,
    pub node_count: usize,
    pub skipped: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub log: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<PathBuf>,
    /// Inline when no snapshot file was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<DesignNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOutput {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub error: ErrorPayload,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[test]
    fn generate_output_serializes() {
        let output = FigcuiOutput::Generate(GenerateOutput {
            version: FIGCUI_OUTPUT_VERSION.to_string(),
            input: InputDescriptor {
                kind: InputKind::Snapshot,
                value: "menu.json".to_string(),
            },
            frame_name: "Menu".to_string(),
            class_name: "MenuUI".to_string(),
            element_count: 3,
            plugin_path: PathBuf::from("out/MenuUI.cs"),
            summary_path: PathBuf::from("out/summary.txt"),
            images: vec!["Icon.png".to_string()],
            uploaded: 1,
            log: Vec::new(),
        });

        let json = serde_json::to_string(&output).expect("serialize generate output");
        assert!(json.contains("\"mode\":\"generate\""));
        assert!(json.contains("\"className\":\"MenuUI\""));
        assert!(json.contains("\"kind\":\"snapshot\""));
        assert!(!json.contains("\"log\""));
    }

    #[test]
    fn import_output_serializes() {
        let output = FigcuiOutput::Import(ImportOutput {
            version: FIGCUI_OUTPUT_VERSION.to_string(),
            input: InputDescriptor {
                kind: InputKind::Document,
                value: "doc.json".to_string(),
            },
            root_id: "1".to_string(),
            name: "Doc".to_string(),
            node_count: 2,
            skipped: 0,
            log: Vec::new(),
            snapshot_path: Some(PathBuf::from("snap.json")),
            snapshot: None,
        });

        let json = serde_json::to_string(&output).expect("serialize import output");
        assert!(json.contains("\"mode\":\"import\""));
        assert!(json.contains("\"nodeCount\":2"));
        assert!(!json.contains("\"snapshot\":"));
    }

    #[test]
    fn error_output_serializes() {
        let output = FigcuiOutput::Error(ErrorOutput {
            version: FIGCUI_OUTPUT_VERSION.to_string(),
            message: Some("bad".to_string()),
            error: ErrorPayload {
                category: ErrorCategory::Input,
                message: "bad".to_string(),
                remediation: None,
            },
        });
        let json = serde_json::to_string(&output).expect("serialize error output");
        assert!(json.contains("\"mode\":\"error\""));
        assert!(json.contains("\"category\":\"input\""));
    }
}
