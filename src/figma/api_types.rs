//! Figma API response types for parsing JSON from the Figma REST API.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::PaintType;

/// Supported image export formats.
#[derive(Debug, Clone, Copy)]
pub enum ImageFormat {
    Png,
    Svg,
}

impl ImageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }
}

/// Raw Figma node data from the API.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FigmaNodeData {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    pub opacity: Option<f64>,
    #[serde(default)]
    pub children: Vec<FigmaNodeData>,
    pub absolute_bounding_box: Option<FigmaBoundingBox>,
    pub characters: Option<String>,
    pub style: Option<FigmaTypeStyle>,
    #[serde(default)]
    pub fills: Vec<FigmaPaintData>,
    #[serde(default)]
    pub strokes: Vec<FigmaPaintData>,
    pub stroke_weight: Option<f64>,
    pub corner_radius: Option<f64>,
    #[serde(default)]
    pub effects: Vec<FigmaEffectData>,
    #[serde(default)]
    pub export_settings: Vec<FigmaExportSetting>,
}

fn default_visible() -> bool {
    true
}

/// Bounding box coordinates from Figma, in absolute canvas space.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FigmaBoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Typography style from Figma.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FigmaTypeStyle {
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub font_weight: Option<f64>,
    #[serde(default)]
    pub italic: bool,
    pub text_align_horizontal: Option<String>,
    pub text_align_vertical: Option<String>,
}

/// Paint/fill data from Figma.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FigmaPaintData {
    #[serde(rename = "type")]
    pub paint_type: PaintType,
    #[serde(default = "default_visible")]
    pub visible: bool,
    pub color: Option<FigmaColor>,
    pub opacity: Option<f64>,
    pub image_ref: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FigmaEffectData {
    #[serde(rename = "type")]
    pub effect_type: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub radius: f64,
    pub color: Option<FigmaColor>,
    pub offset: Option<FigmaVector>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct FigmaVector {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FigmaExportSetting {
    pub format: String,
    pub suffix: Option<String>,
}

/// RGBA color from Figma (0.0-1.0 range).
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FigmaColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    #[serde(default = "default_alpha")]
    pub a: f64,
}

fn default_alpha() -> f64 {
    1.0
}

/// Response from the nodes endpoint.
#[derive(Debug, Deserialize)]
pub struct FigmaNodesResponse {
    pub nodes: HashMap<String, Option<FigmaNodeWrapper>>,
}

/// Wrapper containing the document for a node.
#[derive(Debug, Deserialize)]
pub struct FigmaNodeWrapper {
    pub document: FigmaNodeData,
}

/// Response from the images export endpoint.
#[derive(Debug, Deserialize)]
pub struct FigmaImageExport {
    #[serde(default)]
    pub err: Option<String>,
    pub images: HashMap<String, Option<String>>,
}
