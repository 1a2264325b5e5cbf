//! Messages exchanged between the plugin core and its UI.
//!
//! Both directions are JSON objects tagged by `type`. Outbound payloads are
//! plain data only; image bytes travel base64-encoded and floating point
//! values are scrubbed of NaN and infinities before they leave the core.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CuiError, ErrorPayload, Result};
use crate::geometry::finite_or_zero;
use crate::types::{DesignNode, ImageReference, Paint, UrlMap};

pub const PNG_MIME: &str = "image/png";

/// Where the generated plugin finds its raster images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetMode {
    /// Images are uploaded and referenced by URL.
    #[default]
    Urls,
    /// Images are PNG files in the plugin's data directory, keyed by file stem.
    Data,
}

impl fmt::Display for AssetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetMode::Urls => f.write_str("urls"),
            AssetMode::Data => f.write_str("data"),
        }
    }
}

/// Commands sent by the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Inbound {
    RequestInit,
    #[serde(rename_all = "camelCase")]
    SaveToken { api_token: String },
    #[serde(rename_all = "camelCase")]
    GenerateCode {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_token: Option<String>,
        /// Replaces the session's asset mode when present.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        asset_mode: Option<AssetMode>,
    },
    LoadJsonData { data: Value },
    #[serde(rename_all = "camelCase")]
    UploadComplete {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pass_id: Option<u64>,
        #[serde(default)]
        results: UrlMap,
    },
    RequestDebug,
    Cancel,
}

impl Inbound {
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Events sent to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Outbound {
    Init {
        token: String,
    },
    TokenSaved {
        length: usize,
    },
    Log {
        message: String,
    },
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        remediation: Option<String>,
    },
    /// Every rasterized image of the pass, sent whether or not it is uploaded.
    CacheImages {
        images: Vec<ImagePayload>,
    },
    #[serde(rename_all = "camelCase")]
    UploadImages {
        pass_id: u64,
        images: Vec<ImagePayload>,
        token: String,
    },
    #[serde(rename_all = "camelCase")]
    CodeGenerated {
        summary: String,
        plugin: String,
        plugin_file: String,
        frame_name: String,
        files: Vec<String>,
        element_count: usize,
    },
    #[serde(rename_all = "camelCase")]
    TreeLoaded {
        root_id: String,
        name: String,
        node_count: usize,
        skipped: usize,
    },
    Debug {
        selection: Option<DesignNode>,
    },
}

impl Outbound {
    pub fn log(message: impl Into<String>) -> Self {
        Outbound::Log {
            message: message.into(),
        }
    }

    pub fn error(err: &CuiError) -> Self {
        let ErrorPayload {
            message,
            remediation,
            ..
        } = err.to_payload();
        Outbound::Error {
            message,
            remediation,
        }
    }

    pub fn debug(selection: Option<&DesignNode>) -> Self {
        Outbound::Debug {
            selection: selection.map(scrub_node),
        }
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// One rasterized image on its way to the upload collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    pub node_id: String,
    /// Base64 (standard alphabet, padded) PNG bytes.
    pub bytes: String,
    pub filename: String,
    pub mime: String,
}

impl ImagePayload {
    pub fn decode_bytes(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(&self.bytes)
            .map_err(|e| CuiError::Unknown(format!("invalid image payload {}: {e}", self.filename)))
    }
}

impl From<&ImageReference> for ImagePayload {
    fn from(image: &ImageReference) -> Self {
        Self {
            node_id: image.node_id.clone(),
            bytes: STANDARD.encode(&image.bytes),
            filename: image.file_name.clone(),
            mime: PNG_MIME.to_string(),
        }
    }
}

/// Copy of `node` with every non-finite number replaced by zero.
pub fn scrub_node(node: &DesignNode) -> DesignNode {
    let mut out = node.clone();
    scrub_in_place(&mut out);
    out
}

fn scrub_in_place(node: &mut DesignNode) {
    for v in [
        &mut node.opacity,
        &mut node.x,
        &mut node.y,
        &mut node.width,
        &mut node.height,
    ] {
        *v = finite_or_zero(*v);
    }
    for v in [
        &mut node.stroke_weight,
        &mut node.corner_radius,
        &mut node.font_size,
    ]
    .into_iter()
    .flatten()
    {
        *v = finite_or_zero(*v);
    }
    node.fills.iter_mut().for_each(scrub_paint);
    node.strokes.iter_mut().for_each(scrub_paint);
    for effect in &mut node.effects {
        effect.radius = finite_or_zero(effect.radius);
        if let Some(c) = &mut effect.color {
            c.r = finite_or_zero(c.r);
            c.g = finite_or_zero(c.g);
            c.b = finite_or_zero(c.b);
            c.a = finite_or_zero(c.a);
        }
        if let Some(o) = &mut effect.offset {
            o.x = finite_or_zero(o.x);
            o.y = finite_or_zero(o.y);
        }
    }
    node.children.iter_mut().for_each(scrub_in_place);
}

fn scrub_paint(paint: &mut Paint) {
    if let Some(c) = &mut paint.color {
        c.r = finite_or_zero(c.r);
        c.g = finite_or_zero(c.g);
        c.b = finite_or_zero(c.b);
    }
    if let Some(o) = &mut paint.opacity {
        *o = finite_or_zero(*o);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NodeType, Rgb};

    #[test]
    fn inbound_messages_parse_by_type() {
        assert_eq!(
            Inbound::parse(r#"{"type":"request-init"}"#).expect("init"),
            Inbound::RequestInit
        );
        assert_eq!(
            Inbound::parse(r#"{"type":"save-token","apiToken":"abc"}"#).expect("token"),
            Inbound::SaveToken {
                api_token: "abc".to_string()
            }
        );
        assert_eq!(
            Inbound::parse(r#"{"type":"generate-code"}"#).expect("generate"),
            Inbound::GenerateCode {
                api_token: None,
                asset_mode: None
            }
        );
        assert_eq!(
            Inbound::parse(r#"{"type":"generate-code","apiToken":"t","assetMode":"data"}"#)
                .expect("generate with mode"),
            Inbound::GenerateCode {
                api_token: Some("t".to_string()),
                asset_mode: Some(AssetMode::Data)
            }
        );

        let complete =
            Inbound::parse(r#"{"type":"upload-complete","passId":3,"results":{"1:2":"https://x/1"}}"#)
                .expect("complete");
        match complete {
            Inbound::UploadComplete { pass_id, results } => {
                assert_eq!(pass_id, Some(3));
                assert_eq!(results.get("1:2").map(String::as_str), Some("https://x/1"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_inbound_type_is_an_error() {
        assert!(Inbound::parse(r#"{"type":"text-to-uppercase"}"#).is_err());
    }

    #[test]
    fn outbound_uses_kebab_tags_and_camel_fields() {
        let json = Outbound::TreeLoaded {
            root_id: "1:1".to_string(),
            name: "Menu".to_string(),
            node_count: 4,
            skipped: 0,
        }
        .encode()
        .expect("encode");
        assert_eq!(
            json,
            r#"{"type":"tree-loaded","rootId":"1:1","name":"Menu","nodeCount":4,"skipped":0}"#
        );
    }

    #[test]
    fn image_payload_is_base64() {
        let payload = ImagePayload::from(&ImageReference {
            node_id: "1".to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
            file_name: "icon.png".to_string(),
        });
        assert_eq!(payload.bytes, "iVBORw==");
        assert_eq!(payload.mime, "image/png");
        assert_eq!(payload.decode_bytes().expect("decode"), vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn debug_payload_scrubs_non_finite_numbers() {
        let mut node = DesignNode::new("1", "Broken", NodeType::Frame)
            .with_fill(Paint::solid(Rgb::new(f64::NAN, 0.5, 1.0)).with_opacity(f64::INFINITY));
        node.width = f64::NAN;
        node.corner_radius = Some(f64::NEG_INFINITY);
        node.children.push(DesignNode::new("2", "Child", NodeType::Text));
        node.children[0].x = f64::INFINITY;

        let json = Outbound::debug(Some(&node)).encode().expect("encode");
        assert!(!json.contains("null"), "non-finite values leaked: {json}");
        assert!(json.contains(r#""width":0.0"#));
        assert!(json.contains(r#""cornerRadius":0.0"#));
    }

    #[test]
    fn error_event_carries_remediation() {
        let event = Outbound::error(&CuiError::precondition("Select a root frame"));
        match event {
            Outbound::Error {
                message,
                remediation,
            } => {
                assert_eq!(message, "Select a root frame");
                assert!(remediation.is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
