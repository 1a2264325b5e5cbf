use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::ParseError;

use crate::host::HostError;

#[derive(Debug, Error)]
pub enum CuiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] ParseError),

    #[error("Figma API error (status: {status:?}): {message}")]
    FigmaApi {
        status: Option<StatusCode>,
        message: String,
    },

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Precondition(String),

    #[error("Could not build node tree: {0}")]
    Deserialize(String),

    #[error("Host error: {0}")]
    Host(#[from] HostError),

    #[error("Busy: {0}")]
    Busy(String),

    /// An `error` event reported by a plugin session.
    #[error("{message}")]
    Session {
        message: String,
        remediation: Option<String>,
    },

    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl CuiError {
    pub fn figma_api(status: Option<StatusCode>, message: impl Into<String>) -> Self {
        CuiError::FigmaApi {
            status,
            message: message.into(),
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        CuiError::Precondition(message.into())
    }

    pub fn deserialize(message: impl Into<String>) -> Self {
        CuiError::Deserialize(message.into())
    }

    pub fn to_payload(&self) -> ErrorPayload {
        match self {
            CuiError::Io(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Check file paths/permissions.",
            ),
            CuiError::Network(e) => ErrorPayload::new(
                ErrorCategory::Network,
                e.to_string(),
                "Check connectivity and the upload endpoint, then retry.",
            ),
            CuiError::InvalidUrl(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Verify URL/format (e.g., https://www.figma.com/design/<KEY>/...).",
            ),
            CuiError::FigmaApi { status, message } => ErrorPayload::new(
                ErrorCategory::Figma,
                format!("Figma API error (status {:?}): {}", status, message),
                "Check FIGMA_TOKEN/URL and rate limits; retry after waiting.",
            ),
            CuiError::Image(e) => ErrorPayload::new(
                ErrorCategory::Image,
                e.to_string(),
                "A node could not be rasterized; check its size and fills.",
            ),
            CuiError::Serialization(e) => ErrorPayload::new(
                ErrorCategory::Input,
                e.to_string(),
                "Check the JSON input; run with --verbose for details.",
            ),
            CuiError::Config(msg) => {
                let lower = msg.to_ascii_lowercase();
                if lower.contains("figma_token") || lower.contains("figma token") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Set FIGMA_TOKEN (or FIGMA_OAUTH_TOKEN) before using Figma URLs.",
                    )
                } else if lower.contains("node-id") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Include a Figma node-id in the URL (e.g., ?node-id=1-2).",
                    )
                } else if lower.contains("scale") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Use a positive export_scale in the config file (e.g., 2.0).",
                    )
                } else if lower.contains("file not found") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Verify the file exists; use an absolute path or run from the working directory.",
                    )
                } else {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Check flags/paths and the config file.",
                    )
                }
            }
            CuiError::Precondition(msg) => ErrorPayload::new(
                ErrorCategory::Input,
                msg.to_string(),
                "Select a root frame with a non-zero size and try again.",
            ),
            CuiError::Deserialize(msg) => ErrorPayload::new(
                ErrorCategory::Input,
                msg.to_string(),
                "The document root must be a JSON object describing a node.",
            ),
            CuiError::Host(e) => ErrorPayload::new(
                ErrorCategory::Host,
                e.to_string(),
                "The design tool rejected an operation; retry or simplify the input.",
            ),
            CuiError::Busy(msg) => ErrorPayload::new(
                ErrorCategory::Host,
                msg.to_string(),
                "Wait for the running generation to finish.",
            ),
            CuiError::Session {
                message,
                remediation,
            } => ErrorPayload {
                category: ErrorCategory::Input,
                message: message.clone(),
                remediation: remediation.clone(),
            },
            CuiError::Unknown(msg) => ErrorPayload::new(
                ErrorCategory::Unknown,
                msg.to_string(),
                "Re-run with --verbose; file an issue if persistent.",
            ),
        }
    }
}

pub type Result<T> = std::result::Result<T, CuiError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Config,
    Network,
    Figma,
    Image,
    Input,
    Host,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ErrorPayload {
    pub fn new(category: ErrorCategory, message: String, remediation: impl Into<String>) -> Self {
        Self {
            category,
            message,
            remediation: Some(remediation.into()),
        }
    }
}
