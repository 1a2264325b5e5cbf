//! Figma REST input.
//!
//! - [`FigmaClient`] - HTTP client for the Figma REST API
//! - [`fetch_snapshot`] - fetches a node subtree as a [`DesignNode`]
//! - [`FigmaRasterizer`] - rasterizes nodes through the images endpoint

pub mod api_types;
pub mod client;
pub mod conversion;

#[cfg(test)]
mod tests;

pub use api_types::{FigmaNodeData, ImageFormat};
pub use client::{FigmaAuth, FigmaClient};
pub use conversion::to_design_node;

use tracing::debug;

use crate::error::Result;
use crate::host::{HostError, HostResult, Rasterizer};
use crate::types::DesignNode;

/// Fetch `node_id` from `file_key` and convert it to a snapshot.
pub async fn fetch_snapshot(
    client: &FigmaClient,
    file_key: &str,
    node_id: &str,
) -> Result<DesignNode> {
    let node = client.fetch_node(file_key, node_id).await?;
    let snapshot = to_design_node(&node);
    debug!(
        node_id,
        name = %snapshot.name,
        nodes = snapshot.count(),
        "fetched Figma snapshot"
    );
    Ok(snapshot)
}

/// Rasterizes snapshot nodes by asking Figma to render them.
#[derive(Debug, Clone)]
pub struct FigmaRasterizer {
    client: FigmaClient,
    file_key: String,
}

impl FigmaRasterizer {
    pub fn new(client: FigmaClient, file_key: impl Into<String>) -> Self {
        Self {
            client,
            file_key: file_key.into(),
        }
    }
}

impl Rasterizer for FigmaRasterizer {
    async fn export_png(&self, node: &DesignNode, scale: f64) -> HostResult<Vec<u8>> {
        let export_failed = |reason: String| HostError::Export {
            node: node.id.clone(),
            reason,
        };
        let url = self
            .client
            .export_image(&self.file_key, &node.id, ImageFormat::Png, scale)
            .await
            .map_err(|e| export_failed(e.to_string()))?;
        self.client
            .download_image(&url)
            .await
            .map_err(|e| export_failed(e.to_string()))
    }
}
