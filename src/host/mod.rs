//! Boundary to the host design tool.
//!
//! The generator never touches host nodes directly. Reading goes through
//! [`DesignNode`] snapshots, writing through [`SceneHost`], and rasterization
//! through [`Rasterizer`].
//!
//! - [`memory::MemoryScene`] - an in-process scene graph used by the CLI and tests
//! - [`memory::FlatRasterizer`] - paints flattened fills into PNGs

pub mod memory;

use std::fmt;
use thiserror::Error;

use crate::types::{DesignNode, Effect, FontName, Paint, TextAlignHorizontal, TextAlignVertical};

pub use memory::{FlatRasterizer, MemoryScene};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum HostError {
    #[error("unknown node {0}")]
    UnknownNode(String),
    #[error("font {0} is not loaded")]
    FontNotLoaded(String),
    #[error("font {0} is unavailable")]
    FontUnavailable(String),
    #[error("invalid size {width}x{height}")]
    InvalidSize { width: f64, height: f64 },
    #[error("node {0} cannot hold children")]
    NotAContainer(String),
    #[error("export failed for {node}: {reason}")]
    Export { node: String, reason: String },
}

pub type HostResult<T> = std::result::Result<T, HostError>;

/// Opaque reference to a live node owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(pub usize);

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node primitives the host can create from script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Frame,
    Rectangle,
    Ellipse,
    Text,
}

/// Mutating access to the host's live scene.
///
/// Setters are applied one at a time and in a meaningful order (size before
/// position, font load before characters), mirroring what the host enforces.
#[allow(async_fn_in_trait)]
pub trait SceneHost {
    /// `None` when the host refuses to create the node.
    fn create_node(&mut self, kind: ShapeKind) -> Option<NodeHandle>;
    fn kind_of(&self, node: NodeHandle) -> HostResult<ShapeKind>;

    fn set_name(&mut self, node: NodeHandle, name: &str) -> HostResult<()>;
    fn set_visible(&mut self, node: NodeHandle, visible: bool) -> HostResult<()>;
    fn set_opacity(&mut self, node: NodeHandle, opacity: f64) -> HostResult<()>;
    fn resize(&mut self, node: NodeHandle, width: f64, height: f64) -> HostResult<()>;
    fn set_position(&mut self, node: NodeHandle, x: f64, y: f64) -> HostResult<()>;
    fn set_fills(&mut self, node: NodeHandle, fills: Vec<Paint>) -> HostResult<()>;
    fn set_strokes(&mut self, node: NodeHandle, strokes: Vec<Paint>) -> HostResult<()>;
    fn set_stroke_weight(&mut self, node: NodeHandle, weight: f64) -> HostResult<()>;
    fn supports_corner_radius(&self, node: NodeHandle) -> bool;
    fn set_corner_radius(&mut self, node: NodeHandle, radius: f64) -> HostResult<()>;
    fn set_effects(&mut self, node: NodeHandle, effects: Vec<Effect>) -> HostResult<()>;

    /// Must complete before characters using `font` can be assigned.
    async fn load_font(&mut self, font: &FontName) -> HostResult<()>;
    fn set_font(&mut self, node: NodeHandle, font: &FontName) -> HostResult<()>;
    fn set_font_size(&mut self, node: NodeHandle, size: f64) -> HostResult<()>;
    fn set_text_align(
        &mut self,
        node: NodeHandle,
        horizontal: Option<TextAlignHorizontal>,
        vertical: Option<TextAlignVertical>,
    ) -> HostResult<()>;
    fn set_characters(&mut self, node: NodeHandle, characters: &str) -> HostResult<()>;

    fn append_child(&mut self, parent: NodeHandle, child: NodeHandle) -> HostResult<()>;
    /// Remove a node and its subtree.
    fn remove(&mut self, node: NodeHandle);
    /// Attach a detached node to the current page.
    fn append_to_page(&mut self, node: NodeHandle) -> HostResult<()>;

    /// Snapshot of the current selection's first node.
    fn selection(&self) -> Option<DesignNode>;
    fn snapshot(&self, node: NodeHandle) -> HostResult<DesignNode>;
}

/// Turns a node into PNG bytes.
#[allow(async_fn_in_trait)]
pub trait Rasterizer {
    async fn export_png(&self, node: &DesignNode, scale: f64) -> HostResult<Vec<u8>>;
}
