//! figcui library
//!
//! Core of a Figma plugin that turns a selected design frame into an
//! Oxide/Rust CUI plugin (flattened elements with parent-relative anchors),
//! and rebuilds a live node tree from serialized design JSON.
//!
//! # Module Overview
//!
//! - [`types`] - design node snapshots and flattened elements
//! - [`serializer`] - tree serializer, summary and C# plugin rendering
//! - [`deserializer`] - JSON to live node tree through a [`host::SceneHost`]
//! - [`session`] - plugin-side message loop for the UI channel
//! - [`protocol`] - UI channel message types
//! - [`host`] - scene host and rasterizer seams, plus an in-memory scene
//! - [`figma`] - Figma REST API input
//! - [`upload`] - image upload to an endpoint or a local directory
//! - [`driver`] - headless generate/import flows over a session
//! - [`config`] - configuration file support
//! - [`output`] - JSON output schemas
//!
//! # Example
//!
//! ```no_run
//! use figcui_lib::{render_plugin, serialize_tree, AssetMode, DesignNode, NodeType, UrlMap};
//!
//! let root = DesignNode::new("1:1", "Menu", NodeType::Frame).with_bounds(0.0, 0.0, 200.0, 100.0);
//! let elements = serialize_tree(&root, &UrlMap::new());
//! let plugin = render_plugin(&root, &elements, "figcui", AssetMode::Urls);
//! println!("{}", plugin.file_name);
//! ```

pub mod config;
pub mod deserializer;
pub mod driver;
pub mod error;
pub mod figma;
pub mod geometry;
pub mod host;
pub mod naming;
pub mod observability;
pub mod output;
pub mod protocol;
pub mod resource;
pub mod serializer;
pub mod session;
pub mod style;
pub mod types;
pub mod upload;

pub use config::Config;
pub use deserializer::{build_tree, BuildReport, SkippedNode};
pub use driver::{run_generation, run_import, Generation, Import};
pub use error::{CuiError, ErrorCategory, ErrorPayload, Result};
pub use host::{FlatRasterizer, HostError, MemoryScene, NodeHandle, Rasterizer, SceneHost};
pub use observability::init_tracing;
pub use output::{ErrorOutput, FigcuiOutput, FIGCUI_OUTPUT_VERSION};
pub use protocol::{AssetMode, ImagePayload, Inbound, Outbound};
pub use resource::{parse_input, FigmaInfo, InputSource};
pub use serializer::{render_plugin, render_summary, serialize_tree, PluginSource};
pub use session::{PluginSession, SessionSettings};
pub use types::{
    AnchorRect, Component, DesignNode, Element, ElementKind, NodeType, Paint, UrlMap,
};
pub use upload::{UploadReport, UploadTarget};
