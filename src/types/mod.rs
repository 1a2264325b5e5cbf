//! Core data types shared by the serializer, deserializer and session.
//!
//! - [`node`] - design node snapshots read from the host
//! - [`element`] - flattened serializer output

pub mod element;
pub mod node;

pub use element::{
    AnchorRect, Component, Element, ElementKind, ImageReference, UrlMap, ROOT_PARENT,
};
pub use node::{
    DesignNode, Effect, ExportSetting, FontName, NodeType, Paint, PaintType, Rgb, Rgba,
    TextAlignHorizontal, TextAlignVertical, Vector2,
};
