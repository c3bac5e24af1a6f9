//! An arena-backed document tree: the element/text model the exporter walks,
//! clones and splits.
//!
//! The host owns layout; this crate only owns structure. Every mutation bumps
//! [`Document::revision`] so hosts can invalidate cached geometry.

pub mod builder;
pub mod document;
pub mod error;
pub mod inline_style;
pub mod markup;
pub mod selector;
pub mod stylesheet;

pub use builder::{ElementSpec, NodeSpec, el, text};
pub use document::{Document, ElementData, NodeData, NodeId};
pub use error::DomError;
pub use inline_style::{Declaration, InlineStyle};
pub use markup::parse_fragment;
pub use selector::SelectorList;
pub use stylesheet::{CssRule, StyleSheet};
