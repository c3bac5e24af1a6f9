//! The vector scene graph produced by an export.
//!
//! Coordinates are host pixels. Groups own their children; transforms and
//! clips on a group apply to everything below it.

pub mod arc;
pub mod element;
pub mod path;

pub use arc::Arc;
pub use element::{DocumentInfo, Element, Group, Image, Link, Text};
pub use path::{Fill, GradientStop, LinearGradient, Path, PathCommand, Stroke};
