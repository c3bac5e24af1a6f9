//! Render-tree construction.
//!
//! [`TreeBuilder`] walks a laid-out document subtree and emits the scene
//! graph that reproduces it: boxes with their backgrounds and borders,
//! text positioned line by line, images, and groups for clipping, opacity,
//! transforms and stacking order.

pub mod arena;
pub mod builder;
pub mod context;
pub mod forms;
pub mod markers;
pub mod painting;
pub mod pseudo;
pub mod stacking;

pub use builder::{EXPORT_CLASS, TreeBuilder};
pub use context::{ClipBox, Frame, FrameStack};

/// Tag of the temporary elements that stand in for pseudo-elements, list
/// markers and form controls while they are rendered.
pub const STAND_IN_TAG: &str = "drawdom-pseudo";
