//! Plain geometry and color values shared by every drawdom crate.
pub mod color;
pub mod geometry;
pub mod matrix;

pub use color::Color;
pub use geometry::{Edges, Point, Rect, Size};
pub use matrix::Matrix;
