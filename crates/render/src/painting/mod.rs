//! Pure painting helpers: each takes computed styles and boxes and returns
//! scene elements, leaving grouping and clipping to the builder.

pub mod background;
pub mod border;
pub mod gradient;

pub use background::{LayerPlacement, paint_background};
pub use border::{FragmentSides, paint_borders};
pub use gradient::gradient_fill;
