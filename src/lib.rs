//! Exports a laid-out document subtree as a resolution-independent vector
//! scene, optionally split across fixed-size pages.
//!
//! The layout host (see [`drawdom_traits::LayoutHost`]) owns styles and
//! geometry; this crate only asks it questions. Rendering happens in
//! [`drawdom_render`], page splitting in [`drawdom_layout`].

pub mod error;
pub mod pipeline;

pub use error::ExportError;
pub use pipeline::{
    AvoidLinks, CancelToken, ExportOptions, ExportTarget, Exporter, PageContext, PageGeometry, PageTemplate,
    PaperSize, Progress, draw_dom,
};

pub use drawdom_dom as dom;
pub use drawdom_scene as scene;
pub use drawdom_style::{Margins, PageSize};
pub use drawdom_traits::{LayoutHost, ResourceProvider};
