//! Export orchestration.
//!
//! - [`Exporter`]: owns the image and background caches and runs exports
//! - [`ExportOptions`]: paper, pagination, link and template settings
//! - [`PageTemplate`]: header/footer content added to every page
//! - [`Progress`] and [`CancelToken`]: per-page reporting and cooperative
//!   cancellation
//!
//! # Example
//!
//! ```ignore
//! use drawdom::{Exporter, ExportOptions};
//! use drawdom_style::PageSize;
//!
//! let exporter = Exporter::new(provider);
//! let options = ExportOptions::new().with_paper_size(PageSize::A4);
//! let scene = exporter.draw_dom(&doc, "#report", &host, &options).await?;
//! ```

pub mod config;
mod orchestrator;
pub mod progress;
pub mod template;

pub use config::{AvoidLinks, BeforePageBreak, ExportOptions, PageGeometry, PaperSize, ProgressCallback};
pub use orchestrator::{ExportTarget, Exporter, draw_dom};
pub use progress::{CancelToken, Progress};
pub use template::{PageContext, PageGenerator, PageTemplate};
