use drawdom_dom::DomError;
use drawdom_layout::PaginationError;
use thiserror::Error;

/// Everything that can stop an export. Failed images, tainted canvases and
/// unreadable style values are not errors: they are logged and skipped.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No element to export")]
    TargetNotFound,

    #[error("The layout host cannot report computed styles; exporting is not supported in this environment")]
    EnvironmentUnsupported,

    #[error("Export canceled")]
    Canceled,

    #[error("Invalid option '{option}': {reason}")]
    InvalidOption { option: &'static str, reason: String },

    #[error("Pagination failed: {0}")]
    Pagination(#[from] PaginationError),

    #[error("Page template failed: {0}")]
    Template(#[from] handlebars::RenderError),

    #[error("Document error: {0}")]
    Dom(#[from] DomError),
}
