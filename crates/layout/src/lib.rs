use thiserror::Error;

pub use self::algorithms::pagination::PaginationState;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PaginationError {
    #[error("The export target has no parent to hold the page container.")]
    TargetDetached,
    #[error("Invalid pagination transition from {from:?} to {to:?}.")]
    InvalidTransition {
        from: PaginationState,
        to: PaginationState,
    },
}

pub mod algorithms;
pub mod geom;
pub mod probe;
pub mod text;

pub use self::algorithms::pagination::{
    DOCUMENT_TAG, Fall, PAGE_TAG, PageSet, PaginationConfig, PreparedDocument, SPLIT_INDEX_ATTR,
    prepare,
};
pub use self::geom::{
    BorderEdge, Borders, CornerRadii, CornerRadius, RoundBoxKind, Side, adjust_border_radius_for_box,
    element_round_box, inner_box, round_box,
};
pub use self::probe::{HostProbe, RangeProbe};
pub use self::text::{TextDecorations, TextFragment, TextLayoutParams, decoration_lines, layout_text};
