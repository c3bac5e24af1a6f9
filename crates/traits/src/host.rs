//! The layout oracle.
//!
//! The exporter never lays anything out itself. Every style value and every
//! box it draws comes from a [`LayoutHost`], queried against the document
//! state at the time of the call, so hosts must reflect mutations (inserted
//! stand-in nodes, split text, page containers) in subsequent answers.

use drawdom_dom::{Document, NodeId, StyleSheet};
use drawdom_scene::Group;
use drawdom_style::{ComputedStyle, Vendor};
use drawdom_types::Rect;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PseudoElement {
    Before,
    After,
}

/// A character range inside one text node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRange {
    pub node: NodeId,
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(node: NodeId, start: usize, end: usize) -> Self {
        Self { node, start, end }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    #[error("canvas pixels are not readable (cross-origin content)")]
    TaintedCanvas,

    #[error("operation not supported by this host: {0}")]
    Unsupported(&'static str),
}

pub trait LayoutHost {
    fn vendor(&self) -> Vendor {
        Vendor::Unknown
    }

    /// Hosts that cannot compute styles cannot export at all.
    fn supports_computed_style(&self) -> bool {
        true
    }

    fn computed_style(
        &self,
        doc: &Document,
        node: NodeId,
        pseudo: Option<PseudoElement>,
    ) -> ComputedStyle;

    /// Border box of an element in viewport coordinates.
    fn bounding_rect(&self, doc: &Document, node: NodeId) -> Rect;

    /// One border box per line fragment of an element.
    fn client_rects(&self, doc: &Document, node: NodeId) -> Vec<Rect>;

    /// One rectangle per line fragment of a text range.
    fn range_rects(&self, doc: &Document, range: TextRange) -> Vec<Rect>;

    /// Union of the range's fragments.
    fn range_bounding_rect(&self, doc: &Document, range: TextRange) -> Rect {
        let rects = self.range_rects(doc, range);
        let mut iter = rects.iter();
        match iter.next() {
            Some(first) => iter.fold(*first, |acc, r| acc.union(r)),
            None => Rect::default(),
        }
    }

    fn offset_width(&self, doc: &Document, node: NodeId) -> f32 {
        self.bounding_rect(doc, node).width
    }

    fn style_sheets(&self, doc: &Document) -> Vec<StyleSheet> {
        doc.style_sheets().to_vec()
    }

    /// Pixel contents of a `<canvas>` as a data URL.
    fn canvas_data_url(&self, _doc: &Document, _node: NodeId) -> Result<String, HostError> {
        Err(HostError::Unsupported("canvas read-back"))
    }

    /// A ready-made visual for widget elements (`data-role`), in the
    /// widget's local coordinates.
    fn export_visual(&self, _doc: &Document, _node: NodeId) -> Option<Group> {
        None
    }
}
