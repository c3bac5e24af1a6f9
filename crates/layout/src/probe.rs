//! Measuring text ranges.
//!
//! The text engine and the paginator only ever ask one question: where does
//! this slice of a text node end up on screen? [`RangeProbe`] is that
//! question; [`HostProbe`] answers it from a live [`LayoutHost`].

use drawdom_dom::Document;
use drawdom_traits::{LayoutHost, TextRange};
use drawdom_types::Rect;

pub trait RangeProbe {
    /// Bounding box of the characters `[range.start, range.end)`.
    fn probe(&self, range: TextRange) -> Rect;
}

/// Probes ranges through the host.
pub struct HostProbe<'a> {
    host: &'a dyn LayoutHost,
    doc: &'a Document,
    filter_slivers: bool,
}

impl<'a> HostProbe<'a> {
    pub fn new(host: &'a dyn LayoutHost, doc: &'a Document) -> Self {
        Self {
            host,
            doc,
            filter_slivers: host.vendor().reports_sliver_rects(),
        }
    }
}

impl RangeProbe for HostProbe<'_> {
    fn probe(&self, range: TextRange) -> Rect {
        if self.filter_slivers {
            let rects = self.host.range_rects(self.doc, range);
            if let Some(rect) = single_solid_rect(&rects) {
                return rect;
            }
        }
        self.host.range_bounding_rect(self.doc, range)
    }
}

/// Some engines report stray 0 or 1px wide rectangles next to the real one.
/// When at most three rectangles come back and all but one are such
/// slivers, the remaining one is the range's true box.
pub fn single_solid_rect(rects: &[Rect]) -> Option<Rect> {
    if rects.is_empty() || rects.len() > 3 {
        return None;
    }
    let mut solid = rects.iter().filter(|r| r.width > 1.0);
    match (solid.next(), solid.next()) {
        (Some(rect), None) => Some(*rect),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_only_wide_rect() {
        let rects = [
            Rect::new(0.0, 0.0, 1.0, 10.0),
            Rect::new(1.0, 0.0, 40.0, 10.0),
            Rect::new(41.0, 0.0, 0.0, 10.0),
        ];
        assert_eq!(single_solid_rect(&rects), Some(Rect::new(1.0, 0.0, 40.0, 10.0)));
    }

    #[test]
    fn falls_back_for_multi_line_ranges() {
        let rects = [Rect::new(0.0, 0.0, 40.0, 10.0), Rect::new(0.0, 10.0, 20.0, 10.0)];
        assert_eq!(single_solid_rect(&rects), None);
        assert_eq!(single_solid_rect(&[]), None);
        let many = [Rect::new(0.0, 0.0, 0.5, 1.0); 4];
        assert_eq!(single_solid_rect(&many), None);
    }
}
