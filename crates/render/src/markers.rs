//! List item markers.
//!
//! A marker is drawn by inserting an absolutely positioned stand-in holding
//! the bullet glyph or ordinal as the item's first child and rendering it
//! like any other element.

use crate::STAND_IN_TAG;
use drawdom_dom::{Document, InlineStyle, NodeId};
use drawdom_layout::SPLIT_INDEX_ATTR;
use drawdom_style::{ComputedStyle, ListStylePosition, ListStyleType};

/// Marker text for the item at zero-based `index`, `None` when the list
/// style draws nothing.
pub fn marker_text(list_type: ListStyleType, index: usize) -> Option<String> {
    match list_type.glyph() {
        Some(glyph) => Some(glyph.to_string()),
        None => list_type.ordinal(index).map(|n| format!("{n}.")),
    }
}

/// Position of the item in its list. Items of a list split across pages
/// carry their original position in an attribute.
pub fn item_index(doc: &Document, item: NodeId) -> usize {
    if let Some(index) = doc
        .attr(item, SPLIT_INDEX_ATTR)
        .and_then(|v| v.trim().parse::<usize>().ok())
    {
        return index;
    }
    doc.parent(item)
        .and_then(|list| doc.element_children(list).iter().position(|&c| c == item))
        .unwrap_or(0)
}

fn marker_style(list_type: ListStyleType, position: ListStylePosition) -> InlineStyle {
    let mut css = InlineStyle::default();
    css.set("position", "absolute", false);
    css.set("box-sizing", "border-box", false);
    match position {
        ListStylePosition::Outside => {
            css.set("width", "6em", false);
            css.set("left", "-6.8em", false);
            css.set("text-align", "right", false);
        }
        ListStylePosition::Inside => css.set("left", "0px", false),
    }
    if list_type.glyph().is_some() {
        css.set("font-size", "60%", false);
        css.set("line-height", "200%", false);
        css.set("padding-right", "0.5em", false);
        css.set("font-family", "DejaVu Serif", false);
    }
    css
}

/// Inserts the marker stand-in for `item` and returns it. The caller
/// renders it and detaches it again.
pub fn insert_marker(doc: &mut Document, item: NodeId, style: &ComputedStyle) -> Option<NodeId> {
    let list_type = ListStyleType::from_css(style.get("list-style-type"));
    let text = marker_text(list_type, item_index(doc, item))?;
    let marker = doc.create_element(STAND_IN_TAG);
    doc.set_inline_style(
        marker,
        marker_style(list_type, ListStylePosition::from_css(style.get("list-style-position"))),
    );
    doc.set_text_content(marker, &text);
    doc.prepend_child(item, marker);
    Some(marker)
}
