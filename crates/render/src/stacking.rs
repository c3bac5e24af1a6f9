//! Paint order among siblings.
//!
//! Children are painted in four passes (blocks, floats, inline content,
//! positioned boxes) and each pass is ordered by `z-index`. Elements
//! without a numeric `z-index` compare asymmetrically: a static box goes
//! before a positioned one, but two boxes that are each static or absolute
//! keep their document order.

use drawdom_style::{ComputedStyle, parse_float};
use std::cmp::Ordering;

/// The four paint passes over an element's children, in paint order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Blocks,
    Floats,
    Inline,
    Positioned,
}

impl Layer {
    pub const PAINT_ORDER: [Layer; 4] = [Layer::Blocks, Layer::Floats, Layer::Inline, Layer::Positioned];

    pub fn of(style: &ComputedStyle) -> Self {
        if style.get("position") != "static" {
            Layer::Positioned
        } else if style.get("display") == "inline" {
            Layer::Inline
        } else if style.get("float") != "none" {
            Layer::Floats
        } else {
            Layer::Blocks
        }
    }
}

/// Numeric `z-index`, `None` for `auto`.
pub fn z_index(style: &ComputedStyle) -> Option<f32> {
    match style.get("z-index") {
        "auto" => None,
        value => parse_float(value),
    }
}

pub fn creates_stacking_context(style: &ComputedStyle) -> bool {
    let transform = style.get("transform");
    (!transform.is_empty() && transform != "none")
        || (style.get("position") != "static" && style.get("z-index") != "auto")
        || style.number("opacity").is_some_and(|o| o < 1.0)
}

pub fn compare_z(a: &ComputedStyle, b: &ComputedStyle) -> Ordering {
    let sign = |z: f32| match z {
        z if z == 0.0 => Ordering::Equal,
        z if z > 0.0 => Ordering::Greater,
        _ => Ordering::Less,
    };
    match (z_index(a), z_index(b)) {
        (None, None) => {
            let (pa, pb) = (a.get("position"), b.get("position"));
            let flow = |p: &str| p == "static" || p == "absolute";
            if flow(pa) && flow(pb) {
                Ordering::Equal
            } else if pa == "static" {
                Ordering::Less
            } else if pb == "static" {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        }
        (None, Some(zb)) => sign(zb).reverse(),
        (Some(za), None) => sign(za),
        (Some(za), Some(zb)) => za.partial_cmp(&zb).unwrap_or(Ordering::Equal),
    }
}

/// Stable insertion sort. Unlike `sort_by` it tolerates comparators that
/// are not a total order, which [`compare_z`] is not.
pub fn stable_sort_by<T>(items: &mut [T], mut compare: impl FnMut(&T, &T) -> Ordering) {
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && compare(&items[j - 1], &items[j]) == Ordering::Greater {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
}
