//! Background color and image layers of one box fragment.

use super::gradient::gradient_fill;
use drawdom_layout::geom::{border_widths, padding};
use drawdom_layout::inner_box;
use drawdom_resource::ImageCache;
use drawdom_scene::{Element, Image, Path};
use drawdom_style::{BackgroundImage, ComputedStyle, Separator, parse_color, parse_float, split_property};
use drawdom_types::{Point, Rect};

/// Upper bound on tiles per layer; a tiny tile repeated over a huge box
/// would otherwise produce millions of elements.
const MAX_TILES: usize = 10_000;

/// The per-layer placement properties, each taken from its comma-separated
/// list with wrap-around.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerPlacement {
    pub repeat: String,
    pub position: String,
    pub origin: String,
    pub size: String,
}

impl LayerPlacement {
    pub fn for_layer(style: &ComputedStyle, index: usize) -> Self {
        let pick = |prop: &str, default: &str| {
            let values = split_property(style.get(prop), Separator::Comma);
            match values.len() {
                0 => default.to_string(),
                n => values[index % n].clone(),
            }
        };
        Self {
            repeat: pick("background-repeat", "repeat"),
            position: pick("background-position", "0% 0%"),
            origin: pick("background-origin", "padding-box"),
            size: pick("background-size", "auto"),
        }
    }
}

/// The box a layer is positioned against.
pub fn origin_box(style: &ComputedStyle, rect: Rect, origin: &str) -> Rect {
    match origin {
        "content-box" => inner_box(inner_box(rect, &border_widths(style)), &padding(style)),
        "padding-box" => inner_box(rect, &border_widths(style)),
        _ => rect,
    }
}

/// Tile size for `background-size`. `None` when the result cannot be drawn.
pub fn tile_size(size: &str, origin: &Rect, intrinsic: (f32, f32)) -> Option<(f32, f32)> {
    let (iw, ih) = intrinsic;
    if iw <= 0.0 || ih <= 0.0 {
        return None;
    }
    let aspect = iw / ih;
    let parts: Vec<&str> = size.split_whitespace().collect();
    let (w, h) = match parts.as_slice() {
        [] | ["auto"] | ["auto", "auto"] => (iw, ih),
        ["cover"] => {
            let scale = (origin.width / iw).max(origin.height / ih);
            (iw * scale, ih * scale)
        }
        ["contain"] => {
            let scale = (origin.width / iw).min(origin.height / ih);
            (iw * scale, ih * scale)
        }
        [width, rest @ ..] => {
            let w = match *width {
                "auto" => None,
                value => length(value, origin.width),
            };
            let h = match rest.first().copied() {
                None | Some("auto") => None,
                Some(value) => length(value, origin.height),
            };
            match (w, h) {
                (Some(w), Some(h)) => (w, h),
                (Some(w), None) => (w, w / aspect),
                (None, Some(h)) => (h * aspect, h),
                (None, None) => (iw, ih),
            }
        }
    };
    (w > 0.0 && h > 0.0 && w.is_finite() && h.is_finite()).then_some((w, h))
}

/// A px length or a percentage of `base`.
fn length(value: &str, base: f32) -> Option<f32> {
    match value.strip_suffix('%') {
        Some(percent) => parse_float(percent).map(|p| base * p / 100.0),
        None => parse_float(value),
    }
}

fn keyword_percent(value: &str) -> Option<&'static str> {
    match value {
        "left" | "top" => Some("0%"),
        "center" => Some("50%"),
        "right" | "bottom" => Some("100%"),
        _ => None,
    }
}

/// Top-left corner of the first tile for `background-position`.
pub fn tile_origin(position: &str, origin: &Rect, tile: (f32, f32)) -> Point {
    let mut parts: Vec<&str> = position.split_whitespace().collect();
    if matches!(parts.first(), Some(&"top") | Some(&"bottom")) {
        parts.reverse();
    }
    let x = parts.first().copied().unwrap_or("0%");
    let y = parts.get(1).copied().unwrap_or("50%");
    let x = keyword_percent(x).unwrap_or(x);
    let y = keyword_percent(y).unwrap_or(y);
    Point::new(
        origin.x + length(x, origin.width - tile.0).unwrap_or(0.0),
        origin.y + length(y, origin.height - tile.1).unwrap_or(0.0),
    )
}

/// Tiles covering `area` for `background-repeat`, starting from `first`.
/// Repeated axes are rewound so the tiling starts at or before the area's
/// edge.
pub fn tile_rects(repeat: &str, first: Rect, area: &Rect) -> Vec<Rect> {
    let (w, h) = (first.width, first.height);
    let (repeat_x, repeat_y) = match repeat {
        "no-repeat" => (false, false),
        "repeat-x" => (true, false),
        "repeat-y" => (false, true),
        "repeat" => (true, true),
        _ => return Vec::new(),
    };
    if !repeat_x && !repeat_y {
        return vec![first];
    }
    if w <= 0.0 || h <= 0.0 || !first.x.is_finite() || !first.y.is_finite() {
        return Vec::new();
    }
    let mut x = first.x;
    let mut y = first.y;
    if repeat_x && x > area.left() {
        x -= ((x - area.left()) / w).ceil() * w;
    }
    if repeat_y && y > area.top() {
        y -= ((y - area.top()) / h).ceil() * h;
    }
    let columns: Vec<f32> = if repeat_x {
        std::iter::successors(Some(x), |x| Some(x + w))
            .take_while(|x| *x < area.right())
            .take(MAX_TILES)
            .collect()
    } else {
        vec![x]
    };
    let rows: Vec<f32> = if repeat_y {
        std::iter::successors(Some(y), |y| Some(y + h))
            .take_while(|y| *y < area.bottom())
            .take(MAX_TILES)
            .collect()
    } else {
        vec![y]
    };
    if columns.len() * rows.len() > MAX_TILES {
        log::debug!("background tiling capped at {} tiles", MAX_TILES);
    }
    rows.iter()
        .flat_map(|&y| columns.iter().map(move |&x| Rect::new(x, y, w, h)))
        .take(MAX_TILES)
        .collect()
}

fn place_layer(
    style: &ComputedStyle,
    rect: Rect,
    placement: &LayerPlacement,
    intrinsic: (f32, f32),
) -> Vec<Rect> {
    let origin = origin_box(style, rect, &placement.origin);
    let Some(size) = tile_size(&placement.size, &origin, intrinsic) else {
        return Vec::new();
    };
    let at = tile_origin(&placement.position, &origin, size);
    tile_rects(&placement.repeat, Rect::new(at.x, at.y, size.0, size.1), &rect)
}

/// Elements for one layer, in paint order.
pub fn paint_layer(
    style: &ComputedStyle,
    rect: Rect,
    layer: &BackgroundImage,
    placement: &LayerPlacement,
    images: &ImageCache,
) -> Vec<Element> {
    match layer {
        BackgroundImage::None => Vec::new(),
        BackgroundImage::Url(url) => {
            // SVG sources cannot be rasterized safely; they are left out.
            if url.to_ascii_lowercase().starts_with("data:image/svg") {
                return Vec::new();
            }
            let Some((w, h)) = images.dimensions(url) else {
                return Vec::new();
            };
            place_layer(style, rect, placement, (w as f32, h as f32))
                .into_iter()
                .map(|tile| {
                    Element::Image(Image {
                        src: url.clone(),
                        rect: tile,
                        clip: None,
                    })
                })
                .collect()
        }
        BackgroundImage::Linear(gradient) => place_layer(style, rect, placement, (rect.width, rect.height))
            .into_iter()
            .filter_map(|tile| gradient_fill(gradient, tile))
            .map(Element::Path)
            .collect(),
    }
}

/// Background color followed by every image layer, last layer first.
pub fn paint_background(
    style: &ComputedStyle,
    rect: Rect,
    layers: &[BackgroundImage],
    images: &ImageCache,
) -> Vec<Element> {
    let mut out = Vec::new();
    if let Some(color) = parse_color(style.get("background-color"))
        && !color.is_transparent()
    {
        out.push(Element::Path(Path::from_rect(rect).with_fill(color)));
    }
    for (index, layer) in layers.iter().enumerate().rev() {
        let placement = LayerPlacement::for_layer(style, index);
        out.extend(paint_layer(style, rect, layer, &placement, images));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use drawdom_style::Vendor;

    fn style(pairs: &[(&str, &str)]) -> ComputedStyle {
        ComputedStyle::from_pairs(Vendor::Unknown, pairs.iter().copied())
    }

    #[test]
    fn origin_boxes_shrink_by_borders_and_padding() {
        let s = style(&[
            ("border-top-width", "2px"),
            ("border-right-width", "2px"),
            ("border-bottom-width", "2px"),
            ("border-left-width", "2px"),
            ("padding-top", "3px"),
            ("padding-right", "3px"),
            ("padding-bottom", "3px"),
            ("padding-left", "3px"),
        ]);
        let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
        assert_eq!(origin_box(&s, rect, "border-box"), rect);
        assert_eq!(origin_box(&s, rect, "padding-box"), Rect::new(2.0, 2.0, 96.0, 46.0));
        assert_eq!(origin_box(&s, rect, "content-box"), Rect::new(5.0, 5.0, 90.0, 40.0));
    }

    #[test]
    fn sizes_keep_aspect_ratio() {
        let origin = Rect::new(0.0, 0.0, 200.0, 100.0);
        assert_eq!(tile_size("auto", &origin, (40.0, 20.0)), Some((40.0, 20.0)));
        assert_eq!(tile_size("50%", &origin, (40.0, 20.0)), Some((100.0, 50.0)));
        assert_eq!(tile_size("10px 30px", &origin, (40.0, 20.0)), Some((10.0, 30.0)));
        assert_eq!(tile_size("auto 10px", &origin, (40.0, 20.0)), Some((20.0, 10.0)));
        assert_eq!(tile_size("contain", &origin, (40.0, 40.0)), Some((100.0, 100.0)));
        assert_eq!(tile_size("cover", &origin, (40.0, 40.0)), Some((200.0, 200.0)));
        assert_eq!(tile_size("0px", &origin, (40.0, 20.0)), None);
        assert_eq!(tile_size("auto", &origin, (0.0, 20.0)), None);
    }

    #[test]
    fn positions_use_free_space() {
        let origin = Rect::new(10.0, 10.0, 200.0, 100.0);
        assert_eq!(tile_origin("50% 100%", &origin, (100.0, 20.0)), Point::new(60.0, 90.0));
        assert_eq!(tile_origin("5px", &origin, (100.0, 20.0)), Point::new(15.0, 50.0));
        assert_eq!(tile_origin("right bottom", &origin, (100.0, 20.0)), Point::new(110.0, 90.0));
        assert_eq!(tile_origin("top center", &origin, (100.0, 20.0)), Point::new(60.0, 10.0));
    }

    #[test]
    fn repeat_covers_the_whole_box() {
        let area = Rect::new(0.0, 0.0, 100.0, 50.0);
        let first = Rect::new(15.0, 5.0, 30.0, 20.0);

        assert_eq!(tile_rects("no-repeat", first, &area), vec![first]);

        let row = tile_rects("repeat-x", first, &area);
        assert_eq!(row.len(), 4);
        assert_eq!(row[0].x, -15.0);
        assert!(row.iter().all(|r| r.y == 5.0));

        let column = tile_rects("repeat-y", first, &area);
        assert_eq!(column.iter().map(|r| r.y).collect::<Vec<_>>(), vec![-15.0, 5.0, 25.0, 45.0]);

        let grid = tile_rects("repeat", first, &area);
        assert_eq!(grid.len(), 4 * 4);

        assert!(tile_rects("space", first, &area).is_empty());
    }

    #[test]
    fn aligned_tiles_fill_exactly() {
        let area = Rect::new(0.0, 0.0, 100.0, 60.0);
        let tiles = tile_rects("repeat", Rect::new(0.0, 0.0, 25.0, 20.0), &area);
        assert_eq!(tiles.len(), 4 * 3);
    }

    #[test]
    fn far_offsets_rewind_in_one_step() {
        let area = Rect::new(0.0, 0.0, 10.0, 10.0);
        let row = tile_rects("repeat-x", Rect::new(1.0e9, 0.0, 1.0, 1.0), &area);
        assert_eq!(row.len(), 10);
        assert_eq!(row[0].x, 0.0);

        let column = tile_rects("repeat-y", Rect::new(0.0, 1.0e7 + 0.5, 1.0, 1.0), &area);
        assert!(!column.is_empty());
        assert!(column[0].y <= 0.0 && column[0].y > -1.0);

        assert!(tile_rects("repeat", Rect::new(0.0, 0.0, 0.0, 5.0), &area).is_empty());
    }

    #[test]
    fn layer_lists_wrap_around() {
        let s = style(&[
            ("background-repeat", "no-repeat, repeat-x"),
            ("background-position", "0% 0%"),
        ]);
        assert_eq!(LayerPlacement::for_layer(&s, 2).repeat, "no-repeat");
        assert_eq!(LayerPlacement::for_layer(&s, 1).repeat, "repeat-x");
        assert_eq!(LayerPlacement::for_layer(&s, 1).position, "0% 0%");
        assert_eq!(LayerPlacement::for_layer(&s, 0).size, "auto");
    }
}
