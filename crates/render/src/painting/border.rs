//! Border painting for one box fragment.
//!
//! Three strategies, cheapest first: a single stroked outline when all four
//! sides match, straight stroked lines for thin square borders, and
//! otherwise four filled edge shapes. Each edge shape is drawn as if it were
//! the top border of a box lying along the x axis, then rotated into place.

use drawdom_layout::{
    BorderEdge, Borders, CornerRadii, CornerRadius, RoundBoxKind, adjust_border_radius_for_box,
    element_round_box,
};
use drawdom_scene::{Arc, Element, Group, Path};
use drawdom_style::ComputedStyle;
use drawdom_types::{Color, Edges, Matrix, Point, Rect};

/// Which sides of a fragmented inline box carry a vertical border.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentSides {
    pub left: bool,
    pub right: bool,
}

impl FragmentSides {
    /// The left border belongs to the fragment where the box starts in its
    /// writing direction, the right one to where it ends.
    pub fn new(first: bool, last: bool, rtl: bool) -> Self {
        Self {
            left: if rtl { last } else { first },
            right: if rtl { first } else { last },
        }
    }
}

fn width(edge: &BorderEdge) -> f32 {
    match edge.style.as_str() {
        "none" | "hidden" => 0.0,
        _ => edge.width.max(0.0),
    }
}

fn color(edge: &BorderEdge) -> Color {
    edge.color.clone().unwrap_or_else(Color::transparent)
}

fn stroked_line(edge: &BorderEdge, from: Point, to: Point) -> Element {
    Element::Path(
        Path::new()
            .move_to(from.x, from.y)
            .line_to(to.x, to.y)
            .with_stroke(color(edge), width(edge)),
    )
}

/// Border elements for the fragment `rect`.
pub fn paint_borders(style: &ComputedStyle, rect: Rect, sides: FragmentSides) -> Vec<Element> {
    let borders = Borders::from_style(style);
    let (top, right, bottom, left) = (
        width(&borders.top),
        width(&borders.right),
        width(&borders.bottom),
        width(&borders.left),
    );
    if top == 0.0 && right == 0.0 && bottom == 0.0 && left == 0.0 {
        return Vec::new();
    }
    let draw_left = left > 0.0 && sides.left;
    let draw_right = right > 0.0 && sides.right;

    let same_color = borders.top.color == borders.right.color
        && borders.top.color == borders.bottom.color
        && borders.top.color == borders.left.color;
    let same_width = top == right && top == bottom && top == left;
    if same_color && same_width && draw_left && draw_right {
        let half = top / 2.0;
        let inset = rect.inset(&Edges::all(half));
        let outline = element_round_box(style, &inset, RoundBoxKind::Inset(half));
        return vec![Element::Path(outline.with_stroke(color(&borders.top), top))];
    }

    let radii = CornerRadii::from_style(style);
    let square = [radii.top_left, radii.top_right, radii.bottom_right, radii.bottom_left]
        .iter()
        .all(|r| r.x == 0.0);
    if square && top < 2.0 && right < 2.0 && bottom < 2.0 && left < 2.0 {
        let mut out = Vec::new();
        if top > 0.0 {
            let y = rect.top() + top / 2.0;
            out.push(stroked_line(&borders.top, Point::new(rect.left(), y), Point::new(rect.right(), y)));
        }
        if bottom > 0.0 {
            let y = rect.bottom() - bottom / 2.0;
            out.push(stroked_line(&borders.bottom, Point::new(rect.left(), y), Point::new(rect.right(), y)));
        }
        if draw_left {
            let x = rect.left() + left / 2.0;
            out.push(stroked_line(&borders.left, Point::new(x, rect.top()), Point::new(x, rect.bottom())));
        }
        if draw_right {
            let x = rect.right() - right / 2.0;
            out.push(stroked_line(&borders.right, Point::new(x, rect.top()), Point::new(x, rect.bottom())));
        }
        return out;
    }

    let r = adjust_border_radius_for_box(&rect, &radii);
    let flip = |c: CornerRadius| CornerRadius::new(c.y, c.x);
    [
        edge_group(
            color(&borders.top),
            EdgeGeometry {
                len: rect.width,
                width: top,
                left,
                right,
                radius_left: r.top_left,
                radius_right: r.top_right,
            },
            Matrix::new(1.0, 0.0, 0.0, 1.0, rect.left(), rect.top()),
        ),
        edge_group(
            color(&borders.bottom),
            EdgeGeometry {
                len: rect.width,
                width: bottom,
                left: right,
                right: left,
                radius_left: r.bottom_right,
                radius_right: r.bottom_left,
            },
            Matrix::new(-1.0, 0.0, 0.0, -1.0, rect.right(), rect.bottom()),
        ),
        edge_group(
            color(&borders.left),
            EdgeGeometry {
                len: rect.height,
                width: left,
                left: bottom,
                right: top,
                radius_left: flip(r.bottom_left),
                radius_right: flip(r.top_left),
            },
            Matrix::new(0.0, -1.0, 1.0, 0.0, rect.left(), rect.bottom()),
        ),
        edge_group(
            color(&borders.right),
            EdgeGeometry {
                len: rect.height,
                width: right,
                left: top,
                right: bottom,
                radius_left: flip(r.top_right),
                radius_right: flip(r.bottom_right),
            },
            Matrix::new(0.0, 1.0, -1.0, 0.0, rect.right(), rect.top()),
        ),
    ]
    .into_iter()
    .flatten()
    .map(Element::Group)
    .collect()
}

/// One edge in canonical orientation: a top border of length `len` and
/// thickness `width`, meeting side borders `left` and `right`.
#[derive(Debug, Clone, Copy)]
struct EdgeGeometry {
    len: f32,
    width: f32,
    left: f32,
    right: f32,
    radius_left: CornerRadius,
    radius_right: CornerRadius,
}

fn edge_group(color: Color, edge: EdgeGeometry, transform: Matrix) -> Option<Group> {
    if edge.width <= 0.0 {
        return None;
    }
    let rl = edge.radius_left.sanitized();
    let rr = edge.radius_right.sanitized();
    let mut group = Group {
        transform: Some(transform),
        ..Group::default()
    };

    let start = if rl.x > 0.0 { rl.x.max(edge.left) } else { 0.0 };
    let end = edge.len - if rr.x > 0.0 { rr.x.max(edge.right) } else { 0.0 };
    group.append(
        Path::new()
            .move_to(start, 0.0)
            .line_to(end, 0.0)
            .line_to(edge.len - rr.x.max(edge.right), edge.width)
            .line_to(rl.x.max(edge.left), edge.width)
            .close()
            .with_fill(color.clone()),
    );
    if rl.x > 0.0 {
        group.append(round_corner(&color, edge.width, edge.left, rl, Matrix::new(-1.0, 0.0, 0.0, 1.0, rl.x, 0.0)));
    }
    if rr.x > 0.0 {
        group.append(round_corner(
            &color,
            edge.width,
            edge.right,
            rr,
            Matrix::new(1.0, 0.0, 0.0, 1.0, edge.len - rr.x, 0.0),
        ));
    }
    Some(group)
}

/// This edge's half of a rounded corner: the wedge of the ring between the
/// outer ellipse `r` and the inner one, cut at the angle where the two
/// border widths meet.
fn round_corner(color: &Color, top: f32, side: f32, r: CornerRadius, transform: Matrix) -> Path {
    let angle = std::f32::consts::FRAC_PI_2 * side / (side + top);
    let split = -angle.to_degrees();
    // The inner radii may go negative; the fallbacks below still cover the
    // wedge in that case.
    let inner = CornerRadius::new(r.x - side, r.y - top);
    let center = Point::new(0.0, r.y);

    let path = Path::new().move_to(0.0, 0.0).arc(&Arc {
        center,
        radius_x: r.x,
        radius_y: r.y,
        start_angle: -90.0,
        end_angle: split,
        anticlockwise: false,
    });
    let path = if inner.x > 0.0 && inner.y > 0.0 {
        path.line_to(inner.x * angle.cos(), r.y - inner.y * angle.sin()).arc(&Arc {
            center,
            radius_x: inner.x,
            radius_y: inner.y,
            start_angle: split,
            end_angle: -90.0,
            anticlockwise: true,
        })
    } else if inner.x > 0.0 {
        path.line_to(inner.x, top).line_to(0.0, top)
    } else {
        path.line_to(inner.x, top).line_to(inner.x, 0.0)
    };
    path.close().with_fill(color.clone()).with_transform(transform)
}

#[cfg(test)]
mod tests {
    use super::*;
    use drawdom_scene::Fill;
    use drawdom_style::Vendor;

    fn style(pairs: &[(&str, &str)]) -> ComputedStyle {
        ComputedStyle::from_pairs(Vendor::Unknown, pairs.iter().copied())
    }

    fn border(width: &str, color: &str) -> Vec<(String, String)> {
        ["top", "right", "bottom", "left"]
            .iter()
            .flat_map(|side| {
                [
                    (format!("border-{side}-width"), width.to_string()),
                    (format!("border-{side}-style"), "solid".to_string()),
                    (format!("border-{side}-color"), color.to_string()),
                ]
            })
            .collect()
    }

    const WHOLE: FragmentSides = FragmentSides { left: true, right: true };

    #[test]
    fn borderless_boxes_paint_nothing() {
        let s = style(&[("border-top-width", "0px")]);
        assert!(paint_borders(&s, Rect::new(0.0, 0.0, 10.0, 10.0), WHOLE).is_empty());

        let hidden = ComputedStyle::from_pairs(
            Vendor::Unknown,
            border("3px", "red").into_iter().map(|(k, v)| (k.clone(), if k.ends_with("style") { "none".into() } else { v })),
        );
        assert!(paint_borders(&hidden, Rect::new(0.0, 0.0, 10.0, 10.0), WHOLE).is_empty());
    }

    #[test]
    fn uniform_borders_are_one_stroke() {
        let s = ComputedStyle::from_pairs(Vendor::Unknown, border("4px", "rgb(255, 0, 0)"));
        let out = paint_borders(&s, Rect::new(0.0, 0.0, 100.0, 50.0), WHOLE);
        assert_eq!(out.len(), 1);
        let Element::Path(path) = &out[0] else {
            panic!("expected a path");
        };
        let stroke = path.stroke.as_ref().map(|s| s.width);
        assert_eq!(stroke, Some(4.0));
        assert_eq!(path.bbox(None), Rect::new(2.0, 2.0, 96.0, 46.0));
    }

    #[test]
    fn thin_square_borders_are_segments() {
        let mut pairs = border("1px", "rgb(0, 0, 0)");
        pairs.push(("border-left-color".into(), "rgb(0, 0, 255)".into()));
        let s = ComputedStyle::from_pairs(Vendor::Unknown, pairs);
        let out = paint_borders(&s, Rect::new(0.0, 0.0, 100.0, 50.0), WHOLE);
        assert_eq!(out.len(), 4);

        let middle = paint_borders(&s, Rect::new(0.0, 0.0, 100.0, 50.0), FragmentSides::new(false, false, false));
        assert_eq!(middle.len(), 2);
        let last_rtl = paint_borders(&s, Rect::new(0.0, 0.0, 100.0, 50.0), FragmentSides::new(false, true, true));
        assert_eq!(last_rtl.len(), 3);
    }

    #[test]
    fn mixed_borders_are_edge_groups() {
        let mut pairs = border("4px", "rgb(0, 0, 0)");
        pairs.push(("border-top-width".into(), "8px".into()));
        pairs.push(("border-top-left-radius".into(), "10px".into()));
        let s = ComputedStyle::from_pairs(Vendor::Unknown, pairs);
        let out = paint_borders(&s, Rect::new(0.0, 0.0, 100.0, 50.0), WHOLE);
        assert_eq!(out.len(), 4);

        let Element::Group(top) = &out[0] else {
            panic!("expected a group");
        };
        // Straight section plus the left corner wedge.
        assert_eq!(top.children.len(), 2);
        assert_eq!(top.transform, Some(Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)));
        let Element::Path(main) = &top.children[0] else {
            panic!("expected a path");
        };
        assert!(matches!(main.fill, Some(Fill::Color(_))));
        assert_eq!(main.bbox(None), Rect::new(10.0, 0.0, 90.0, 8.0));

        // The bottom edge has no rounded corners.
        let Element::Group(bottom) = &out[1] else {
            panic!("expected a group");
        };
        assert_eq!(bottom.children.len(), 1);
    }

    #[test]
    fn corner_wedges_start_at_the_edge() {
        let wedge = round_corner(&Color::BLACK, 4.0, 4.0, CornerRadius::new(10.0, 10.0), Matrix::unit());
        let points: Vec<Point> = wedge.points().collect();
        assert_eq!(points[0], Point::new(0.0, 0.0));
        let bbox = wedge.bbox(None);
        assert!(bbox.right() <= 10.0 + 1e-3 && bbox.bottom() <= 10.0 + 1e-3, "{bbox:?}");
    }
}
