//! Box geometry derived from computed styles: border edges, corner radii and
//! rounded-rectangle paths.

use drawdom_scene::{Arc, Path};
use drawdom_style::ComputedStyle;
use drawdom_style::parsers::parse_radius;
use drawdom_types::{Color, Edges, Point, Rect};

/// One side of a border as computed by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct BorderEdge {
    pub width: f32,
    pub style: String,
    pub color: Option<Color>,
}

impl BorderEdge {
    pub fn from_style(style: &ComputedStyle, side: Side) -> Self {
        let prefix = format!("border-{}", side.name());
        Self {
            width: style.px(&format!("{prefix}-width")),
            style: style.get(&format!("{prefix}-style")).to_string(),
            color: drawdom_style::parse_color(style.get(&format!("{prefix}-color"))),
        }
    }

    /// Whether the edge paints anything.
    pub fn is_visible(&self) -> bool {
        self.width > 0.0
            && self.style != "none"
            && self.style != "hidden"
            && self.color.as_ref().is_some_and(|c| !c.is_transparent())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    pub fn name(self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Right => "right",
            Side::Bottom => "bottom",
            Side::Left => "left",
        }
    }
}

/// All four border edges, CSS order.
#[derive(Debug, Clone, PartialEq)]
pub struct Borders {
    pub top: BorderEdge,
    pub right: BorderEdge,
    pub bottom: BorderEdge,
    pub left: BorderEdge,
}

impl Borders {
    pub fn from_style(style: &ComputedStyle) -> Self {
        Self {
            top: BorderEdge::from_style(style, Side::Top),
            right: BorderEdge::from_style(style, Side::Right),
            bottom: BorderEdge::from_style(style, Side::Bottom),
            left: BorderEdge::from_style(style, Side::Left),
        }
    }

    pub fn widths(&self) -> Edges {
        Edges::new(self.top.width, self.right.width, self.bottom.width, self.left.width)
    }
}

/// Border widths as edges.
pub fn border_widths(style: &ComputedStyle) -> Edges {
    sided(style, "border-", "-width")
}

pub fn padding(style: &ComputedStyle) -> Edges {
    sided(style, "padding-", "")
}

fn sided(style: &ComputedStyle, prefix: &str, suffix: &str) -> Edges {
    let px = |side: Side| style.px(&format!("{prefix}{}{suffix}", side.name()));
    Edges::new(px(Side::Top), px(Side::Right), px(Side::Bottom), px(Side::Left))
}

/// Shrinks a box by per-side amounts (border widths or padding).
pub fn inner_box(rect: Rect, edges: &Edges) -> Rect {
    rect.inset(edges)
}

/// Content box of a border box.
pub fn content_box(rect: Rect, style: &ComputedStyle) -> Rect {
    inner_box(inner_box(rect, &border_widths(style)), &padding(style))
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CornerRadius {
    pub x: f32,
    pub y: f32,
}

impl CornerRadius {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// A corner with a non-positive component is square.
    pub fn sanitized(self) -> Self {
        if self.x <= 0.0 || self.y <= 0.0 {
            Self::default()
        } else {
            self
        }
    }

    fn shrink(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x - dx, self.y - dy)
    }

    fn clamped(self) -> Self {
        Self::new(self.x.max(0.0), self.y.max(0.0))
    }

    fn scaled(self, f: f32) -> Self {
        Self::new(self.x * f, self.y * f)
    }
}

/// Radii in CSS order: top-left, top-right, bottom-right, bottom-left.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CornerRadii {
    pub top_left: CornerRadius,
    pub top_right: CornerRadius,
    pub bottom_right: CornerRadius,
    pub bottom_left: CornerRadius,
}

impl CornerRadii {
    pub fn new(
        top_left: CornerRadius,
        top_right: CornerRadius,
        bottom_right: CornerRadius,
        bottom_left: CornerRadius,
    ) -> Self {
        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    pub fn uniform(r: f32) -> Self {
        let c = CornerRadius::new(r, r);
        Self::new(c, c, c, c)
    }

    /// Reads the four `border-*-radius` properties, sanitizing each corner.
    pub fn from_style(style: &ComputedStyle) -> Self {
        let corner = |name: &str| {
            let (x, y) = parse_radius(style.get(&format!("border-{name}-radius")));
            CornerRadius::new(x, y).sanitized()
        };
        Self::new(
            corner("top-left"),
            corner("top-right"),
            corner("bottom-right"),
            corner("bottom-left"),
        )
    }

    pub fn is_zero(&self) -> bool {
        [self.top_left, self.top_right, self.bottom_right, self.bottom_left]
            .iter()
            .all(|c| c.x == 0.0 && c.y == 0.0)
    }

    /// Reduces each corner by the adjacent edges (border widths, padding).
    pub fn shrink(&self, edges: &Edges) -> Self {
        Self::new(
            self.top_left.shrink(edges.left, edges.top),
            self.top_right.shrink(edges.right, edges.top),
            self.bottom_right.shrink(edges.right, edges.bottom),
            self.bottom_left.shrink(edges.left, edges.bottom),
        )
    }

    fn map(&self, f: impl Fn(CornerRadius) -> CornerRadius) -> Self {
        Self::new(
            f(self.top_left),
            f(self.top_right),
            f(self.bottom_right),
            f(self.bottom_left),
        )
    }
}

/// Clamps radii at zero and scales all of them by one factor so that the
/// radii along every side fit that side.
pub fn adjust_border_radius_for_box(rect: &Rect, radii: &CornerRadii) -> CornerRadii {
    let r = radii.map(CornerRadius::clamped);
    let ratio = |len: f32, sum: f32| if sum > 0.0 { len / sum } else { f32::INFINITY };
    let f = ratio(rect.width, r.top_left.x + r.top_right.x)
        .min(ratio(rect.height, r.top_right.y + r.bottom_right.y))
        .min(ratio(rect.width, r.bottom_right.x + r.bottom_left.x))
        .min(ratio(rect.height, r.bottom_left.y + r.top_left.y));
    if f < 1.0 {
        r.map(|c| c.scaled(f))
    } else {
        r
    }
}

fn corner_arc(path: Path, cx: f32, cy: f32, r: CornerRadius, start: f32, end: f32) -> Path {
    if r.x == 0.0 {
        return path;
    }
    path.arc(&Arc {
        center: Point::new(cx, cy),
        radius_x: r.x,
        radius_y: r.y,
        start_angle: start,
        end_angle: end,
        anticlockwise: false,
    })
}

/// A closed rounded rectangle, drawn clockwise from the top-left corner.
/// The path carries neither fill nor stroke.
pub fn round_box(rect: &Rect, radii: &CornerRadii) -> Path {
    let r = adjust_border_radius_for_box(rect, radii);
    let (l, t, rt, b) = (rect.left(), rect.top(), rect.right(), rect.bottom());

    let path = Path::new().move_to(l, t + r.top_left.y);
    let path = corner_arc(path, l + r.top_left.x, t + r.top_left.y, r.top_left, -180.0, -90.0);
    let path = path.line_to(rt - r.top_right.x, t);
    let path = corner_arc(path, rt - r.top_right.x, t + r.top_right.y, r.top_right, -90.0, 0.0);
    let path = path.line_to(rt, b - r.bottom_right.y);
    let path = corner_arc(
        path,
        rt - r.bottom_right.x,
        b - r.bottom_right.y,
        r.bottom_right,
        0.0,
        90.0,
    );
    let path = path.line_to(l + r.bottom_left.x, b);
    let path = corner_arc(path, l + r.bottom_left.x, b - r.bottom_left.y, r.bottom_left, 90.0, 180.0);
    path.close()
}

/// Which box of an element a rounded outline follows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoundBoxKind {
    Border,
    Padding,
    Content,
    /// The border outline pulled in by a fixed amount.
    Inset(f32),
}

/// The element's rounded outline for `rect`, with radii reduced by the
/// borders (padding box), borders and padding (content box) or a fixed
/// inset.
pub fn element_round_box(style: &ComputedStyle, rect: &Rect, kind: RoundBoxKind) -> Path {
    let mut radii = CornerRadii::from_style(style);
    match kind {
        RoundBoxKind::Border => {}
        RoundBoxKind::Padding => radii = radii.shrink(&border_widths(style)),
        RoundBoxKind::Content => {
            radii = radii.shrink(&border_widths(style)).shrink(&padding(style));
        }
        RoundBoxKind::Inset(d) => radii = radii.shrink(&Edges::all(d)),
    }
    round_box(rect, &radii)
}
