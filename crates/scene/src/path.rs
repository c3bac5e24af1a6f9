use crate::arc::Arc;
use drawdom_types::{Color, Matrix, Point, Rect, geometry::bounding_box};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum PathCommand {
    MoveTo { to: Point },
    LineTo { to: Point },
    CurveTo { c1: Point, c2: Point, to: Point },
    Close,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Color,
}

/// A linear gradient. With `user_space == false` the points are in
/// object-bounding-box units (0..1 across the filled shape).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearGradient {
    pub start: Point,
    pub end: Point,
    pub stops: Vec<GradientStop>,
    pub user_space: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Fill {
    Color(Color),
    LinearGradient(LinearGradient),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Path {
    pub commands: Vec<PathCommand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Fill>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Stroke>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<Matrix>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rect(rect: Rect) -> Self {
        Path::new()
            .move_to(rect.left(), rect.top())
            .line_to(rect.right(), rect.top())
            .line_to(rect.right(), rect.bottom())
            .line_to(rect.left(), rect.bottom())
            .close()
    }

    /// A closed ellipse inscribed in `rect`.
    pub fn ellipse(rect: Rect) -> Self {
        let arc = Arc {
            center: Point::new(rect.x + rect.width / 2.0, rect.y + rect.height / 2.0),
            radius_x: rect.width / 2.0,
            radius_y: rect.height / 2.0,
            start_angle: 0.0,
            end_angle: 360.0,
            anticlockwise: false,
        };
        let start = arc.point_at(0.0);
        Path::new().move_to(start.x, start.y).arc(&arc).close()
    }

    pub fn move_to(mut self, x: f32, y: f32) -> Self {
        self.commands.push(PathCommand::MoveTo { to: Point::new(x, y) });
        self
    }

    pub fn line_to(mut self, x: f32, y: f32) -> Self {
        self.commands.push(PathCommand::LineTo { to: Point::new(x, y) });
        self
    }

    pub fn curve_to(mut self, c1: Point, c2: Point, to: Point) -> Self {
        self.commands.push(PathCommand::CurveTo { c1, c2, to });
        self
    }

    /// Appends the arc as curves from the current point, which is expected to
    /// be the arc start.
    pub fn arc(mut self, arc: &Arc) -> Self {
        let points = arc.curve_points();
        for chunk in points[1..].chunks_exact(3) {
            self.commands.push(PathCommand::CurveTo {
                c1: chunk[0],
                c2: chunk[1],
                to: chunk[2],
            });
        }
        self
    }

    pub fn close(mut self) -> Self {
        self.commands.push(PathCommand::Close);
        self
    }

    pub fn with_fill(mut self, color: Color) -> Self {
        self.fill = Some(Fill::Color(color));
        self
    }

    pub fn with_gradient(mut self, gradient: LinearGradient) -> Self {
        self.fill = Some(Fill::LinearGradient(gradient));
        self
    }

    pub fn with_stroke(mut self, color: Color, width: f32) -> Self {
        self.stroke = Some(Stroke { color, width });
        self
    }

    pub fn with_transform(mut self, m: Matrix) -> Self {
        self.transform = Some(m);
        self
    }

    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.commands.iter().flat_map(|c| match c {
            PathCommand::MoveTo { to } | PathCommand::LineTo { to } => vec![*to],
            PathCommand::CurveTo { c1, c2, to } => vec![*c1, *c2, *to],
            PathCommand::Close => Vec::new(),
        })
    }

    /// Bounding box of the path (control points included) after applying
    /// the path's own transform and then `matrix`.
    pub fn bbox(&self, matrix: Option<&Matrix>) -> Rect {
        let own = self.transform.unwrap_or_default();
        let m = match matrix {
            Some(outer) => outer.multiply(&own),
            None => own,
        };
        let points: Vec<Point> = self.points().map(|p| p.transform(&m)).collect();
        bounding_box(&points).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_path_bbox() {
        let p = Path::from_rect(Rect::new(10.0, 20.0, 30.0, 40.0));
        assert_eq!(p.commands.len(), 5);
        assert_eq!(p.bbox(None), Rect::new(10.0, 20.0, 30.0, 40.0));
        let moved = p.bbox(Some(&Matrix::translate(5.0, 5.0)));
        assert_eq!(moved, Rect::new(15.0, 25.0, 30.0, 40.0));
    }

    #[test]
    fn ellipse_stays_inside_box() {
        let r = Rect::new(0.0, 0.0, 20.0, 10.0);
        let bbox = Path::ellipse(r).bbox(None);
        assert!(bbox.left() >= -0.01 && bbox.right() <= 20.01);
        assert!(bbox.top() >= -3.0 && bbox.bottom() <= 13.0);
    }
}
