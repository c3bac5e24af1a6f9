//! Elliptical arcs approximated by cubic Bézier segments.
use drawdom_types::Point;

/// An elliptical arc. Angles are in degrees, measured clockwise from the
/// positive x axis (y grows downwards), so `-90` is the top of the ellipse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arc {
    pub center: Point,
    pub radius_x: f32,
    pub radius_y: f32,
    pub start_angle: f32,
    pub end_angle: f32,
    pub anticlockwise: bool,
}

impl Arc {
    pub fn point_at(&self, degrees: f32) -> Point {
        let r = degrees.to_radians();
        Point::new(
            self.center.x + self.radius_x * r.cos(),
            self.center.y + self.radius_y * r.sin(),
        )
    }

    /// Signed sweep in degrees, positive for clockwise.
    fn sweep(&self) -> f32 {
        let (start, mut end) = (self.start_angle, self.end_angle);
        if self.anticlockwise {
            while end > start {
                end -= 360.0;
            }
        } else {
            while end < start {
                end += 360.0;
            }
        }
        end - start
    }

    /// The arc start followed by `(control1, control2, end)` triples, one per
    /// segment of at most 90 degrees.
    pub fn curve_points(&self) -> Vec<Point> {
        let sweep = self.sweep();
        let segments = ((sweep.abs() / 90.0).ceil() as usize).max(1);
        let step = sweep / segments as f32;
        let k = 4.0 / 3.0 * (step.to_radians() / 4.0).tan();

        let mut points = vec![self.point_at(self.start_angle)];
        let mut angle = self.start_angle;
        for _ in 0..segments {
            let next = angle + step;
            let (a0, a1) = (angle.to_radians(), next.to_radians());
            let p0 = self.point_at(angle);
            let p1 = self.point_at(next);
            let c1 = Point::new(
                p0.x - k * self.radius_x * a0.sin(),
                p0.y + k * self.radius_y * a0.cos(),
            );
            let c2 = Point::new(
                p1.x + k * self.radius_x * a1.sin(),
                p1.y - k * self.radius_y * a1.cos(),
            );
            points.extend([c1, c2, p1]);
            angle = next;
        }
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
    }

    #[test]
    fn quarter_arc_endpoints() {
        let arc = Arc {
            center: Point::new(10.0, 10.0),
            radius_x: 10.0,
            radius_y: 10.0,
            start_angle: -180.0,
            end_angle: -90.0,
            anticlockwise: false,
        };
        let pts = arc.curve_points();
        assert_eq!(pts.len(), 4);
        assert!(close(pts[0], Point::new(0.0, 10.0)));
        assert!(close(pts[3], Point::new(10.0, 0.0)));
    }

    #[test]
    fn anticlockwise_takes_short_way() {
        let arc = Arc {
            center: Point::new(0.0, 0.0),
            radius_x: 5.0,
            radius_y: 5.0,
            start_angle: -45.0,
            end_angle: -90.0,
            anticlockwise: true,
        };
        let pts = arc.curve_points();
        assert_eq!(pts.len(), 4);
        assert!(close(pts[3], Point::new(0.0, -5.0)));
    }

    #[test]
    fn full_circle_uses_four_segments() {
        let arc = Arc {
            center: Point::new(0.0, 0.0),
            radius_x: 1.0,
            radius_y: 1.0,
            start_angle: 0.0,
            end_angle: 360.0,
            anticlockwise: false,
        };
        assert_eq!(arc.curve_points().len(), 13);
    }
}
