use crate::geometry::Point;
use serde::{Deserialize, Serialize};

/// A 2D affine transform `[a b c d e f]`, mapping `(x, y)` to
/// `(a·x + c·y + e, b·x + d·y + f)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::unit()
    }
}

impl Matrix {
    pub const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub const fn unit() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    pub const fn translate(x: f32, y: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, x, y)
    }

    pub fn from_array(m: [f32; 6]) -> Self {
        Self::new(m[0], m[1], m[2], m[3], m[4], m[5])
    }

    pub fn is_unit(&self) -> bool {
        *self == Self::unit()
    }

    /// `self ∘ m`: the result applies `m` first, then `self`.
    pub fn multiply(&self, m: &Matrix) -> Matrix {
        Matrix::new(
            self.a * m.a + self.c * m.b,
            self.b * m.a + self.d * m.b,
            self.a * m.c + self.c * m.d,
            self.b * m.c + self.d * m.d,
            self.a * m.e + self.c * m.f + self.e,
            self.b * m.e + self.d * m.f + self.f,
        )
    }

    /// Applies `self` first, then `next`.
    pub fn then(&self, next: &Matrix) -> Matrix {
        next.multiply(self)
    }

    pub fn invert(&self) -> Option<Matrix> {
        let det = self.a * self.d - self.b * self.c;
        if det == 0.0 {
            return None;
        }
        Some(Matrix::new(
            self.d / det,
            -self.b / det,
            -self.c / det,
            self.a / det,
            (self.c * self.f - self.d * self.e) / det,
            (self.b * self.e - self.a * self.f) / det,
        ))
    }

    pub fn apply(&self, p: Point) -> Point {
        p.transform(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn then_applies_left_first() {
        let m = Matrix::translate(-5.0, -5.0)
            .then(&Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0))
            .then(&Matrix::translate(5.0, 5.0));
        let p = m.apply(Point::new(10.0, 5.0));
        assert!(close(p.x, 15.0) && close(p.y, 5.0));
    }

    #[test]
    fn invert_roundtrip() {
        let m = Matrix::new(0.0, 1.0, -1.0, 0.0, 10.0, 20.0);
        let inv = m.invert().unwrap();
        let p = inv.apply(m.apply(Point::new(3.0, 4.0)));
        assert!(close(p.x, 3.0) && close(p.y, 4.0));
        assert!(Matrix::new(1.0, 2.0, 2.0, 4.0, 0.0, 0.0).invert().is_none());
    }
}
