//! Projection of CSS linear gradients onto a box.
//!
//! The scene expresses gradients in object-bounding-box units, where the
//! filled box is stretched from a unit square. A CSS angle measured in the
//! real box therefore has to be pre-scaled so the stretched result keeps
//! the intended slope.

use drawdom_scene::{GradientStop, LinearGradient, Path};
use drawdom_style::{LinearGradientSpec, StopOffset};
use drawdom_types::{Point, Rect};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Direction of the gradient line in radians, clockwise from "to top",
/// normalized to `[0, 2π)`.
pub fn gradient_angle(spec: &LinearGradientSpec, width: f32, height: f32) -> f32 {
    let corner = height.atan2(width);
    let mut angle = match spec.to.as_deref() {
        Some("top") => 0.0,
        Some("left") => -FRAC_PI_2,
        Some("bottom") => PI,
        Some("right") => FRAC_PI_2,
        Some("top left" | "left top") => -corner,
        Some("top right" | "right top") => corner,
        Some("bottom left" | "left bottom") => PI + corner,
        Some("bottom right" | "right bottom") => PI - corner,
        _ => spec.angle.unwrap_or(PI),
    };
    if spec.reverse {
        angle -= PI;
    }
    angle.rem_euclid(TAU)
}

/// Start and end of the gradient line in bounding-box units.
pub fn gradient_line(angle: f32, width: f32, height: f32) -> (Point, Point) {
    let scaled = (width * angle.tan() / height).atan();
    let (sin, cos) = scaled.sin_cos();
    let len = sin.abs() + cos.abs();
    let (mut x, mut y) = (len / 2.0 * sin, len / 2.0 * cos);
    if angle > FRAC_PI_2 && angle <= 3.0 * FRAC_PI_2 {
        x = -x;
        y = -y;
    }
    (Point::new(0.5 - x, 0.5 + y), Point::new(0.5 + x, 0.5 - y))
}

/// Resolves stop offsets to fractions of the gradient line. Length offsets
/// are relative to `pxlen`, the length of the line in pixels; stops without
/// an offset are spread evenly between their positioned neighbours.
pub fn resolve_stops(spec: &LinearGradientSpec, pxlen: f32) -> Vec<GradientStop> {
    let count = spec.stops.len();
    let mut offsets: Vec<Option<f32>> = spec
        .stops
        .iter()
        .enumerate()
        .map(|(i, stop)| match stop.offset {
            Some(StopOffset::Percent(p)) => Some(p / 100.0),
            Some(StopOffset::Length(l)) => Some(if pxlen > 0.0 { l / pxlen } else { 0.0 }),
            None if i == 0 => Some(0.0),
            None if i + 1 == count => Some(1.0),
            None => None,
        })
        .collect();

    let mut left = 0.0;
    let mut pending: Vec<usize> = Vec::new();
    for i in 0..offsets.len() {
        match offsets[i] {
            Some(right) => {
                let n = pending.len() as f32 + 1.0;
                for (k, &index) in pending.iter().enumerate() {
                    offsets[index] = Some(left + (right - left) * (k as f32 + 1.0) / n);
                }
                pending.clear();
                left = right;
            }
            None => pending.push(i),
        }
    }

    spec.stops
        .iter()
        .zip(offsets)
        .map(|(stop, offset)| GradientStop {
            offset: offset.unwrap_or(left),
            color: stop.color.clone(),
        })
        .collect()
}

/// A path filling `tile` with the gradient, or `None` for an empty tile.
pub fn gradient_fill(spec: &LinearGradientSpec, tile: Rect) -> Option<Path> {
    let (width, height) = (tile.width, tile.height);
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    let angle = gradient_angle(spec, width, height);
    let pxlen = (width * angle.sin()).abs() + (height * angle.cos()).abs();
    let (start, end) = gradient_line(angle, width, height);
    Some(Path::from_rect(tile).with_gradient(LinearGradient {
        start,
        end,
        stops: resolve_stops(spec, pxlen),
        user_space: false,
    }))
}
