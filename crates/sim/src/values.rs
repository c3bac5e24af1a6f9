//! Value normalization: the simulated engine reports lengths in `px`,
//! colors as `rgb()`/`rgba()` and transforms as `matrix()`, the way real
//! engines serialize computed values.

use drawdom_style::{Separator, parse_color, parse_float, split_property};
use drawdom_style::parsers::parse_angle;
use drawdom_types::Matrix;

pub const DEFAULT_FONT_SIZE: f32 = 16.0;

/// Serializes a pixel value without a trailing `.0`.
pub fn px(value: f32) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    format!("{}px", if rounded == 0.0 { 0.0 } else { rounded })
}

/// Resolves a length against a font size. Percentages resolve against
/// `percent_base` when one is known and are left alone otherwise.
pub fn resolve_length(value: &str, font_size: f32, percent_base: Option<f32>) -> Option<f32> {
    let value = value.trim();
    let number = parse_float(value)?;
    let unit = value
        .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == '-' || c == '+')
        .trim();
    match unit.to_ascii_lowercase().as_str() {
        "" if number == 0.0 => Some(0.0),
        "px" => Some(number),
        "pt" => Some(number * 4.0 / 3.0),
        "in" => Some(number * 96.0),
        "cm" => Some(number * 96.0 / 2.54),
        "mm" => Some(number * 96.0 / 25.4),
        "em" => Some(number * font_size),
        "rem" => Some(number * DEFAULT_FONT_SIZE),
        "%" => percent_base.map(|base| base * number / 100.0),
        _ => None,
    }
}

/// Normalizes one length token; keywords and unresolvable percentages pass
/// through untouched.
pub fn normalize_length(value: &str, font_size: f32) -> String {
    match resolve_length(value, font_size, None) {
        Some(v) => px(v),
        None => value.trim().to_string(),
    }
}

pub fn normalize_color(value: &str, current_color: &str) -> String {
    let value = value.trim();
    if value.eq_ignore_ascii_case("currentcolor") {
        return current_color.to_string();
    }
    match parse_color(value) {
        Some(color) => color.to_css(),
        None => value.to_string(),
    }
}

/// Expands a one-to-four value box shorthand into top, right, bottom, left.
pub fn expand_box(value: &str) -> Option<[String; 4]> {
    let parts = split_property(value, Separator::Whitespace);
    let [top, right, bottom, left] = match parts.as_slice() {
        [a] => [a, a, a, a],
        [a, b] => [a, b, a, b],
        [a, b, c] => [a, b, c, b],
        [a, b, c, d] => [a, b, c, d],
        _ => return None,
    };
    Some([top.clone(), right.clone(), bottom.clone(), left.clone()])
}

fn transform_args(args: &str) -> Vec<&str> {
    args.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|a| !a.is_empty())
        .collect()
}

fn transform_function(name: &str, args: &[&str], font_size: f32) -> Option<Matrix> {
    let len = |i: usize| args.get(i).and_then(|a| resolve_length(a, font_size, None));
    let num = |i: usize| args.get(i).and_then(|a| parse_float(a));
    let ang = |i: usize| {
        args.get(i)
            .and_then(|a| if *a == "0" { Some(0.0) } else { parse_angle(a) })
    };
    let m = match name {
        "matrix" => {
            let v: Vec<f32> = args.iter().filter_map(|a| parse_float(a)).collect();
            if v.len() != 6 {
                return None;
            }
            Matrix::new(v[0], v[1], v[2], v[3], v[4], v[5])
        }
        "translate" => Matrix::translate(len(0)?, len(1).unwrap_or(0.0)),
        "translatex" => Matrix::translate(len(0)?, 0.0),
        "translatey" => Matrix::translate(0.0, len(0)?),
        "scale" => {
            let sx = num(0)?;
            Matrix::new(sx, 0.0, 0.0, num(1).unwrap_or(sx), 0.0, 0.0)
        }
        "scalex" => Matrix::new(num(0)?, 0.0, 0.0, 1.0, 0.0, 0.0),
        "scaley" => Matrix::new(1.0, 0.0, 0.0, num(0)?, 0.0, 0.0),
        "rotate" => {
            let (sin, cos) = ang(0)?.sin_cos();
            Matrix::new(cos, sin, -sin, cos, 0.0, 0.0)
        }
        "skewx" => Matrix::new(1.0, 0.0, ang(0)?.tan(), 1.0, 0.0, 0.0),
        "skewy" => Matrix::new(1.0, ang(0)?.tan(), 0.0, 1.0, 0.0, 0.0),
        _ => return None,
    };
    Some(m)
}

/// Folds a transform list into the single `matrix()` engines report.
/// Unknown functions make the whole value invalid, which reads as `none`.
pub fn normalize_transform(value: &str, font_size: f32) -> String {
    let value = value.trim();
    if value.is_empty() || value == "none" {
        return "none".to_string();
    }
    let mut total = Matrix::unit();
    for function in split_property(value, Separator::Whitespace) {
        let Some((name, rest)) = function.split_once('(') else {
            return "none".to_string();
        };
        let args = transform_args(rest.trim_end_matches(')'));
        match transform_function(&name.trim().to_ascii_lowercase(), &args, font_size) {
            Some(m) => total = total.multiply(&m),
            None => return "none".to_string(),
        }
    }
    let fmt = |v: f32| {
        let r = (v * 1_000_000.0).round() / 1_000_000.0;
        format!("{}", if r == 0.0 { 0.0 } else { r })
    };
    format!(
        "matrix({}, {}, {}, {}, {}, {})",
        fmt(total.a),
        fmt(total.b),
        fmt(total.c),
        fmt(total.d),
        fmt(total.e),
        fmt(total.f)
    )
}

fn origin_component(token: &str, extent: f32, font_size: f32) -> f32 {
    match token {
        "left" | "top" => 0.0,
        "center" => extent / 2.0,
        "right" | "bottom" => extent,
        other => resolve_length(other, font_size, Some(extent)).unwrap_or(extent / 2.0),
    }
}

/// `transform-origin` in pixels against a box size.
pub fn resolve_origin(value: &str, width: f32, height: f32, font_size: f32) -> String {
    let tokens: Vec<&str> = value.split_whitespace().collect();
    let (x, y) = match tokens.as_slice() {
        [] => (width / 2.0, height / 2.0),
        ["top" | "bottom"] => (width / 2.0, origin_component(tokens[0], height, font_size)),
        [single] => (origin_component(single, width, font_size), height / 2.0),
        ["top" | "bottom", other, ..] => (
            origin_component(other, width, font_size),
            origin_component(tokens[0], height, font_size),
        ),
        [a, b, ..] => (
            origin_component(a, width, font_size),
            origin_component(b, height, font_size),
        ),
    };
    format!("{} {}", px(x), px(y))
}
