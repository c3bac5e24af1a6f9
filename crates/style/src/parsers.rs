//! Low-level nom parser functions for computed CSS values.
//!
//! The host hands back computed values as strings; these parsers turn the
//! handful of shapes the exporter cares about (numbers, lengths, angles,
//! colors, transform matrices, clip rectangles) into typed values. Anything
//! unrecognised comes back as `None` rather than an error, matching how the
//! exporter treats malformed style tokens.

use drawdom_types::Color;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while, take_while_m_n},
    character::complete::{char, digit0, digit1, multispace0, one_of},
    combinator::{map, map_res, opt, recognize, value},
    multi::separated_list1,
    sequence::{delimited, pair, preceded, terminated},
};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during style parsing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StyleParseError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid value for '{property}': {value}")]
    InvalidValue { property: String, value: String },
}

// --- Helper Parsers ---

fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

fn number_text(input: &str) -> IResult<&str, &str> {
    recognize((
        opt(one_of("+-")),
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
        opt((one_of("eE"), opt(one_of("+-")), digit1)),
    ))
    .parse(input)
}

/// A CSS number: optional sign, digits, fraction and exponent.
pub fn number(input: &str) -> IResult<&str, f32> {
    map_res(number_text, |s: &str| s.parse::<f32>()).parse(input)
}

/// Leading-number parse: skips leading whitespace, reads the longest numeric
/// prefix and ignores whatever follows (`"12.5px"` → `12.5`).
pub fn parse_float(s: &str) -> Option<f32> {
    preceded(multispace0, number)
        .parse(s)
        .ok()
        .map(|(_, v)| v)
}

fn unit_multiplier(input: &str) -> IResult<&str, f32> {
    alt((
        value(1.0, tag_no_case("pt")),
        value(1.0, tag_no_case("px")), // px and pt share a scale on paper
        value(72.0, tag_no_case("in")),
        value(28.35, tag_no_case("cm")),
        value(2.835, tag_no_case("mm")),
    ))
    .parse(input)
}

/// Parses a length value with optional unit (e.g., "12pt", "1in", "10mm").
pub fn parse_length(input: &str) -> IResult<&str, f32> {
    map(pair(number, opt(unit_multiplier)), |(v, unit)| {
        v * unit.unwrap_or(1.0)
    })
    .parse(input)
}

/// Parses a whole string as a length, rejecting trailing garbage.
pub fn length_value(input: &str) -> Result<f32, StyleParseError> {
    run_parser(parse_length, input)
}

/// Helper to run a nom parser and convert its result to a `Result<T, StyleParseError>`.
pub fn run_parser<'a, T, F>(mut parser: F, input: &'a str) -> Result<T, StyleParseError>
where
    F: Parser<&'a str, Output = T, Error = nom::error::Error<&'a str>>,
{
    match parser.parse(input.trim()) {
        Ok(("", result)) => Ok(result),
        Ok((rem, _)) => Err(StyleParseError::Parse(format!(
            "Parser did not consume all input. Remainder: '{}'",
            rem
        ))),
        Err(e) => Err(StyleParseError::Parse(e.to_string())),
    }
}

// --- Angles ---

/// An angle token (`45deg`, `100grad`, `1.2rad`, `0.25turn`) in radians.
pub fn angle(input: &str) -> IResult<&str, f32> {
    map(
        pair(
            number,
            alt((
                tag_no_case("deg"),
                tag_no_case("grad"),
                tag_no_case("rad"),
                tag_no_case("turn"),
            )),
        ),
        |(n, unit): (f32, &str)| match unit.to_ascii_lowercase().as_str() {
            "grad" => std::f32::consts::PI * n / 200.0,
            "rad" => n,
            "turn" => 2.0 * std::f32::consts::PI * n,
            _ => std::f32::consts::PI * n / 180.0,
        },
    )
    .parse(input)
}

pub fn parse_angle(s: &str) -> Option<f32> {
    run_parser(angle, s).ok()
}

// --- Colors ---

static NAMED_COLORS: Lazy<HashMap<&'static str, (u8, u8, u8)>> = Lazy::new(|| {
    HashMap::from([
        ("black", (0, 0, 0)),
        ("silver", (192, 192, 192)),
        ("gray", (128, 128, 128)),
        ("grey", (128, 128, 128)),
        ("white", (255, 255, 255)),
        ("maroon", (128, 0, 0)),
        ("red", (255, 0, 0)),
        ("purple", (128, 0, 128)),
        ("fuchsia", (255, 0, 255)),
        ("magenta", (255, 0, 255)),
        ("green", (0, 128, 0)),
        ("lime", (0, 255, 0)),
        ("olive", (128, 128, 0)),
        ("yellow", (255, 255, 0)),
        ("navy", (0, 0, 128)),
        ("blue", (0, 0, 255)),
        ("teal", (0, 128, 128)),
        ("aqua", (0, 255, 255)),
        ("cyan", (0, 255, 255)),
        ("orange", (255, 165, 0)),
        ("pink", (255, 192, 203)),
        ("brown", (165, 42, 42)),
        ("gold", (255, 215, 0)),
        ("lightgray", (211, 211, 211)),
        ("lightgrey", (211, 211, 211)),
        ("darkgray", (169, 169, 169)),
        ("darkgrey", (169, 169, 169)),
    ])
});

fn hex_pair(input: &str) -> IResult<&str, u8> {
    map_res(take_while_m_n(2, 2, |c: char| c.is_ascii_hexdigit()), |s| {
        u8::from_str_radix(s, 16)
    })
    .parse(input)
}

fn hex_single(input: &str) -> IResult<&str, u8> {
    map_res(take_while_m_n(1, 1, |c: char| c.is_ascii_hexdigit()), |s| {
        u8::from_str_radix(s, 16).map(|v| v * 17)
    })
    .parse(input)
}

fn hex_digits(input: &str) -> IResult<&str, &str> {
    preceded(char('#'), take_while(|c: char| c.is_ascii_hexdigit())).parse(input)
}

fn hex_color(input: &str) -> IResult<&str, Color> {
    let (rest, digits) = hex_digits(input)?;
    let color = match digits.len() {
        8 => (hex_pair, hex_pair, hex_pair, hex_pair)
            .parse(digits)
            .map(|(_, (r, g, b, a))| Color::rgba(r, g, b, a as f32 / 255.0)),
        6 => (hex_pair, hex_pair, hex_pair)
            .parse(digits)
            .map(|(_, (r, g, b))| Color::rgb(r, g, b)),
        4 => (hex_single, hex_single, hex_single, hex_single)
            .parse(digits)
            .map(|(_, (r, g, b, a))| Color::rgba(r, g, b, a as f32 / 255.0)),
        3 => (hex_single, hex_single, hex_single)
            .parse(digits)
            .map(|(_, (r, g, b))| Color::rgb(r, g, b)),
        _ => return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::HexDigit))),
    };
    color.map(|c| (rest, c))
}

fn channel(input: &str) -> IResult<&str, f32> {
    map(pair(ws(number), opt(char('%'))), |(v, pct)| match pct {
        Some(_) => v * 2.55,
        None => v,
    })
    .parse(input)
}

fn alpha_channel(input: &str) -> IResult<&str, f32> {
    map(pair(ws(number), opt(char('%'))), |(v, pct)| match pct {
        Some(_) => v / 100.0,
        None => v,
    })
    .parse(input)
}

fn channel_separator(input: &str) -> IResult<&str, char> {
    alt((ws(char(',')), ws(char('/')), value(' ', multispace0))).parse(input)
}

fn rgb_function(input: &str) -> IResult<&str, Color> {
    map(
        preceded(
            terminated(alt((tag_no_case("rgba"), tag_no_case("rgb"))), char('(')),
            terminated(
                (
                    channel,
                    preceded(channel_separator, channel),
                    preceded(channel_separator, channel),
                    opt(preceded(channel_separator, alpha_channel)),
                ),
                ws(char(')')),
            ),
        ),
        |(r, g, b, a)| {
            Color::rgba(
                r.round().clamp(0.0, 255.0) as u8,
                g.round().clamp(0.0, 255.0) as u8,
                b.round().clamp(0.0, 255.0) as u8,
                a.unwrap_or(1.0),
            )
        },
    )
    .parse(input)
}

fn alpha_word(input: &str) -> IResult<&str, &str> {
    take_while(|c: char| c.is_ascii_alphabetic()).parse(input)
}

fn named_color(input: &str) -> IResult<&str, Color> {
    let (rest, word) = alpha_word(input)?;
    let lower = word.to_ascii_lowercase();
    if lower == "transparent" {
        return Ok((rest, Color::transparent()));
    }
    match NAMED_COLORS.get(lower.as_str()) {
        Some(&(r, g, b)) => Ok((rest, Color::rgb(r, g, b))),
        None => Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag))),
    }
}

/// Parses a color at the start of the input: hex, `rgb()`/`rgba()`,
/// `transparent` or a basic named color.
pub fn color(input: &str) -> IResult<&str, Color> {
    alt((hex_color, rgb_function, named_color)).parse(input)
}

/// Parses a complete color value.
pub fn parse_color(s: &str) -> Option<Color> {
    run_parser(color, s).ok()
}

// --- Property splitting ---

/// Top-level separator for [`split_property`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    Comma,
    Semicolon,
    Whitespace,
}

/// Splits a property value on a separator that is not nested inside
/// parentheses or quotes. Empty pieces are dropped and pieces are trimmed.
pub fn split_property(input: &str, separator: Separator) -> Vec<String> {
    let is_sep = |c: char| match separator {
        Separator::Comma => c == ',',
        Separator::Semicolon => c == ';',
        Separator::Whitespace => c.is_whitespace(),
    };
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in input.chars() {
        if let Some(q) = quote {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => {
                quote = Some(c);
                current.push(c);
            }
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            c if depth == 0 && is_sep(c) => {
                let piece = current.trim();
                if !piece.is_empty() {
                    parts.push(piece.to_string());
                }
                current.clear();
            }
            c => current.push(c),
        }
    }
    let piece = current.trim();
    if !piece.is_empty() {
        parts.push(piece.to_string());
    }
    parts
}

// --- Transforms & clipping ---

/// A computed `transform` matrix with its `transform-origin` in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CssTransform {
    pub matrix: [f32; 6],
    pub origin: [f32; 2],
}

fn matrix_function(input: &str) -> IResult<&str, Vec<f32>> {
    delimited(
        (multispace0, tag("matrix"), ws(char('('))),
        separated_list1(ws(char(',')), number),
        (ws(char(')')), multispace0),
    )
    .parse(input)
}

/// Reads a computed transform. Only the `matrix(a, b, c, d, e, f)` form is
/// recognised; `none` and any other form mean "no transform".
pub fn parse_transform(transform: &str, origin: &str) -> Option<CssTransform> {
    if transform.trim() == "none" {
        return None;
    }
    let (rest, values) = matrix_function(transform).ok()?;
    if !rest.is_empty() || values.len() != 6 {
        return None;
    }
    let mut origin_values = origin.split_whitespace().map(|v| parse_float(v).unwrap_or(0.0));
    let ox = origin_values.next().unwrap_or(0.0);
    let oy = origin_values.next().unwrap_or(0.0);
    Some(CssTransform {
        matrix: [values[0], values[1], values[2], values[3], values[4], values[5]],
        origin: [ox, oy],
    })
}

/// One side of a `clip: rect(...)` value; `None` stands for `auto`.
pub type ClipSide = Option<f32>;

/// Parses `rect(top, right, bottom, left)` (commas or spaces).
pub fn parse_clip_rect(s: &str) -> Option<[ClipSide; 4]> {
    let inner = s.trim().strip_prefix("rect(")?.strip_suffix(')')?;
    let sides: Vec<ClipSide> = inner
        .split(|c: char| c == ',' || c == ' ')
        .filter(|p| !p.is_empty())
        .map(|p| if p == "auto" { None } else { Some(parse_float(p).unwrap_or(0.0)) })
        .collect();
    if sides.len() < 4 {
        return None;
    }
    Some([sides[0], sides[1], sides[2], sides[3]])
}

/// A computed corner radius (`"4px"` or `"4px 8px"`) as `(x, y)`.
pub fn parse_radius(s: &str) -> (f32, f32) {
    let mut parts = s.split_whitespace().map(|p| parse_float(p).unwrap_or(0.0));
    let x = parts.next().unwrap_or(0.0);
    let y = parts.next().unwrap_or(x);
    (x, y)
}
