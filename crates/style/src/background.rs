//! `background-image` descriptor parsing.
//!
//! A computed `background-image` is split into layers; each layer is either
//! `none`, a `url(...)` or a (possibly vendor-prefixed) `linear-gradient(...)`.
//! Parsing never fails: anything unrecognised becomes [`BackgroundImage::None`].

use crate::parsers::{Separator, angle, color, number, split_property};
use drawdom_types::Color;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_until},
    character::complete::{char, multispace0},
    combinator::{map, opt, peek, recognize},
    sequence::{pair, preceded, terminated},
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundImage {
    None,
    Url(String),
    Linear(LinearGradientSpec),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinearGradientSpec {
    /// Explicit angle in radians.
    pub angle: Option<f32>,
    /// Side-or-corner keywords, e.g. `"right"` or `"top left"`.
    pub to: Option<String>,
    pub stops: Vec<ColorStop>,
    /// Legacy prefixed syntax names the starting side instead of the target.
    pub reverse: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorStop {
    pub color: Color,
    pub offset: Option<StopOffset>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopOffset {
    Percent(f32),
    Length(f32),
}

// --- Tokens ---

fn skip_ws(input: &str) -> IResult<&str, &str> {
    multispace0.parse(input)
}

fn vendor_prefix(input: &str) -> IResult<&str, &str> {
    alt((tag("-webkit-"), tag("-moz-"), tag("-o-"), tag("-ms-"))).parse(input)
}

/// `[prefix]linear-gradient(`, yielding the prefix if any.
fn linear_gradient_open(input: &str) -> IResult<&str, Option<&str>> {
    terminated(
        opt(vendor_prefix),
        (tag("linear-gradient"), multispace0, char('(')),
    )
    .parse(input)
}

fn keyword(input: &str) -> IResult<&str, &str> {
    terminated(
        alt((
            tag("left"),
            tag("right"),
            tag("top"),
            tag("bottom"),
            tag("to"),
            tag("center"),
        )),
        peek(nom::character::complete::satisfy(|c: char| {
            !(c.is_alphanumeric() || c == '_')
        })),
    )
    .parse(input)
}

fn percent(input: &str) -> IResult<&str, f32> {
    terminated(number, char('%')).parse(input)
}

fn percent_token(input: &str) -> IResult<&str, &str> {
    recognize(percent).parse(input)
}

fn px_length(input: &str) -> IResult<&str, f32> {
    terminated(number, tag("px")).parse(input)
}

fn comma(input: &str) -> IResult<&str, Option<char>> {
    preceded(skip_ws, opt(char(','))).parse(input)
}

fn stop_offset(input: &str) -> IResult<&str, StopOffset> {
    preceded(
        skip_ws,
        alt((
            map(px_length, StopOffset::Length),
            map(percent, StopOffset::Percent),
        )),
    )
    .parse(input)
}

fn color_stop(input: &str) -> IResult<&str, ColorStop> {
    map(
        pair(preceded(skip_ws, color), opt(stop_offset)),
        |(color, offset)| ColorStop { color, offset },
    )
    .parse(input)
}

fn close_paren(input: &str) -> IResult<&str, char> {
    preceded(skip_ws, char(')')).parse(input)
}

fn ws_keyword(input: &str) -> IResult<&str, &str> {
    preceded(skip_ws, keyword).parse(input)
}

fn ws_angle(input: &str) -> IResult<&str, f32> {
    preceded(skip_ws, angle).parse(input)
}

fn ws_percent_token(input: &str) -> IResult<&str, &str> {
    preceded(skip_ws, percent_token).parse(input)
}

fn linear_gradient_body<'a>(
    input: &'a str,
    prefix: Option<&str>,
) -> IResult<&'a str, LinearGradientSpec> {
    let mut spec = LinearGradientSpec::default();
    let mut to1: Option<&str> = None;
    let mut to2: Option<&str> = None;

    let (mut input, angle) = opt(ws_angle).parse(input)?;
    if angle.is_some() {
        spec.angle = angle;
        (input, _) = comma(input)?;
    } else {
        let (rest, first) = opt(ws_keyword).parse(input)?;
        input = rest;
        to1 = first;
        if first == Some("to") {
            let (rest, side) = opt(ws_keyword).parse(input)?;
            input = rest;
            to1 = side;
        } else if first.is_some() && prefix.is_some() {
            spec.reverse = true;
        }
        let (rest, second) = opt(ws_keyword).parse(input)?;
        to2 = second;
        (input, _) = comma(rest)?;
    }

    if prefix == Some("-moz-") && spec.angle.is_none() && to1.is_none() {
        let (rest, x) = opt(ws_percent_token).parse(input)?;
        let (rest, y) = opt(ws_percent_token).parse(rest)?;
        spec.reverse = true;
        match x {
            Some("0%") => to1 = Some("left"),
            Some("100%") => to1 = Some("right"),
            _ => {}
        }
        match y {
            Some("0%") => to2 = Some("top"),
            Some("100%") => to2 = Some("bottom"),
            _ => {}
        }
        (input, _) = comma(rest)?;
    }

    loop {
        if input.trim().is_empty() {
            break;
        }
        if let Ok((rest, _)) = close_paren(input) {
            input = rest;
            break;
        }
        match color_stop(input) {
            Ok((rest, stop)) => {
                spec.stops.push(stop);
                (input, _) = comma(rest)?;
            }
            Err(_) => break,
        }
    }

    spec.to = match (to1, to2) {
        (Some(a), Some(b)) => Some(format!("{a} {b}")),
        (Some(a), None) | (None, Some(a)) => Some(a.to_string()),
        (None, None) => None,
    };
    Ok((input, spec))
}

fn url_content(input: &str) -> IResult<&str, &str> {
    preceded(
        (tag("url"), char('('), skip_ws),
        terminated(take_until(")"), char(')')),
    )
    .parse(input)
}

fn parse_layer(input: &str) -> BackgroundImage {
    let input = input.trim_start();
    if let Ok((rest, prefix)) = linear_gradient_open(input) {
        return match linear_gradient_body(rest, prefix) {
            Ok((_, spec)) => BackgroundImage::Linear(spec),
            Err(_) => BackgroundImage::None,
        };
    }
    if let Ok((_, url)) = url_content(input) {
        let url = url.trim().trim_matches(|c| c == '"' || c == '\'');
        return BackgroundImage::Url(url.to_string());
    }
    BackgroundImage::None
}

/// Memoizing background parser. Both individual layers and whole
/// declarations are cached by their raw string.
#[derive(Debug, Default)]
pub struct BackgroundParser {
    layers: RwLock<HashMap<String, BackgroundImage>>,
    declarations: RwLock<HashMap<String, Arc<[BackgroundImage]>>>,
}

impl BackgroundParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a full `background-image` value into its layers.
    pub fn parse(&self, value: &str) -> Arc<[BackgroundImage]> {
        if let Ok(cache) = self.declarations.read()
            && let Some(hit) = cache.get(value)
        {
            return Arc::clone(hit);
        }
        let layers: Arc<[BackgroundImage]> = split_property(value, Separator::Comma)
            .iter()
            .map(|layer| self.layer(layer))
            .collect();
        if let Ok(mut cache) = self.declarations.write() {
            cache.insert(value.to_string(), Arc::clone(&layers));
        }
        layers
    }

    fn layer(&self, raw: &str) -> BackgroundImage {
        if let Ok(cache) = self.layers.read()
            && let Some(hit) = cache.get(raw)
        {
            return hit.clone();
        }
        let parsed = parse_layer(raw);
        if let Ok(mut cache) = self.layers.write() {
            cache.insert(raw.to_string(), parsed.clone());
        }
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn single(value: &str) -> BackgroundImage {
        let parser = BackgroundParser::new();
        let layers = parser.parse(value);
        assert_eq!(layers.len(), 1, "expected one layer for {value}");
        layers[0].clone()
    }

    fn linear(value: &str) -> LinearGradientSpec {
        match single(value) {
            BackgroundImage::Linear(spec) => spec,
            other => panic!("expected gradient for {value}, got {other:?}"),
        }
    }

    #[test]
    fn none_and_urls() {
        assert_eq!(single("none"), BackgroundImage::None);
        assert_eq!(
            single("url(\"img/a.png\")"),
            BackgroundImage::Url("img/a.png".into())
        );
        assert_eq!(single("url('b.png')"), BackgroundImage::Url("b.png".into()));
        assert_eq!(single("url(c.png)"), BackgroundImage::Url("c.png".into()));
    }

    #[test]
    fn malformed_is_none() {
        assert_eq!(single("radial-gradient(red, blue)"), BackgroundImage::None);
        assert_eq!(single("garbage"), BackgroundImage::None);
    }

    #[test]
    fn gradient_with_angle_and_stops() {
        let g = linear("linear-gradient(45deg, rgb(255, 0, 0) 10%, blue 20px, #00ff00)");
        assert!((g.angle.unwrap() - PI / 4.0).abs() < 1e-5);
        assert_eq!(g.to, None);
        assert!(!g.reverse);
        assert_eq!(g.stops.len(), 3);
        assert_eq!(g.stops[0].offset, Some(StopOffset::Percent(10.0)));
        assert_eq!(g.stops[1].offset, Some(StopOffset::Length(20.0)));
        assert_eq!(g.stops[2].offset, None);
        assert_eq!(g.stops[2].color, Color::rgb(0, 255, 0));
    }

    #[test]
    fn gradient_to_corner() {
        let g = linear("linear-gradient(to top left, red, blue)");
        assert_eq!(g.to.as_deref(), Some("top left"));
        assert!(!g.reverse);
        assert_eq!(g.stops.len(), 2);
    }

    #[test]
    fn prefixed_side_is_reversed() {
        let g = linear("-webkit-linear-gradient(left, red, blue)");
        assert_eq!(g.to.as_deref(), Some("left"));
        assert!(g.reverse);
        let g = linear("linear-gradient(left, red, blue)");
        assert!(!g.reverse);
    }

    #[test]
    fn moz_percent_start_position() {
        let g = linear("-moz-linear-gradient(0% 100%, red, blue)");
        assert_eq!(g.to.as_deref(), Some("left bottom"));
        assert!(g.reverse);
        assert_eq!(g.stops.len(), 2);
    }

    #[test]
    fn multiple_layers_and_cache() {
        let parser = BackgroundParser::new();
        let value = "url(a.png), linear-gradient(red, blue)";
        let first = parser.parse(value);
        assert_eq!(first.len(), 2);
        assert!(matches!(first[0], BackgroundImage::Url(_)));
        assert!(matches!(first[1], BackgroundImage::Linear(_)));
        let second = parser.parse(value);
        assert!(Arc::ptr_eq(&first, &second));
    }
}
