//! Style resolution for the simulated engine: user-agent defaults, author
//! rules in insertion order, then the inline style, with inheritance from
//! the parent's computed values. There is no specificity; later
//! declarations win.

use crate::values::{
    DEFAULT_FONT_SIZE, expand_box, normalize_color, normalize_length, normalize_transform, px,
    resolve_length,
};
use drawdom_dom::{Document, DomError, InlineStyle, NodeId, SelectorList};
use drawdom_style::{ComputedStyle, Separator, Vendor, parse_color, split_property};
use drawdom_traits::PseudoElement;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// An author rule, optionally targeting a pseudo-element.
#[derive(Debug, Clone)]
pub struct StyleRule {
    selector: SelectorList,
    pseudo: Option<PseudoElement>,
    declarations: Vec<(String, String)>,
}

impl StyleRule {
    /// `selector` may end in `::before`/`::after` (or the single-colon form).
    pub fn parse(selector: &str, css: &str) -> Result<Self, DomError> {
        let selector = selector.trim();
        let (base, pseudo) = [
            ("::before", PseudoElement::Before),
            (":before", PseudoElement::Before),
            ("::after", PseudoElement::After),
            (":after", PseudoElement::After),
        ]
        .iter()
        .find_map(|(suffix, pseudo)| selector.strip_suffix(suffix).map(|base| (base, Some(*pseudo))))
        .unwrap_or((selector, None));
        let declarations = InlineStyle::parse(css)
            .iter()
            .map(|d| (d.name.clone(), d.value.clone()))
            .collect();
        Ok(Self {
            selector: SelectorList::parse(base)?,
            pseudo,
            declarations,
        })
    }

    fn applies(&self, doc: &Document, node: NodeId, pseudo: Option<PseudoElement>) -> bool {
        self.pseudo == pseudo && self.selector.matches(doc, node)
    }
}

const INHERITED: &[&str] = &[
    "color",
    "cursor",
    "direction",
    "font-family",
    "font-size",
    "font-style",
    "font-variant",
    "font-weight",
    "line-height",
    "list-style-position",
    "list-style-type",
    "text-align",
    "text-indent",
    "text-transform",
    "visibility",
    "white-space",
    "border-collapse",
];

static INITIAL: Lazy<BTreeMap<String, String>> = Lazy::new(|| {
    let mut map: BTreeMap<String, String> = [
        ("background-attachment", "scroll"),
        ("background-clip", "border-box"),
        ("background-color", "rgba(0, 0, 0, 0)"),
        ("background-image", "none"),
        ("background-origin", "padding-box"),
        ("background-position", "0% 0%"),
        ("background-repeat", "repeat"),
        ("background-size", "auto"),
        ("border-collapse", "separate"),
        ("bottom", "auto"),
        ("box-sizing", "content-box"),
        ("clip", "auto"),
        ("color", "rgb(0, 0, 0)"),
        ("content", "normal"),
        ("counter-increment", "none"),
        ("counter-reset", "none"),
        ("cursor", "auto"),
        ("direction", "ltr"),
        ("display", "inline"),
        ("float", "none"),
        ("font-family", "sans-serif"),
        ("font-size", "16px"),
        ("font-style", "normal"),
        ("font-variant", "normal"),
        ("font-weight", "400"),
        ("height", "auto"),
        ("left", "auto"),
        ("line-height", "normal"),
        ("list-style-image", "none"),
        ("list-style-position", "outside"),
        ("list-style-type", "disc"),
        ("opacity", "1"),
        ("overflow", "visible"),
        ("overflow-x", "visible"),
        ("overflow-y", "visible"),
        ("position", "static"),
        ("right", "auto"),
        ("text-align", "start"),
        ("text-decoration", "none"),
        ("text-indent", "0px"),
        ("text-overflow", "clip"),
        ("text-transform", "none"),
        ("top", "auto"),
        ("transform", "none"),
        ("transform-origin", "50% 50%"),
        ("visibility", "visible"),
        ("white-space", "normal"),
        ("width", "auto"),
        ("z-index", "auto"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for side in SIDES {
        for (name, value) in [
            (format!("margin-{side}"), "0px"),
            (format!("padding-{side}"), "0px"),
            (format!("border-{side}-width"), "medium"),
            (format!("border-{side}-style"), "none"),
            (format!("border-{side}-color"), "currentcolor"),
        ] {
            map.insert(name, value.to_string());
        }
    }
    for corner in CORNERS {
        map.insert(corner.to_string(), "0px".to_string());
    }
    map
});

const SIDES: [&str; 4] = ["top", "right", "bottom", "left"];
const CORNERS: [&str; 4] = [
    "border-top-left-radius",
    "border-top-right-radius",
    "border-bottom-right-radius",
    "border-bottom-left-radius",
];

fn ua_declarations(tag: &str) -> &'static [(&'static str, &'static str)] {
    match tag {
        "html" | "body" | "div" | "p" | "section" | "article" | "header" | "footer" | "nav"
        | "main" | "aside" | "form" | "figure" | "figcaption" | "address" | "dl" | "dd"
        | "dt" | "fieldset" | "legend" | "blockquote" | "hr" | "drawdom-pdf-document"
        | "drawdom-pdf-page" => &[("display", "block")],
        "h1" => &[("display", "block"), ("font-size", "2em"), ("font-weight", "700")],
        "h2" => &[("display", "block"), ("font-size", "1.5em"), ("font-weight", "700")],
        "h3" | "h4" | "h5" | "h6" => &[("display", "block"), ("font-weight", "700")],
        "pre" => &[("display", "block"), ("white-space", "pre"), ("font-family", "monospace")],
        "ul" | "ol" => &[("display", "block"), ("padding-left", "40px")],
        "li" => &[("display", "list-item")],
        "table" => &[("display", "table")],
        "caption" => &[("display", "table-caption")],
        "thead" => &[("display", "table-header-group")],
        "tbody" => &[("display", "table-row-group")],
        "tfoot" => &[("display", "table-footer-group")],
        "tr" => &[("display", "table-row")],
        "td" => &[("display", "table-cell")],
        "th" => &[("display", "table-cell"), ("font-weight", "700")],
        "colgroup" => &[("display", "table-column-group")],
        "col" => &[("display", "table-column")],
        "b" | "strong" => &[("font-weight", "700")],
        "i" | "em" => &[("font-style", "italic")],
        "u" => &[("text-decoration", "underline")],
        "s" | "del" => &[("text-decoration", "line-through")],
        "a" => &[("color", "rgb(0, 0, 238)"), ("text-decoration", "underline")],
        "img" | "canvas" | "input" | "select" | "textarea" | "button" => {
            &[("display", "inline-block")]
        }
        "head" | "script" | "style" | "link" | "meta" | "title" | "template" => {
            &[("display", "none")]
        }
        _ => &[],
    }
}

/// Expands shorthands into the longhands engines report.
pub fn expand(name: &str, value: &str) -> Vec<(String, String)> {
    let name = name.trim().to_ascii_lowercase();
    let value = value.trim();
    let sides = |prefix: &str, suffix: &str| -> Vec<(String, String)> {
        match expand_box(value) {
            Some(parts) => SIDES
                .iter()
                .zip(parts)
                .map(|(side, v)| (format!("{prefix}-{side}{suffix}"), v))
                .collect(),
            None => Vec::new(),
        }
    };
    match name.as_str() {
        "margin" | "padding" => sides(&name, ""),
        "border-width" => sides("border", "-width"),
        "border-style" => sides("border", "-style"),
        "border-color" => sides("border", "-color"),
        "border" => SIDES
            .iter()
            .flat_map(|side| border_side(&format!("border-{side}"), value))
            .collect(),
        "border-top" | "border-right" | "border-bottom" | "border-left" => border_side(&name, value),
        "border-radius" => match expand_box(value) {
            Some(parts) => CORNERS
                .iter()
                .zip(parts)
                .map(|(corner, v)| (corner.to_string(), v))
                .collect(),
            None => Vec::new(),
        },
        "background" => background(value),
        "list-style" => list_style(value),
        "overflow" => vec![
            ("overflow".to_string(), value.to_string()),
            ("overflow-x".to_string(), value.to_string()),
            ("overflow-y".to_string(), value.to_string()),
        ],
        _ => vec![(name, value.to_string())],
    }
}

const BORDER_STYLES: &[&str] = &[
    "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset", "outset",
];

fn border_side(prefix: &str, value: &str) -> Vec<(String, String)> {
    let mut width = "medium".to_string();
    let mut style = "none".to_string();
    let mut color = "currentcolor".to_string();
    for token in split_property(value, Separator::Whitespace) {
        if BORDER_STYLES.contains(&token.as_str()) {
            style = token;
        } else if parse_color(&token).is_some() || token.eq_ignore_ascii_case("currentcolor") {
            color = token;
        } else {
            width = token;
        }
    }
    vec![
        (format!("{prefix}-width"), width),
        (format!("{prefix}-style"), style),
        (format!("{prefix}-color"), color),
    ]
}

fn background(value: &str) -> Vec<(String, String)> {
    if parse_color(value).is_some() {
        return vec![
            ("background-color".to_string(), value.to_string()),
            ("background-image".to_string(), "none".to_string()),
        ];
    }
    let mut color = "rgba(0, 0, 0, 0)".to_string();
    let mut images = Vec::new();
    for token in split_property(value, Separator::Whitespace) {
        if parse_color(&token).is_some() {
            color = token;
        } else {
            images.push(token);
        }
    }
    let image = if images.is_empty() { "none".to_string() } else { images.join(" ") };
    vec![
        ("background-color".to_string(), color),
        ("background-image".to_string(), image),
    ]
}

fn list_style(value: &str) -> Vec<(String, String)> {
    split_property(value, Separator::Whitespace)
        .into_iter()
        .map(|token| match token.as_str() {
            "inside" | "outside" => ("list-style-position".to_string(), token),
            _ => ("list-style-type".to_string(), token),
        })
        .collect()
}

/// Resolves a style from its parent's computed values and the declarations
/// that apply, in cascade order.
pub fn resolve<'a, I>(vendor: Vendor, parent: Option<&ComputedStyle>, declared: I) -> ComputedStyle
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut props = INITIAL.clone();
    if let Some(parent) = parent {
        for name in INHERITED {
            props.insert(name.to_string(), parent.get(name).to_string());
        }
    }
    for (name, value) in declared {
        for (name, value) in expand(name, value) {
            let value = if value == "inherit" {
                match parent {
                    Some(p) => p.get(&name).to_string(),
                    None => INITIAL.get(name.as_str()).cloned().unwrap_or_default(),
                }
            } else {
                value
            };
            props.insert(name, value);
        }
    }

    let parent_font = parent.map_or(DEFAULT_FONT_SIZE, |p| p.px("font-size"));
    let font_size = props
        .get("font-size")
        .and_then(|v| resolve_length(v, parent_font, Some(parent_font)))
        .unwrap_or(parent_font);
    props.insert("font-size".to_string(), px(font_size));

    let color = normalize_color(props.get("color").map_or("", String::as_str), "rgb(0, 0, 0)");
    props.insert("color".to_string(), color.clone());

    for (name, value) in props.iter_mut() {
        if name.ends_with("-color") {
            *value = normalize_color(value, &color);
        } else if is_length_property(name) {
            *value = normalize_length(value, font_size);
        }
    }
    for side in SIDES {
        let style = props.get(&format!("border-{side}-style")).cloned().unwrap_or_default();
        let width_key = format!("border-{side}-width");
        let width = if style == "none" || style == "hidden" {
            "0px".to_string()
        } else {
            match props.get(&width_key).map(String::as_str) {
                Some("thin") => "1px".to_string(),
                Some("medium") | None => "3px".to_string(),
                Some("thick") => "5px".to_string(),
                Some(other) => other.to_string(),
            }
        };
        props.insert(width_key, width);
    }
    if let Some(line_height) = props.get("line-height").cloned()
        && line_height != "normal"
    {
        let resolved = if line_height.trim().chars().all(|c| c.is_ascii_digit() || c == '.') {
            line_height.parse::<f32>().ok().map(|f| f * font_size)
        } else {
            resolve_length(&line_height, font_size, Some(font_size))
        };
        if let Some(v) = resolved {
            props.insert("line-height".to_string(), px(v));
        }
    }
    if let Some(transform) = props.get("transform").cloned() {
        props.insert("transform".to_string(), normalize_transform(&transform, font_size));
    }
    match props.get("font-weight").map(String::as_str) {
        Some("bold") => {
            props.insert("font-weight".to_string(), "700".to_string());
        }
        Some("normal") => {
            props.insert("font-weight".to_string(), "400".to_string());
        }
        _ => {}
    }
    if props.get("position").is_some_and(|p| p == "absolute" || p == "fixed")
        && props.get("display").is_some_and(|d| d == "inline")
    {
        props.insert("display".to_string(), "block".to_string());
    }

    ComputedStyle::from_pairs(vendor, props)
}

fn is_length_property(name: &str) -> bool {
    name.starts_with("margin-")
        || name.starts_with("padding-")
        || (name.starts_with("border-") && (name.ends_with("-width") || name.ends_with("-radius")))
        || matches!(name, "top" | "left" | "right" | "bottom" | "width" | "height" | "text-indent")
}

/// The rules and inline style that apply to `node`, in cascade order.
pub fn declarations<'a>(
    rules: &'a [StyleRule],
    doc: &'a Document,
    node: NodeId,
    pseudo: Option<PseudoElement>,
) -> Vec<(&'a str, &'a str)> {
    let tag = doc.tag_name(node).unwrap_or("");
    let mut out: Vec<(&str, &str)> = Vec::new();
    if pseudo.is_none() {
        out.extend(ua_declarations(tag).iter().copied());
    }
    for rule in rules.iter().filter(|r| r.applies(doc, node, pseudo)) {
        out.extend(rule.declarations.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    if pseudo.is_none()
        && let Some(inline) = doc.inline_style(node)
    {
        out.extend(inline.iter().map(|d| (d.name.as_str(), d.value.as_str())));
    }
    out
}

/// A pseudo-element's style, or `None` when no rule gives it content.
pub fn pseudo_style(
    vendor: Vendor,
    rules: &[StyleRule],
    doc: &Document,
    node: NodeId,
    element: &ComputedStyle,
    pseudo: PseudoElement,
) -> ComputedStyle {
    let declared = declarations(rules, doc, node, Some(pseudo));
    let mut style = resolve(vendor, Some(element), declared);
    if style.get("content") == "normal" {
        style.insert("content", "none");
    }
    style
}
