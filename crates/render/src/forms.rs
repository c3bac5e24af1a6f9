//! Form controls.
//!
//! Check boxes and radio buttons are drawn directly. Text inputs, text
//! areas and selects are replaced for the duration of the render by a
//! stand-in element that shows the control's current text with the
//! control's own style.

use crate::STAND_IN_TAG;
use drawdom_dom::{Document, NodeId};
use drawdom_scene::Path;
use drawdom_traits::LayoutHost;
use drawdom_types::{Color, Rect};

pub fn is_form_field(tag: &str) -> bool {
    matches!(tag, "input" | "textarea" | "select")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Checkbox,
    Radio,
}

impl Toggle {
    pub fn of(doc: &Document, node: NodeId) -> Option<Toggle> {
        if !doc.is_tag(node, "input") {
            return None;
        }
        match doc.attr(node, "type").map(str::to_ascii_lowercase).as_deref() {
            Some("checkbox") => Some(Toggle::Checkbox),
            Some("radio") => Some(Toggle::Radio),
            _ => None,
        }
    }
}

fn circle(cx: f32, cy: f32, r: f32) -> Path {
    Path::ellipse(Rect::new(cx - r, cy - r, 2.0 * r, 2.0 * r))
}

/// Outline and, when checked, the mark of a check box or radio button
/// whose border box is `rect`.
pub fn toggle_paths(toggle: Toggle, rect: Rect, checked: bool, color: Color) -> Vec<Path> {
    let mut paths = Vec::new();
    match toggle {
        Toggle::Checkbox => {
            let outline = Rect::new(rect.x + 1.0, rect.y + 1.0, rect.width - 2.0, rect.height - 2.0);
            paths.push(Path::from_rect(outline).with_stroke(color.clone(), 1.0));
            if checked {
                let at = |fx: f32, fy: f32| (rect.x + fx * rect.width, rect.y + fy * rect.height);
                let (a, b, c) = (at(0.22, 0.55), at(0.45, 0.75), at(0.78, 0.22));
                paths.push(
                    Path::new()
                        .move_to(a.0, a.1)
                        .line_to(b.0, b.1)
                        .line_to(c.0, c.1)
                        .with_stroke(color, 1.2),
                );
            }
        }
        Toggle::Radio => {
            let (cx, cy) = (rect.x + rect.width / 2.0, rect.y + rect.height / 2.0);
            let outer = (rect.width - 2.0).min(rect.height - 2.0) / 2.0;
            paths.push(circle(cx, cy, outer).with_stroke(color.clone(), 1.0));
            if checked {
                let dot = (rect.width - 8.0).min(rect.height - 8.0) / 2.0;
                paths.push(circle(cx, cy, dot).with_fill(color));
            }
        }
    }
    paths
}

/// The text a single-line control shows.
fn field_text(doc: &Document, field: NodeId) -> String {
    if doc.is_tag(field, "select") {
        let options = doc.elements_by_tag(field, "option");
        let selected = options
            .iter()
            .find(|&&o| doc.has_attr(o, "selected"))
            .or_else(|| options.first());
        return selected.map(|&o| doc.text_content(o)).unwrap_or_default();
    }
    match doc.attr(field, "value") {
        Some(value) => value.to_string(),
        None if doc.is_tag(field, "textarea") => doc.text_content(field),
        None => String::new(),
    }
}

/// Inserts a stand-in for a text control right before it and returns it.
/// The caller renders its contents and detaches it.
pub fn insert_field_stand_in(doc: &mut Document, host: &dyn LayoutHost, field: NodeId) -> Option<NodeId> {
    let parent = doc.parent(field)?;
    let tag = doc.tag_name(field)?.to_string();
    let style = host.computed_style(doc, field, None);

    let stand_in = doc.create_element(STAND_IN_TAG);
    doc.set_attr(stand_in, "style", &style.css_text());
    if let Some(css) = doc.inline_style_mut(stand_in) {
        css.set("display", "inline-block", false);
        match tag.as_str() {
            "input" => css.set("white-space", "pre", false),
            "select" | "textarea" => css.set("overflow", "auto", false),
            _ => {}
        }
    }

    if tag == "select" && doc.has_attr(field, "multiple") {
        for option in doc.elements_by_tag(field, "option") {
            let option_style = host.computed_style(doc, option, None);
            let row = doc.create_element(STAND_IN_TAG);
            doc.set_attr(row, "style", &option_style.css_text());
            if let Some(css) = doc.inline_style_mut(row) {
                css.set("display", "block", false);
            }
            let text = doc.text_content(option);
            doc.set_text_content(row, &text);
            doc.append_child(stand_in, row);
        }
    } else {
        let text = field_text(doc, field);
        doc.set_text_content(stand_in, &text);
    }

    doc.insert_before(parent, stand_in, Some(field));
    Some(stand_in)
}
