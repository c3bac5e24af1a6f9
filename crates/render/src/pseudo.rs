//! `::before` and `::after` generated content.
//!
//! Pseudo-elements have no node of their own, so each one with content is
//! materialized as a stand-in element carrying the pseudo-element's
//! computed style and its evaluated `content` text.

use crate::STAND_IN_TAG;
use crate::context::FrameStack;
use drawdom_dom::{Document, NodeId};
use drawdom_style::list::format_counter;
use drawdom_style::{ContentToken, parse_content, parse_float};
use drawdom_traits::{LayoutHost, PseudoElement};
use itertools::Itertools;

/// Text of a `content` value. Counters resolve against the scopes in
/// `frames`; a missing counter reads as zero.
pub fn evaluate_content(doc: &Document, node: NodeId, content: &str, frames: &FrameStack) -> String {
    parse_content(content)
        .into_iter()
        .map(|token| match token {
            ContentToken::Text(text) | ContentToken::Raw(text) => text,
            ContentToken::Counter { name, style } => format_counter(
                frames.counter(&name).unwrap_or(0.0),
                style.as_deref().unwrap_or("decimal"),
            ),
            ContentToken::Counters { name, separator, style } => {
                let style = style.as_deref().unwrap_or("decimal");
                frames
                    .all_counters(&name)
                    .into_iter()
                    .map(|value| format_counter(value, style))
                    .join(&separator)
            }
            ContentToken::Attr(name) => doc.attr(node, &name).unwrap_or_default().to_string(),
        })
        .collect()
}

/// Inserts the stand-in for one pseudo-element of `node`, or returns `None`
/// when it generates nothing.
pub fn materialize(
    doc: &mut Document,
    host: &dyn LayoutHost,
    frames: &FrameStack,
    node: NodeId,
    kind: PseudoElement,
) -> Option<NodeId> {
    let style = host.computed_style(doc, node, Some(kind));
    let content = style.get("content");
    if matches!(content, "" | "normal" | "none") || style.get("width") == "0px" {
        return None;
    }
    let text = evaluate_content(doc, node, content, frames);
    let stand_in = doc.create_element(STAND_IN_TAG);
    doc.set_attr(stand_in, "style", &style.css_text());
    doc.set_text_content(stand_in, &text);
    let place = match kind {
        PseudoElement::Before => doc.first_child(node),
        PseudoElement::After => None,
    };
    doc.insert_before(node, stand_in, place);

    // The stand-in occupies real space in the flow; pull the element's own
    // content back to where it started.
    if kind == PseudoElement::Before && !matches!(style.get("position"), "absolute" | "fixed") {
        let margin = parse_float(style.get("margin-left")).unwrap_or(0.0);
        let width = host.offset_width(doc, stand_in);
        if let Some(css) = doc.inline_style_mut(stand_in) {
            css.set("margin-left", &format!("{}px", margin - width), false);
        }
    }
    log::trace!("materialized {kind:?} of {node:?} as {text:?}");
    Some(stand_in)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::SceneArena;
    use crate::context::{Frame, StackingAnchor};
    use drawdom_dom::el;

    fn frames(node: NodeId) -> FrameStack {
        let arena = SceneArena::new(Default::default());
        FrameStack::new(Frame::new(
            node,
            StackingAnchor {
                node,
                group: arena.root(),
            },
        ))
    }

    #[test]
    fn content_tokens_are_concatenated() {
        let mut doc = Document::new();
        let root = doc.root();
        let node = doc.append_spec(root, &el("span").attr("data-tip", "hello").into());
        let mut frames = frames(node);
        frames.reset_counter("chapter", 2.0);
        let nested = frames.current().child(node);
        frames.push(nested);
        frames.reset_counter("chapter", 3.0);

        let text = evaluate_content(
            &doc,
            node,
            r#""(" attr(data-tip) ") " counter(chapter, upper-roman) " " counters(chapter, ".")"#,
            &frames,
        );
        assert_eq!(text, "(hello) III 2.3");
    }

    #[test]
    fn missing_values_are_empty_or_zero() {
        let mut doc = Document::new();
        let root = doc.root();
        let node = doc.append_spec(root, &el("span").into());
        let frames = frames(node);
        assert_eq!(evaluate_content(&doc, node, "attr(title) counter(nope)", &frames), "0");
        assert_eq!(evaluate_content(&doc, node, r#""\2014 ""#, &frames), "\u{2014} ");
    }
}
