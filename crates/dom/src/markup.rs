//! XHTML fragments as [`NodeSpec`] trees.
//!
//! Markup must be well-formed XML: void elements are written `<br/>`.
//! Only the predefined XML entities and character references are known.
use crate::builder::{ElementSpec, NodeSpec, el};
use crate::error::DomError;
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

fn markup_error(e: impl std::fmt::Display) -> DomError {
    DomError::Markup(e.to_string())
}

/// Parses a sequence of sibling nodes. Tag names are lowercased.
pub fn parse_fragment(source: &str) -> Result<Vec<NodeSpec>, DomError> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(false);
    let mut open: Vec<ElementSpec> = Vec::new();
    let mut top: Vec<NodeSpec> = Vec::new();

    loop {
        match reader.read_event().map_err(markup_error)? {
            Event::Start(e) => open.push(start_element(&e)?),
            Event::Empty(e) => {
                let element = start_element(&e)?;
                push_node(&mut open, &mut top, element.into());
            }
            Event::End(e) => {
                let Some(element) = open.pop() else {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    return Err(DomError::Markup(format!("unexpected </{name}>")));
                };
                push_node(&mut open, &mut top, element.into());
            }
            Event::Text(e) => {
                let raw = std::str::from_utf8(&e).map_err(markup_error)?;
                let text = unescape(raw).map_err(markup_error)?;
                push_text(&mut open, &mut top, &text);
            }
            Event::CData(e) => {
                let text = std::str::from_utf8(&e).map_err(markup_error)?;
                push_text(&mut open, &mut top, text);
            }
            Event::GeneralRef(e) => {
                let name = std::str::from_utf8(&e).map_err(markup_error)?;
                let entity = format!("&{name};");
                let text = unescape(&entity).map_err(markup_error)?;
                push_text(&mut open, &mut top, &text);
            }
            Event::Comment(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                push_node(&mut open, &mut top, NodeSpec::Comment(text));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match open.last() {
        Some(unclosed) => Err(DomError::Markup(format!("unclosed <{}>", unclosed.tag))),
        None => Ok(top),
    }
}

fn start_element(e: &BytesStart) -> Result<ElementSpec, DomError> {
    let tag = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
    let mut spec = el(&tag);
    for attr in e.attributes() {
        let attr = attr.map_err(markup_error)?;
        let name = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let raw = std::str::from_utf8(&attr.value).map_err(markup_error)?;
        let value = unescape(raw).map_err(markup_error)?;
        spec = spec.attr(&name, &value);
    }
    Ok(spec)
}

fn siblings<'a>(open: &'a mut [ElementSpec], top: &'a mut Vec<NodeSpec>) -> &'a mut Vec<NodeSpec> {
    match open.last_mut() {
        Some(parent) => &mut parent.children,
        None => top,
    }
}

fn push_node(open: &mut [ElementSpec], top: &mut Vec<NodeSpec>, node: NodeSpec) {
    siblings(open, top).push(node);
}

/// Appends text, merging with a preceding text node so entities do not
/// split a run.
fn push_text(open: &mut [ElementSpec], top: &mut Vec<NodeSpec>, text: &str) {
    if text.is_empty() {
        return;
    }
    let nodes = siblings(open, top);
    match nodes.last_mut() {
        Some(NodeSpec::Text(previous)) => previous.push_str(text),
        _ => nodes.push(NodeSpec::Text(text.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_elements_and_text() {
        let nodes = parse_fragment(r#"<DIV class="footer">Page <b>1</b> of 3<br/></DIV>"#).unwrap();
        let expected: NodeSpec = el("div")
            .class("footer")
            .text("Page ")
            .child(el("b").text("1"))
            .text(" of 3")
            .child(el("br"))
            .into();
        assert_eq!(nodes, vec![expected]);
    }

    #[test]
    fn entities_are_resolved() {
        let nodes = parse_fragment(r#"<p title="a &amp; b">x &lt; y &#169;</p>"#).unwrap();
        let expected: NodeSpec = el("p").attr("title", "a & b").text("x < y \u{a9}").into();
        assert_eq!(nodes, vec![expected]);
    }

    #[test]
    fn several_top_level_nodes() {
        let nodes = parse_fragment("<i>a</i> <i>b</i>").unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[1], NodeSpec::Text(" ".to_string()));
    }

    #[test]
    fn malformed_markup_is_an_error() {
        assert!(matches!(parse_fragment("<div><p>x</div>"), Err(DomError::Markup(_))));
        assert!(matches!(parse_fragment("<div>"), Err(DomError::Markup(_))));
    }
}
