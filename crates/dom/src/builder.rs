//! Declarative construction of document fragments.
//!
//! ```
//! use drawdom_dom::{Document, el};
//! let mut doc = Document::new();
//! let root = doc.root();
//! let div = doc.append_spec(root, &el("div").style("color: red").text("hi").into());
//! assert_eq!(doc.text_content(div), "hi");
//! ```
use crate::document::{Document, NodeId};

#[derive(Debug, Clone, PartialEq)]
pub enum NodeSpec {
    Element(ElementSpec),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementSpec {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<NodeSpec>,
}

pub fn el(tag: &str) -> ElementSpec {
    ElementSpec {
        tag: tag.to_string(),
        ..Default::default()
    }
}

pub fn text(content: &str) -> NodeSpec {
    NodeSpec::Text(content.to_string())
}

impl ElementSpec {
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn style(self, css: &str) -> Self {
        self.attr("style", css)
    }

    pub fn child(mut self, child: impl Into<NodeSpec>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I, C>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<NodeSpec>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn text(self, content: &str) -> Self {
        self.child(NodeSpec::Text(content.to_string()))
    }
}

impl From<ElementSpec> for NodeSpec {
    fn from(spec: ElementSpec) -> Self {
        NodeSpec::Element(spec)
    }
}

impl From<&str> for NodeSpec {
    fn from(s: &str) -> Self {
        NodeSpec::Text(s.to_string())
    }
}

impl Document {
    /// Creates a detached subtree from the spec.
    pub fn build(&mut self, spec: &NodeSpec) -> NodeId {
        match spec {
            NodeSpec::Text(t) => self.create_text(t),
            NodeSpec::Comment(c) => self.create_comment(c),
            NodeSpec::Element(e) => {
                let node = self.create_element(&e.tag);
                for (k, v) in &e.attrs {
                    self.set_attr(node, k, v);
                }
                for child in &e.children {
                    let c = self.build(child);
                    self.append_child(node, c);
                }
                node
            }
        }
    }

    pub fn append_spec(&mut self, parent: NodeId, spec: &NodeSpec) -> NodeId {
        let node = self.build(spec);
        self.append_child(parent, node);
        node
    }
}
