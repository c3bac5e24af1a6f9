use crate::inline_style::InlineStyle;
use crate::selector::SelectorList;
use crate::stylesheet::StyleSheet;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub style: InlineStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A document tree stored in an arena. Detached nodes stay in the arena and
/// can be re-attached; ids are never reused.
#[derive(Debug)]
pub struct Document {
    id: u64,
    revision: u64,
    nodes: Vec<Node>,
    style_sheets: Vec<StyleSheet>,
}

impl Clone for Document {
    /// A clone is a distinct document: same node ids, fresh identity.
    fn clone(&self) -> Self {
        Self {
            id: NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed),
            revision: 0,
            nodes: self.nodes.clone(),
            style_sheets: self.style_sheets.clone(),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn char_to_byte(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map(|(b, _)| b)
        .unwrap_or(s.len())
}

impl Document {
    pub fn new() -> Self {
        Self {
            id: NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed),
            revision: 0,
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
            style_sheets: Vec::new(),
        }
    }

    /// Unique per document instance, including clones.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Bumped on every structural, attribute or text mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn contains_id(&self, node: NodeId) -> bool {
        node.0 < self.nodes.len()
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        self.touch();
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    // --- Style sheets ---

    pub fn style_sheets(&self) -> &[StyleSheet] {
        &self.style_sheets
    }

    pub fn add_style_sheet(&mut self, sheet: StyleSheet) {
        self.style_sheets.push(sheet);
    }

    // --- Creation ---

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            style: InlineStyle::default(),
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Comment(text.to_string()))
    }

    // --- Node data ---

    pub fn data(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.0].data
    }

    pub fn element(&self, node: NodeId) -> Option<&ElementData> {
        match &self.nodes[node.0].data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[node.0].data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    pub fn is_text(&self, node: NodeId) -> bool {
        matches!(self.nodes[node.0].data, NodeData::Text(_))
    }

    /// Lowercase tag name of an element.
    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.tag.as_str())
    }

    pub fn is_tag(&self, node: NodeId, tag: &str) -> bool {
        self.tag_name(node) == Some(tag)
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.attr(node, name).is_some()
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(element) = self.element_mut(node) else {
            return;
        };
        if name == "style" {
            element.style = InlineStyle::parse(value);
        } else {
            match element.attrs.iter_mut().find(|(k, _)| k == name) {
                Some((_, v)) => *v = value.to_string(),
                None => element.attrs.push((name.to_string(), value.to_string())),
            }
        }
        self.touch();
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) {
        if let Some(element) = self.element_mut(node) {
            element.attrs.retain(|(k, _)| k != name);
            self.touch();
        }
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attr(node, "class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if self.has_class(node, class) || !self.is_element(node) {
            return;
        }
        let classes = match self.attr(node, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
            _ => class.to_string(),
        };
        self.set_attr(node, "class", &classes);
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        let Some(existing) = self.attr(node, "class") else {
            return;
        };
        let remaining = existing
            .split_whitespace()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attr(node, "class", &remaining);
    }

    pub fn inline_style(&self, node: NodeId) -> Option<&InlineStyle> {
        self.element(node).map(|e| &e.style)
    }

    /// Mutable inline style. Counts as a mutation.
    pub fn inline_style_mut(&mut self, node: NodeId) -> Option<&mut InlineStyle> {
        self.touch();
        self.element_mut(node).map(|e| &mut e.style)
    }

    pub fn set_inline_style(&mut self, node: NodeId, style: InlineStyle) {
        if let Some(element) = self.element_mut(node) {
            element.style = style;
            self.touch();
        }
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node.0].data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) {
        if let NodeData::Text(t) = &mut self.nodes[node.0].data {
            *t = text.to_string();
            self.touch();
        }
    }

    /// Replaces all children with a single text node.
    pub fn set_text_content(&mut self, node: NodeId, text: &str) {
        for child in self.children(node).to_vec() {
            self.detach(child);
        }
        if !text.is_empty() {
            let t = self.create_text(text);
            self.append_child(node, t);
        }
    }

    /// Concatenated text of the node and its descendants.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].data {
            NodeData::Text(t) => out.push_str(t),
            NodeData::Comment(_) => {}
            _ => {
                for &child in &self.nodes[node.0].children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// Text length in characters.
    pub fn char_len(&self, node: NodeId) -> usize {
        self.text(node).map(|t| t.chars().count()).unwrap_or(0)
    }

    /// Characters `start..end` of a text node.
    pub fn text_slice(&self, node: NodeId, start: usize, end: usize) -> String {
        self.text(node)
            .map(|t| t.chars().skip(start).take(end.saturating_sub(start)).collect())
            .unwrap_or_default()
    }

    // --- Navigation ---

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .filter(|&c| self.is_element(c))
            .collect()
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).first().copied()
    }

    pub fn index_in_parent(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|&c| c == node)
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let idx = self.index_in_parent(node)?;
        self.children(parent).get(idx + 1).copied()
    }

    pub fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let idx = self.index_in_parent(node)?;
        idx.checked_sub(1).map(|i| self.children(parent)[i])
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(node), move |&n| self.parent(n))
    }

    /// Descendants in document order, excluding `node` itself.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    /// True when `node` is `ancestor` or lies inside it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Attached to the document root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.contains(self.root(), node)
    }

    // --- Mutation ---

    /// Removes `node` from its parent; it stays in the arena.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != node);
            self.touch();
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.touch();
    }

    /// Inserts `child` before `reference` (a child of `parent`), or appends
    /// when `reference` is `None` or not a child.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        self.detach(child);
        let idx = reference
            .and_then(|r| self.children(parent).iter().position(|&c| c == r))
            .unwrap_or(self.children(parent).len());
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(idx, child);
        self.touch();
    }

    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        let first = self.first_child(parent);
        self.insert_before(parent, child, first);
    }

    /// A detached copy of the node without its children.
    pub fn shallow_clone(&mut self, node: NodeId) -> NodeId {
        let data = self.nodes[node.0].data.clone();
        self.push(data)
    }

    /// A detached deep copy of the node.
    pub fn deep_clone(&mut self, node: NodeId) -> NodeId {
        let copy = self.shallow_clone(node);
        for child in self.children(node).to_vec() {
            let child_copy = self.deep_clone(child);
            self.nodes[child_copy.0].parent = Some(copy);
            self.nodes[copy.0].children.push(child_copy);
        }
        copy
    }

    /// Splits a text node at a character offset. The original keeps the
    /// leading part; the new node holding the rest is inserted after it.
    pub fn split_text(&mut self, node: NodeId, offset: usize) -> Option<NodeId> {
        let full = self.text(node)?.to_string();
        let at = char_to_byte(&full, offset);
        let (head, tail) = full.split_at(at);
        let (head, tail) = (head.to_string(), tail.to_string());
        self.set_text(node, &head);
        let rest = self.create_text(&tail);
        if let Some(parent) = self.parent(node) {
            let next = self.next_sibling(node);
            self.insert_before(parent, rest, next);
        }
        Some(rest)
    }

    /// Moves everything inside `root` that precedes `target` in document
    /// order into a fresh shallow copy of `root`, cloning the partially
    /// covered ancestors of `target`, and returns that copy.
    ///
    /// `target` and its following content stay where they are. Returns
    /// `None` when `target` is not inside `root` or is `root` itself.
    pub fn extract_before(&mut self, root: NodeId, target: NodeId) -> Option<NodeId> {
        if target == root || !self.contains(root, target) {
            return None;
        }
        let mut path = vec![target];
        path.extend(self.ancestors(target).take_while(|&a| a != root));
        path.push(root);
        path.reverse();

        let extracted = self.shallow_clone(root);
        let mut dest = extracted;
        for pair in path.windows(2) {
            let (parent, child) = (pair[0], pair[1]);
            let idx = self.children(parent).iter().position(|&c| c == child)?;
            let moved: Vec<NodeId> = self.nodes[parent.0].children.drain(..idx).collect();
            for m in moved {
                self.nodes[m.0].parent = Some(dest);
                self.nodes[dest.0].children.push(m);
            }
            if child != target {
                let partial = self.shallow_clone(child);
                self.nodes[partial.0].parent = Some(dest);
                self.nodes[dest.0].children.push(partial);
                dest = partial;
            }
        }
        self.touch();
        Some(extracted)
    }

    // --- Selectors ---

    pub fn matches(&self, node: NodeId, selector: &SelectorList) -> bool {
        selector.matches(self, node)
    }

    /// Nearest inclusive ancestor matching the selector.
    pub fn closest(&self, node: NodeId, selector: &SelectorList) -> Option<NodeId> {
        std::iter::once(node)
            .chain(self.ancestors(node))
            .find(|&n| selector.matches(self, n))
    }

    pub fn query_selector(&self, scope: NodeId, selector: &SelectorList) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|&n| selector.matches(self, n))
    }

    pub fn query_selector_all(&self, scope: NodeId, selector: &SelectorList) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&n| selector.matches(self, n))
            .collect()
    }

    /// Descendant elements with the given tag, in document order.
    pub fn elements_by_tag(&self, scope: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&n| self.is_tag(n, tag))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{el, text};

    fn sample() -> (Document, NodeId) {
        let mut doc = Document::new();
        let root = doc.root();
        let div = doc.append_spec(
            root,
            &el("div")
                .child(el("p").id("a").text("one"))
                .child(el("p").id("b").child(text("two")).child(el("span").text("three")))
                .child(el("p").id("c").text("four"))
                .into(),
        );
        (doc, div)
    }

    #[test]
    fn clone_has_new_identity() {
        let (doc, _) = sample();
        let copy = doc.clone();
        assert_ne!(doc.id(), copy.id());
        assert_eq!(doc.text_content(doc.root()), copy.text_content(copy.root()));
    }

    #[test]
    fn split_text_keeps_order() {
        let mut doc = Document::new();
        let root = doc.root();
        let p = doc.append_spec(root, &el("p").text("hello world").into());
        let t = doc.first_child(p).unwrap();
        let rest = doc.split_text(t, 6).unwrap();
        assert_eq!(doc.text(t), Some("hello "));
        assert_eq!(doc.text(rest), Some("world"));
        assert_eq!(doc.children(p), &[t, rest]);
    }

    #[test]
    fn extract_before_nested_target() {
        let (mut doc, div) = sample();
        let b = doc.element_children(div)[1];
        let span = doc.element_children(b)[0];
        let page = doc.extract_before(div, span).unwrap();

        assert_eq!(doc.text_content(page), "onetwo");
        assert_eq!(doc.text_content(div), "threefour");
        // The partially covered <p id=b> is cloned into the page and
        // still present in the source.
        let page_children = doc.element_children(page);
        assert_eq!(page_children.len(), 2);
        assert_eq!(doc.attr(page_children[1], "id"), Some("b"));
        assert_eq!(doc.parent(span), Some(b));
    }

    #[test]
    fn extract_before_root_is_none() {
        let (mut doc, div) = sample();
        assert!(doc.extract_before(div, div).is_none());
    }

    #[test]
    fn deep_clone_is_detached() {
        let (mut doc, div) = sample();
        let copy = doc.deep_clone(div);
        assert_eq!(doc.parent(copy), None);
        assert_eq!(doc.text_content(copy), doc.text_content(div));
        assert!(!doc.is_connected(copy));
    }

    #[test]
    fn classes() {
        let mut doc = Document::new();
        let root = doc.root();
        let d = doc.append_spec(root, &el("div").class("x").into());
        doc.add_class(d, "y");
        assert!(doc.has_class(d, "x") && doc.has_class(d, "y"));
        doc.remove_class(d, "x");
        assert_eq!(doc.attr(d, "class"), Some("y"));
    }
}
