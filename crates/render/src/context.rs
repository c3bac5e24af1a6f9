//! Per-element traversal state.
//!
//! Every rendered element pushes a [`Frame`] that starts as a copy of its
//! parent's, so clip, transform, decorations and stacking anchor are
//! inherited down the tree and restored on the way back up. Counters are
//! different: a frame only holds the counters reset on it, and lookups walk
//! outwards like CSS counter scopes.

use crate::arena::GroupId;
use drawdom_dom::NodeId;
use drawdom_layout::TextDecorations;
use drawdom_style::{ComputedStyle, parse_float};
use drawdom_types::{Matrix, Rect};
use std::collections::BTreeMap;

/// Accumulated clipping in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ClipBox {
    #[default]
    Unbounded,
    Rect(Rect),
    /// The clips in effect do not overlap; nothing below is visible.
    Empty,
}

impl ClipBox {
    pub fn intersect(self, rect: Rect) -> ClipBox {
        match self {
            ClipBox::Unbounded => ClipBox::Rect(rect),
            ClipBox::Rect(current) => match current.intersect(&rect) {
                Some(r) => ClipBox::Rect(r),
                None => ClipBox::Empty,
            },
            ClipBox::Empty => ClipBox::Empty,
        }
    }

    /// True when nothing can show through: no overlap or zero area.
    pub fn is_empty(&self) -> bool {
        match self {
            ClipBox::Unbounded => false,
            ClipBox::Rect(r) => r.width == 0.0 || r.height == 0.0,
            ClipBox::Empty => true,
        }
    }

    pub fn rect(&self) -> Option<Rect> {
        match self {
            ClipBox::Rect(r) => Some(*r),
            _ => None,
        }
    }
}

/// The element that established the current stacking context and the
/// group its positioned descendants are inserted into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StackingAnchor {
    pub node: NodeId,
    pub group: GroupId,
}

/// The nearest enclosing table, needed by collapsed cell borders.
#[derive(Debug, Clone)]
pub struct TableInfo {
    pub node: NodeId,
    pub style: ComputedStyle,
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub node: NodeId,
    pub clip: ClipBox,
    /// Maps the element's local coordinates to page coordinates.
    pub matrix: Matrix,
    pub stacking: StackingAnchor,
    pub decorations: TextDecorations,
    pub table: Option<TableInfo>,
    counters: BTreeMap<String, f32>,
}

impl Frame {
    pub fn new(node: NodeId, stacking: StackingAnchor) -> Self {
        Self {
            node,
            clip: ClipBox::Unbounded,
            matrix: Matrix::unit(),
            stacking,
            decorations: TextDecorations::default(),
            table: None,
            counters: BTreeMap::new(),
        }
    }

    /// A child frame: everything inherited except counter scopes.
    pub fn child(&self, node: NodeId) -> Self {
        Self {
            node,
            clip: self.clip,
            matrix: self.matrix,
            stacking: self.stacking,
            decorations: self.decorations.clone(),
            table: self.table.clone(),
            counters: BTreeMap::new(),
        }
    }
}

/// The chain of frames from the export root to the element being rendered.
#[derive(Debug, Clone)]
pub struct FrameStack {
    root: Frame,
    nested: Vec<Frame>,
}

impl FrameStack {
    pub fn new(root: Frame) -> Self {
        Self {
            root,
            nested: Vec::new(),
        }
    }

    /// Starts a new page. Counters on the root frame carry over so that
    /// numbering continues across pages.
    pub fn reset(&mut self, root: Frame) {
        let counters = std::mem::take(&mut self.root.counters);
        self.root = Frame { counters, ..root };
        self.nested.clear();
    }

    pub fn current(&self) -> &Frame {
        self.nested.last().unwrap_or(&self.root)
    }

    pub fn current_mut(&mut self) -> &mut Frame {
        self.nested.last_mut().unwrap_or(&mut self.root)
    }

    pub fn push(&mut self, frame: Frame) {
        self.nested.push(frame);
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.nested.pop()
    }

    pub fn depth(&self) -> usize {
        self.nested.len()
    }

    fn frames(&self) -> impl DoubleEndedIterator<Item = &Frame> {
        std::iter::once(&self.root).chain(self.nested.iter())
    }

    /// Value of the innermost counter with this name.
    pub fn counter(&self, name: &str) -> Option<f32> {
        self.frames().rev().find_map(|f| f.counters.get(name).copied())
    }

    /// Values of every nested counter with this name, outermost first.
    pub fn all_counters(&self, name: &str) -> Vec<f32> {
        self.frames().filter_map(|f| f.counters.get(name).copied()).collect()
    }

    /// `counter-reset`: opens a new scope on the current frame.
    pub fn reset_counter(&mut self, name: &str, value: f32) {
        self.current_mut().counters.insert(name.to_string(), value);
    }

    /// `counter-increment`: bumps the innermost scope, creating the counter
    /// on the root frame if none exists.
    pub fn increment_counter(&mut self, name: &str, by: f32) {
        let scope = self
            .nested
            .iter_mut()
            .rev()
            .find(|f| f.counters.contains_key(name))
            .map(|f| &mut f.counters);
        let counters = match scope {
            Some(counters) => counters,
            None => &mut self.root.counters,
        };
        *counters.entry(name.to_string()).or_insert(0.0) += by;
    }
}

/// Reads `counter-reset` / `counter-increment`: names, each optionally
/// followed by an integer, with `default` for names given alone.
pub fn parse_counter_list(value: &str, default: f32) -> Vec<(String, f32)> {
    let mut out = Vec::new();
    if value.trim() == "none" {
        return out;
    }
    let mut tokens = value.split_whitespace().peekable();
    while let Some(name) = tokens.next() {
        let amount = tokens.peek().and_then(|t| parse_float(t));
        if amount.is_some() {
            tokens.next();
        }
        out.push((name.to_string(), amount.unwrap_or(default)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use drawdom_dom::Document;

    fn stack() -> (FrameStack, NodeId) {
        let mut doc = Document::new();
        let node = doc.create_element("div");
        let anchor = StackingAnchor {
            node,
            group: crate::arena::SceneArena::new(Default::default()).root(),
        };
        (FrameStack::new(Frame::new(node, anchor)), node)
    }

    #[test]
    fn clip_boxes_narrow_and_empty() {
        let clip = ClipBox::Unbounded.intersect(Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(clip.rect(), Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        let clip = clip.intersect(Rect::new(50.0, 50.0, 100.0, 100.0));
        assert_eq!(clip.rect(), Some(Rect::new(50.0, 50.0, 50.0, 50.0)));
        assert!(!clip.is_empty());

        let touching = clip.intersect(Rect::new(100.0, 60.0, 10.0, 10.0));
        assert!(touching.is_empty());
        assert_ne!(touching, ClipBox::Empty);

        let apart = clip.intersect(Rect::new(500.0, 500.0, 10.0, 10.0));
        assert_eq!(apart, ClipBox::Empty);
        assert_eq!(apart.intersect(Rect::new(0.0, 0.0, 1000.0, 1000.0)), ClipBox::Empty);
    }

    #[test]
    fn counters_follow_scopes() {
        let (mut frames, node) = stack();
        frames.reset_counter("item", 0.0);
        frames.increment_counter("item", 1.0);

        let child = frames.current().child(node);
        frames.push(child);
        frames.increment_counter("item", 1.0);
        frames.reset_counter("item", 10.0);
        frames.increment_counter("item", 2.0);
        assert_eq!(frames.counter("item"), Some(12.0));
        assert_eq!(frames.all_counters("item"), vec![2.0, 12.0]);

        frames.pop();
        assert_eq!(frames.counter("item"), Some(2.0));
        assert_eq!(frames.counter("other"), None);
    }

    #[test]
    fn counter_lists() {
        assert_eq!(
            parse_counter_list("chapter section 3 note -1", 0.0),
            vec![("chapter".to_string(), 0.0), ("section".to_string(), 3.0), ("note".to_string(), -1.0)]
        );
        assert!(parse_counter_list("none", 1.0).is_empty());
        assert!(parse_counter_list("", 1.0).is_empty());
    }

    #[test]
    fn undeclared_counters_land_on_the_root() {
        let (mut frames, node) = stack();
        let child = frames.current().child(node);
        frames.push(child);
        frames.increment_counter("page", 1.0);
        frames.pop();
        assert_eq!(frames.counter("page"), Some(1.0));

        let root = frames.current().clone();
        frames.reset(root);
        assert_eq!(frames.counter("page"), Some(1.0));
        assert_eq!(frames.depth(), 0);
    }
}
