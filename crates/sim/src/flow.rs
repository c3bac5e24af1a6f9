//! Block and inline flow.
//!
//! A deliberately small layout model: blocks stack vertically with no
//! margin collapsing, table rows split their width evenly between cells,
//! inline content wraps at spaces using monospace metrics (every character
//! is half the font size wide, lines are 1.25 font sizes tall unless
//! `line-height` says otherwise), and positioned boxes are placed against
//! the padding box of their nearest positioned ancestor.

use crate::cascade::{self, StyleRule};
use crate::values::resolve_length;
use drawdom_dom::{Document, NodeData, NodeId};
use drawdom_style::{ComputedStyle, Vendor};
use drawdom_types::{Edges, Rect};
use std::collections::HashMap;

/// Width of a character as a fraction of the font size.
pub const CHAR_WIDTH: f32 = 0.5;
/// Height of a `line-height: normal` line as a multiple of the font size.
pub const LINE_HEIGHT: f32 = 1.25;
const TAB_STOP: f32 = 8.0;

/// One laid-out character.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub rect: Rect,
    pub line: usize,
}

/// The result of one layout pass.
#[derive(Debug, Default)]
pub struct LayoutTree {
    pub styles: HashMap<NodeId, ComputedStyle>,
    pub boxes: HashMap<NodeId, Vec<Rect>>,
    pub glyphs: HashMap<NodeId, Vec<Glyph>>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Metrics {
    margin: Edges,
    border: Edges,
    padding: Edges,
    font_size: f32,
    line_height: f32,
}

impl Metrics {
    fn horizontal(&self) -> f32 {
        self.border.left + self.border.right + self.padding.left + self.padding.right
    }

    fn vertical(&self) -> f32 {
        self.border.top + self.border.bottom + self.padding.top + self.padding.bottom
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Skip,
    Text,
    Absolute,
    Block,
    Atom,
    Inline,
    LineBreak,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    node: NodeId,
    x: f32,
    y: f32,
}

#[derive(Debug, Clone, Copy)]
enum Piece {
    Glyph {
        node: NodeId,
        index: usize,
        width: f32,
        height: f32,
        space: bool,
        collapsible: bool,
        tab: bool,
        wrap: bool,
    },
    Atom {
        node: NodeId,
        width: f32,
        height: f32,
        content_width: f32,
        margin: Edges,
    },
    Break,
    Open(NodeId),
    Close(NodeId),
}

#[derive(Debug, Clone, Copy, Default)]
struct Placed {
    x: f32,
    width: f32,
    line: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct Line {
    height: f32,
    right: f32,
    has_content: bool,
}

/// Lays out the whole document at the given viewport width.
pub fn layout(doc: &Document, rules: &[StyleRule], vendor: Vendor, viewport_width: f32) -> LayoutTree {
    let mut tree = LayoutTree::default();
    for node in doc.descendants(doc.root()) {
        if !doc.is_element(node) {
            continue;
        }
        let parent = doc.parent(node).and_then(|p| tree.styles.get(&p));
        let style = cascade::resolve(vendor, parent, cascade::declarations(rules, doc, node, None));
        tree.styles.insert(node, style);
    }

    let mut flow = Flow {
        doc,
        tree,
        pending: vec![Vec::new()],
        measure_floor: None,
        next_line: 0,
    };
    let height = flow.layout_children(doc.root(), 0.0, 0.0, viewport_width);
    let viewport = Rect::new(0.0, 0.0, viewport_width, height);
    if let Some(pending) = flow.pending.pop() {
        flow.place_absolutes(pending, viewport);
    }
    flow.tree
}

struct Flow<'a> {
    doc: &'a Document,
    tree: LayoutTree,
    /// Absolutely positioned boxes waiting for their containing block.
    pending: Vec<Vec<Pending>>,
    /// Set while measuring an inline block; positioned boxes owned by an
    /// outer containing block are not queued twice.
    measure_floor: Option<usize>,
    next_line: usize,
}

fn edges(style: &ComputedStyle, prefix: &str, suffix: &str) -> Edges {
    let side = |s: &str| style.px(&format!("{prefix}-{s}{suffix}"));
    Edges::new(side("top"), side("right"), side("bottom"), side("left"))
}

fn line_height(style: &ComputedStyle, font_size: f32) -> f32 {
    match style.get("line-height") {
        "normal" | "" => font_size * LINE_HEIGHT,
        _ => style.px("line-height"),
    }
}

impl Flow<'_> {
    fn style(&self, node: NodeId) -> Option<&ComputedStyle> {
        self.tree.styles.get(&node)
    }

    fn prop(&self, node: NodeId, name: &str) -> &str {
        self.style(node).map_or("", |s| s.get(name))
    }

    fn metrics(&self, node: NodeId) -> Metrics {
        let Some(style) = self.style(node) else {
            return Metrics {
                font_size: 16.0,
                line_height: 16.0 * LINE_HEIGHT,
                ..Metrics::default()
            };
        };
        let font_size = style.px("font-size");
        Metrics {
            margin: edges(style, "margin", ""),
            border: edges(style, "border", "-width"),
            padding: edges(style, "padding", ""),
            font_size,
            line_height: line_height(style, font_size),
        }
    }

    fn specified(&self, node: NodeId, prop: &str, base: Option<f32>) -> Option<f32> {
        let style = self.style(node)?;
        resolve_length(style.get(prop), style.px("font-size"), base)
    }

    fn kind(&self, node: NodeId) -> Kind {
        let doc = self.doc;
        match doc.data(node) {
            NodeData::Text(_) => return Kind::Text,
            NodeData::Element(_) => {}
            _ => return Kind::Skip,
        }
        let display = self.prop(node, "display");
        if matches!(display, "none" | "table-column" | "table-column-group") {
            return Kind::Skip;
        }
        if matches!(self.prop(node, "position"), "absolute" | "fixed") {
            return Kind::Absolute;
        }
        if doc.is_tag(node, "br") {
            return Kind::LineBreak;
        }
        if self.prop(node, "float") != "none" {
            return Kind::Block;
        }
        match display {
            "inline" => Kind::Inline,
            "inline-block" | "inline-table" | "inline-flex" | "inline-grid" => Kind::Atom,
            _ => Kind::Block,
        }
    }

    fn queue_absolute(&mut self, node: NodeId, x: f32, y: f32) {
        if self.measure_floor.is_some_and(|floor| self.pending.len() <= floor) {
            return;
        }
        if let Some(list) = self.pending.last_mut() {
            list.push(Pending { node, x, y });
        }
    }

    /// Lays out the children of `node` into the content box starting at
    /// `(x, y)`. Returns the content height.
    fn layout_children(&mut self, node: NodeId, x: f32, y: f32, width: f32) -> f32 {
        let doc = self.doc;
        let mut cursor = y;
        let mut run: Vec<NodeId> = Vec::new();
        for &child in doc.children(node) {
            match self.kind(child) {
                Kind::Skip => {}
                Kind::Absolute => self.queue_absolute(child, x, cursor),
                Kind::Block => {
                    cursor += self.flush(&mut run, node, x, cursor, width);
                    cursor += self.layout_block(child, x, cursor, width);
                }
                Kind::Text | Kind::Atom | Kind::Inline | Kind::LineBreak => run.push(child),
            }
        }
        cursor += self.flush(&mut run, node, x, cursor, width);
        cursor - y
    }

    fn flush(&mut self, run: &mut Vec<NodeId>, parent: NodeId, x: f32, y: f32, width: f32) -> f32 {
        if run.is_empty() {
            return 0.0;
        }
        let items = std::mem::take(run);
        self.layout_inline(&items, parent, x, y, width)
    }

    /// Lays out a block-level box at `(x, y)` (its margin edge) within
    /// `available` pixels. Returns the outer height including margins.
    fn layout_block(&mut self, node: NodeId, x: f32, y: f32, available: f32) -> f32 {
        let m = self.metrics(node);
        let outer = m.margin.left + m.margin.right + m.horizontal();
        let content_width = match self.content_width(node, &m, Some(available)) {
            Some(w) => w,
            None => (available - outer).max(0.0),
        };
        let rect = self.layout_box(node, x + m.margin.left, y + m.margin.top, content_width, None);
        m.margin.top + rect.height + m.margin.bottom
    }

    /// The specified content width, honouring `box-sizing`.
    fn content_width(&self, node: NodeId, m: &Metrics, base: Option<f32>) -> Option<f32> {
        let width = self.specified(node, "width", base)?;
        if self.prop(node, "box-sizing") == "border-box" {
            Some((width - m.horizontal()).max(0.0))
        } else {
            Some(width)
        }
    }

    fn content_height(&self, node: NodeId, m: &Metrics) -> Option<f32> {
        let height = self.specified(node, "height", None)?;
        if self.prop(node, "box-sizing") == "border-box" {
            Some((height - m.vertical()).max(0.0))
        } else {
            Some(height)
        }
    }

    /// Lays out a box whose border edge starts at `(x, y)` and records it.
    /// `fixed_height` replaces the flow height of replaced content.
    fn layout_box(&mut self, node: NodeId, x: f32, y: f32, content_width: f32, fixed_height: Option<f32>) -> Rect {
        let m = self.metrics(node);
        let position = self.prop(node, "position").to_string();
        let positioned = position != "static";
        if positioned {
            self.pending.push(Vec::new());
        }
        let cx = x + m.border.left + m.padding.left;
        let cy = y + m.border.top + m.padding.top;
        let flow_height = match fixed_height {
            Some(h) => h,
            None if self.prop(node, "display") == "table-row" => self.layout_row(node, cx, cy, content_width),
            None => self.layout_children(node, cx, cy, content_width),
        };
        let height = self.content_height(node, &m).unwrap_or(flow_height);
        let rect = Rect::new(x, y, content_width + m.horizontal(), height + m.vertical());
        self.tree.boxes.insert(node, vec![rect]);

        if positioned && let Some(pending) = self.pending.pop() {
            self.place_absolutes(pending, rect.inset(&m.border));
        }
        if position == "relative" {
            let dx = self
                .specified(node, "left", None)
                .or_else(|| self.specified(node, "right", None).map(|r| -r))
                .unwrap_or(0.0);
            let dy = self
                .specified(node, "top", None)
                .or_else(|| self.specified(node, "bottom", None).map(|b| -b))
                .unwrap_or(0.0);
            if dx != 0.0 || dy != 0.0 {
                self.shift_subtree(node, dx, dy);
            }
        }
        rect
    }

    /// Cells share the row width evenly and stretch to the tallest cell.
    fn layout_row(&mut self, row: NodeId, x: f32, y: f32, width: f32) -> f32 {
        let doc = self.doc;
        let cells: Vec<NodeId> = doc
            .element_children(row)
            .into_iter()
            .filter(|&c| self.kind(c) != Kind::Skip)
            .collect();
        if cells.is_empty() {
            return 0.0;
        }
        let cell_width = width / cells.len() as f32;
        let mut height = 0.0f32;
        for (i, &cell) in cells.iter().enumerate() {
            height = height.max(self.layout_block(cell, x + i as f32 * cell_width, y, cell_width));
        }
        for cell in cells {
            if let Some(rect) = self.tree.boxes.get_mut(&cell).and_then(|b| b.first_mut()) {
                rect.height = height;
            }
        }
        height
    }

    fn shift_subtree(&mut self, node: NodeId, dx: f32, dy: f32) {
        for n in std::iter::once(node).chain(self.doc.descendants(node)) {
            if let Some(boxes) = self.tree.boxes.get_mut(&n) {
                for rect in boxes.iter_mut() {
                    *rect = rect.translate(dx, dy);
                }
            }
            if let Some(glyphs) = self.tree.glyphs.get_mut(&n) {
                for glyph in glyphs.iter_mut() {
                    glyph.rect = glyph.rect.translate(dx, dy);
                }
            }
        }
    }

    fn place_absolutes(&mut self, pending: Vec<Pending>, containing: Rect) {
        for Pending { node, x, y } in pending {
            let m = self.metrics(node);
            let left = self.specified(node, "left", Some(containing.width));
            let right = self.specified(node, "right", Some(containing.width));
            let top = self.specified(node, "top", Some(containing.height));
            let bottom = self.specified(node, "bottom", Some(containing.height));
            let replaced = self.intrinsic_size(node, &m);

            let content_width = match (self.content_width(node, &m, Some(containing.width)), left, right) {
                (Some(w), _, _) => w,
                (None, Some(l), Some(r)) => {
                    (containing.width - l - r - m.margin.left - m.margin.right - m.horizontal()).max(0.0)
                }
                (None, _, _) => match replaced {
                    Some((w, _)) => w,
                    None => self.natural_width(node, &m).min((containing.width - m.horizontal()).max(0.0)),
                },
            };
            let fixed_height = replaced.map(|(_, h)| self.content_height(node, &m).unwrap_or(h));
            let border_width = content_width + m.horizontal();
            let bx = match (left, right) {
                (Some(l), _) => containing.x + l + m.margin.left,
                (None, Some(r)) => containing.right() - r - m.margin.right - border_width,
                (None, None) => x + m.margin.left,
            };
            let by = match (top, bottom) {
                (Some(t), _) => containing.y + t + m.margin.top,
                (None, Some(b)) => {
                    let height = self.measure(node, content_width, fixed_height).height;
                    containing.bottom() - b - m.margin.bottom - height
                }
                (None, None) => y + m.margin.top,
            };
            self.layout_box(node, bx, by, content_width, fixed_height);
        }
    }

    /// Lays out a box off to the side to learn its size.
    fn measure(&mut self, node: NodeId, content_width: f32, fixed_height: Option<f32>) -> Rect {
        let saved = self.measure_floor;
        if saved.is_none() {
            self.measure_floor = Some(self.pending.len());
        }
        let rect = self.layout_box(node, 0.0, 0.0, content_width, fixed_height);
        self.measure_floor = saved;
        rect
    }

    /// Content size of replaced elements.
    fn intrinsic_size(&self, node: NodeId, m: &Metrics) -> Option<(f32, f32)> {
        let doc = self.doc;
        let tag = doc.tag_name(node)?;
        let attr = |name: &str| doc.attr(node, name).and_then(drawdom_style::parse_float);
        let size = match tag {
            "img" => (attr("width").unwrap_or(0.0), attr("height").unwrap_or(0.0)),
            "canvas" | "iframe" | "video" | "object" | "svg" => {
                (attr("width").unwrap_or(300.0), attr("height").unwrap_or(150.0))
            }
            "input" => match doc.attr(node, "type").unwrap_or("text") {
                "checkbox" | "radio" => (13.0, 13.0),
                _ => (150.0, m.line_height + 4.0),
            },
            "select" => (100.0, m.line_height + 4.0),
            "textarea" => (200.0, 2.0 * m.line_height + 4.0),
            _ => return None,
        };
        Some(size)
    }

    /// Unwrapped width of an element's text.
    fn natural_width(&self, node: NodeId, m: &Metrics) -> f32 {
        let text = self.doc.text_content(node);
        let chars = text.split_whitespace().collect::<Vec<_>>().join(" ").chars().count();
        chars as f32 * m.font_size * CHAR_WIDTH
    }

    fn measure_atom(&mut self, node: NodeId, available: f32) -> Piece {
        let m = self.metrics(node);
        let (content_width, fixed_height) = match self.intrinsic_size(node, &m) {
            Some((w, h)) => (
                self.content_width(node, &m, Some(available)).unwrap_or(w),
                Some(self.content_height(node, &m).unwrap_or(h)),
            ),
            None => (
                self.content_width(node, &m, Some(available))
                    .unwrap_or_else(|| self.natural_width(node, &m).min((available - m.horizontal()).max(0.0))),
                None,
            ),
        };
        let rect = self.measure(node, content_width, fixed_height);
        Piece::Atom {
            node,
            width: rect.width,
            height: rect.height,
            content_width,
            margin: m.margin,
        }
    }

    fn collect(&mut self, node: NodeId, available: f32, origin: (f32, f32), pieces: &mut Vec<Piece>) {
        match self.kind(node) {
            Kind::Skip => {}
            Kind::Absolute => self.queue_absolute(node, origin.0, origin.1),
            Kind::LineBreak => pieces.push(Piece::Break),
            Kind::Atom | Kind::Block => {
                let atom = self.measure_atom(node, available);
                pieces.push(atom);
            }
            Kind::Inline => {
                pieces.push(Piece::Open(node));
                let doc = self.doc;
                for &child in doc.children(node) {
                    self.collect(child, available, origin, pieces);
                }
                pieces.push(Piece::Close(node));
            }
            Kind::Text => self.collect_text(node, pieces),
        }
    }

    fn collect_text(&mut self, node: NodeId, pieces: &mut Vec<Piece>) {
        let doc = self.doc;
        let parent = doc.parent(node).unwrap_or(node);
        let m = self.metrics(parent);
        let white_space = self.prop(parent, "white-space");
        let preserve = matches!(white_space, "pre" | "pre-wrap" | "break-spaces");
        let wrap = !matches!(white_space, "pre" | "nowrap");
        let width = m.font_size * CHAR_WIDTH;
        for (index, ch) in doc.text(node).unwrap_or("").chars().enumerate() {
            let space = ch.is_whitespace();
            let newline = preserve && ch == '\n';
            pieces.push(Piece::Glyph {
                node,
                index,
                width: if newline { 0.0 } else { width },
                height: m.line_height,
                space,
                collapsible: space && !preserve,
                tab: preserve && ch == '\t',
                wrap,
            });
            if newline {
                pieces.push(Piece::Break);
            }
        }
    }

    /// Breaks inline content into lines. Returns the total line height.
    fn layout_inline(&mut self, items: &[NodeId], parent: NodeId, x: f32, y: f32, width: f32) -> f32 {
        let mut pieces = Vec::new();
        for &item in items {
            self.collect(item, width, (x, y), &mut pieces);
        }
        let text_indent = self.specified(parent, "text-indent", Some(width)).unwrap_or(0.0);

        let mut lines = vec![Line::default()];
        let mut placed = vec![Placed::default(); pieces.len()];
        let mut pen = text_indent;
        let mut after_space = true;
        let mut start = 0;
        while start < pieces.len() {
            let end = segment_end(&pieces, start);
            let needed = segment_width(&pieces[start..end], after_space);
            let wraps = pieces[start..end].iter().any(|p| match p {
                Piece::Glyph { wrap, .. } => *wrap,
                Piece::Atom { .. } => true,
                _ => false,
            });
            if wraps && lines.last().is_some_and(|l| l.has_content) && pen + needed > width {
                lines.push(Line::default());
                pen = 0.0;
                after_space = true;
            }
            for (offset, piece) in pieces[start..end].iter().enumerate() {
                let line = lines.len() - 1;
                let advance = match *piece {
                    Piece::Glyph { width: w, space, collapsible, tab, height, .. } => {
                        let advance = if collapsible && after_space {
                            0.0
                        } else if tab {
                            let stop = w * TAB_STOP;
                            stop - pen.rem_euclid(stop)
                        } else {
                            w
                        };
                        after_space = space;
                        if let Some(l) = lines.last_mut() {
                            l.height = l.height.max(height);
                            if !collapsible {
                                l.has_content = true;
                            }
                            if !space {
                                l.right = pen + advance;
                            }
                        }
                        advance
                    }
                    Piece::Atom { width: w, height, margin, .. } => {
                        after_space = false;
                        let outer = w + margin.left + margin.right;
                        if let Some(l) = lines.last_mut() {
                            l.height = l.height.max(height + margin.top + margin.bottom);
                            l.has_content = true;
                            l.right = pen + outer;
                        }
                        outer
                    }
                    Piece::Break | Piece::Open(_) | Piece::Close(_) => 0.0,
                };
                placed[start + offset] = Placed { x: pen, width: advance, line };
                pen += advance;
                if matches!(piece, Piece::Break) {
                    if let Some(l) = lines.last_mut() {
                        l.has_content = true;
                        l.height = l.height.max(self.metrics(parent).line_height);
                    }
                    lines.push(Line::default());
                    pen = 0.0;
                    after_space = true;
                }
            }
            start = end;
        }

        let align = match self.prop(parent, "text-align") {
            "center" => 0.5,
            "right" | "end" => 1.0,
            _ => 0.0,
        };
        let mut tops = Vec::with_capacity(lines.len());
        let mut offsets = Vec::with_capacity(lines.len());
        let mut line_ids = Vec::with_capacity(lines.len());
        let mut top = y;
        for line in &mut lines {
            if !line.has_content {
                line.height = 0.0;
            }
            tops.push(top);
            offsets.push(((width - line.right) * align).max(0.0));
            line_ids.push(self.next_line);
            self.next_line += 1;
            top += line.height;
        }

        let mut open: Vec<(NodeId, usize)> = Vec::new();
        for (i, piece) in pieces.iter().enumerate() {
            let p = placed[i];
            let left = x + p.x + offsets[p.line];
            let line_top = tops[p.line];
            match *piece {
                Piece::Glyph { node, index, height, .. } => {
                    let glyphs = self.tree.glyphs.entry(node).or_default();
                    if glyphs.len() <= index {
                        glyphs.resize(index + 1, Glyph { rect: Rect::default(), line: 0 });
                    }
                    glyphs[index] = Glyph {
                        rect: Rect::new(left, line_top, p.width, height),
                        line: line_ids[p.line],
                    };
                }
                Piece::Atom { node, content_width, margin, .. } => {
                    let m = self.metrics(node);
                    let fixed = self
                        .intrinsic_size(node, &m)
                        .map(|(_, h)| self.content_height(node, &m).unwrap_or(h));
                    self.layout_box(node, left + margin.left, line_top + margin.top, content_width, fixed);
                }
                Piece::Open(node) => open.push((node, i)),
                Piece::Close(node) => {
                    if let Some(pos) = open.iter().rposition(|(n, _)| *n == node) {
                        let (_, from) = open.remove(pos);
                        let fragments = self.fragments(&pieces, &placed, from, i, x, &tops, &offsets);
                        let fragments = if fragments.is_empty() {
                            let first = placed[from];
                            let font = self.metrics(node).line_height;
                            vec![Rect::new(x + first.x + offsets[first.line], tops[first.line], 0.0, font)]
                        } else {
                            fragments
                        };
                        self.tree.boxes.insert(node, fragments);
                    }
                }
                Piece::Break => {}
            }
        }
        top - y
    }

    /// One rectangle per line for the content between `from` and `to`.
    #[allow(clippy::too_many_arguments)]
    fn fragments(
        &self,
        pieces: &[Piece],
        placed: &[Placed],
        from: usize,
        to: usize,
        x: f32,
        tops: &[f32],
        offsets: &[f32],
    ) -> Vec<Rect> {
        let mut per_line: Vec<(usize, Rect)> = Vec::new();
        for i in from + 1..to {
            let p = placed[i];
            let height = match pieces[i] {
                Piece::Glyph { height, .. } => height,
                Piece::Atom { height, margin, .. } => height + margin.top + margin.bottom,
                _ => continue,
            };
            if p.width == 0.0 {
                continue;
            }
            let rect = Rect::new(x + p.x + offsets[p.line], tops[p.line], p.width, height);
            match per_line.iter_mut().find(|(line, _)| *line == p.line) {
                Some((_, acc)) => *acc = acc.union(&rect),
                None => per_line.push((p.line, rect)),
            }
        }
        per_line.into_iter().map(|(_, r)| r).collect()
    }
}

/// A segment runs up to and including the next break opportunity.
fn segment_end(pieces: &[Piece], start: usize) -> usize {
    let mut i = start;
    while i < pieces.len() {
        match pieces[i] {
            Piece::Glyph { space: true, wrap: true, .. } => {
                i += 1;
                while let Some(Piece::Glyph { space: true, .. } | Piece::Close(_)) = pieces.get(i) {
                    i += 1;
                }
                return i;
            }
            Piece::Atom { .. } | Piece::Break => return i + 1,
            _ => i += 1,
        }
    }
    i
}

/// Width a segment needs on the current line, ignoring trailing spaces.
fn segment_width(segment: &[Piece], mut after_space: bool) -> f32 {
    let mut width = 0.0;
    let mut trailing = 0.0;
    for piece in segment {
        match *piece {
            Piece::Glyph { width: w, space, collapsible, .. } => {
                let advance = if collapsible && after_space { 0.0 } else { w };
                if space {
                    trailing += advance;
                } else {
                    width += trailing + advance;
                    trailing = 0.0;
                }
                after_space = space;
            }
            Piece::Atom { width: w, margin, .. } => {
                width += trailing + w + margin.left + margin.right;
                trailing = 0.0;
                after_space = false;
            }
            _ => {}
        }
    }
    width
}
