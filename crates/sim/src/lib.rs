//! A deterministic [`LayoutHost`] for tests and headless runs.
//!
//! [`SimHost`] resolves styles from user-agent defaults, author rules and
//! inline styles, and lays documents out with fixed-pitch metrics (see
//! [`flow`]). Layouts are cached per document revision, so every mutation
//! the exporter makes is visible to the next query.

pub mod cascade;
pub mod flow;
pub mod values;

use crate::cascade::StyleRule;
use crate::flow::{LayoutTree, layout};
use drawdom_dom::{Document, DomError, NodeId};
use drawdom_scene::Group;
use drawdom_style::{ComputedStyle, Vendor};
use drawdom_traits::{HostError, LayoutHost, PseudoElement, TextRange};
use drawdom_types::Rect;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

pub use crate::flow::{CHAR_WIDTH, LINE_HEIGHT};

pub const DEFAULT_VIEWPORT_WIDTH: f32 = 800.0;

struct CachedLayout {
    document: u64,
    revision: u64,
    tree: Arc<LayoutTree>,
}

pub struct SimHost {
    vendor: Vendor,
    viewport_width: f32,
    computed_styles: bool,
    rules: Vec<StyleRule>,
    canvases: HashMap<String, Result<String, HostError>>,
    widgets: HashMap<String, Group>,
    cache: Mutex<Option<CachedLayout>>,
}

impl Default for SimHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SimHost {
    pub fn new() -> Self {
        Self {
            vendor: Vendor::Unknown,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            computed_styles: true,
            rules: Vec::new(),
            canvases: HashMap::new(),
            widgets: HashMap::new(),
            cache: Mutex::new(None),
        }
    }

    pub fn with_vendor(mut self, vendor: Vendor) -> Self {
        self.vendor = vendor;
        self
    }

    pub fn with_viewport_width(mut self, width: f32) -> Self {
        self.viewport_width = width;
        self
    }

    /// Simulates an environment without computed styles.
    pub fn without_computed_style(mut self) -> Self {
        self.computed_styles = false;
        self
    }

    /// Adds an author rule, e.g. `rule("p::before", "content: 'x'")`.
    pub fn rule(mut self, selector: &str, css: &str) -> Result<Self, DomError> {
        self.rules.push(StyleRule::parse(selector, css)?);
        Ok(self)
    }

    /// Pixel contents reported for the canvas with this `id`.
    pub fn with_canvas(mut self, id: &str, data_url: &str) -> Self {
        self.canvases.insert(id.to_string(), Ok(data_url.to_string()));
        self
    }

    /// The canvas with this `id` refuses read-back.
    pub fn with_tainted_canvas(mut self, id: &str) -> Self {
        self.canvases.insert(id.to_string(), Err(HostError::TaintedCanvas));
        self
    }

    /// The visual exported for the widget element with this `id`.
    pub fn with_widget(mut self, id: &str, visual: Group) -> Self {
        self.widgets.insert(id.to_string(), visual);
        self
    }

    fn layout(&self, doc: &Document) -> Arc<LayoutTree> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = cache.as_ref()
            && cached.document == doc.id()
            && cached.revision == doc.revision()
        {
            return Arc::clone(&cached.tree);
        }
        log::trace!("laying out document {} at revision {}", doc.id(), doc.revision());
        let tree = Arc::new(layout(doc, &self.rules, self.vendor, self.viewport_width));
        *cache = Some(CachedLayout {
            document: doc.id(),
            revision: doc.revision(),
            tree: Arc::clone(&tree),
        });
        tree
    }

    fn element_style(&self, doc: &Document, tree: &LayoutTree, node: NodeId) -> ComputedStyle {
        let element = if doc.is_element(node) { Some(node) } else { doc.parent(node) };
        match element.and_then(|n| tree.styles.get(&n)) {
            Some(style) => style.clone(),
            None => cascade::resolve(self.vendor, None, std::iter::empty()),
        }
    }
}

impl LayoutHost for SimHost {
    fn vendor(&self) -> Vendor {
        self.vendor
    }

    fn supports_computed_style(&self) -> bool {
        self.computed_styles
    }

    fn computed_style(&self, doc: &Document, node: NodeId, pseudo: Option<PseudoElement>) -> ComputedStyle {
        let tree = self.layout(doc);
        let style = self.element_style(doc, &tree, node);
        let mut style = match pseudo {
            Some(pseudo) => cascade::pseudo_style(self.vendor, &self.rules, doc, node, &style, pseudo),
            None => style,
        };
        let rect = match pseudo {
            Some(_) => Rect::default(),
            None => self.bounding_rect(doc, node),
        };
        let origin = values::resolve_origin(
            style.get("transform-origin"),
            rect.width,
            rect.height,
            style.px("font-size"),
        );
        style.insert("transform-origin", origin);
        style
    }

    fn bounding_rect(&self, doc: &Document, node: NodeId) -> Rect {
        let rects = self.client_rects(doc, node);
        let mut iter = rects.iter();
        match iter.next() {
            Some(first) => iter.fold(*first, |acc, r| acc.union(r)),
            None => Rect::default(),
        }
    }

    fn client_rects(&self, doc: &Document, node: NodeId) -> Vec<Rect> {
        let tree = self.layout(doc);
        if doc.is_text(node) {
            return self.range_rects(doc, TextRange::new(node, 0, doc.char_len(node)));
        }
        tree.boxes.get(&node).cloned().unwrap_or_default()
    }

    fn range_rects(&self, doc: &Document, range: TextRange) -> Vec<Rect> {
        let tree = self.layout(doc);
        let Some(glyphs) = tree.glyphs.get(&range.node) else {
            return Vec::new();
        };
        let end = range.end.min(glyphs.len());
        if range.start >= end {
            let caret = match glyphs.get(range.start) {
                Some(g) => Rect::new(g.rect.x, g.rect.y, 0.0, g.rect.height),
                None => match glyphs.last() {
                    Some(g) => Rect::new(g.rect.right(), g.rect.y, 0.0, g.rect.height),
                    None => return Vec::new(),
                },
            };
            return vec![caret];
        }
        let selected = &glyphs[range.start..end];
        let solid: Vec<_> = selected.iter().filter(|g| g.rect.width > 0.0).collect();
        let chosen: Vec<_> = if solid.is_empty() { selected.iter().collect() } else { solid };
        let mut lines: Vec<(usize, Rect)> = Vec::new();
        for glyph in chosen {
            match lines.iter_mut().find(|(line, _)| *line == glyph.line) {
                Some((_, rect)) => *rect = rect.union(&glyph.rect),
                None => lines.push((glyph.line, glyph.rect)),
            }
        }
        lines.into_iter().map(|(_, r)| r).collect()
    }

    fn canvas_data_url(&self, doc: &Document, node: NodeId) -> Result<String, HostError> {
        doc.attr(node, "id")
            .and_then(|id| self.canvases.get(id))
            .cloned()
            .unwrap_or(Err(HostError::Unsupported("canvas read-back")))
    }

    fn export_visual(&self, doc: &Document, node: NodeId) -> Option<Group> {
        doc.attr(node, "id").and_then(|id| self.widgets.get(id)).cloned()
    }
}
