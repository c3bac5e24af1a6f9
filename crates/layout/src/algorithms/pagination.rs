//! Splitting a document subtree into fixed-size pages.
//!
//! The subtree is deep-cloned into an off-screen container next to the
//! original, where the host lays it out at page width. The clone is then
//! walked in document order; whenever content falls past the page budget,
//! everything before the break point is extracted into a new page element
//! and the walk continues on the remainder, which now starts at the top of
//! the next page. Nothing here measures text or boxes itself: every position
//! comes from the host, re-queried after each mutation.

use crate::PaginationError;
use drawdom_dom::{Document, NodeId, SelectorList};
use drawdom_traits::{LayoutHost, TextRange};
use drawdom_types::{Edges, Rect};

/// Tag of the off-screen working container.
pub const DOCUMENT_TAG: &str = "drawdom-pdf-document";
/// Tag of a page element.
pub const PAGE_TAG: &str = "drawdom-pdf-page";
/// Attribute recording a list item's original position in its `<ol>`.
pub const SPLIT_INDEX_ATTR: &str = "drawdom-split-index";

/// Elements that move to the next page whole instead of being split.
const ATOMIC_TAGS: &[&str] = &[
    "img", "tr", "iframe", "svg", "object", "canvas", "input", "textarea", "select", "video",
    "h1", "h2", "h3", "h4", "h5", "h6",
];

#[derive(Debug, Clone, Default)]
pub struct PaginationConfig {
    /// Elements that always start a new page.
    pub force_break: Option<SelectorList>,
    /// Content width of a page (paper width minus horizontal margins).
    pub page_width: Option<f32>,
    /// Content height of a page; without it only forced breaks apply.
    pub page_height: Option<f32>,
    pub margin: Edges,
    pub page_class: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationState {
    Initial,
    Splitting,
    /// The given number of pages exist.
    PageAssembled(usize),
    Finalized,
    Canceled,
}

/// Where a box sits relative to the remaining page budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fall {
    Fits,
    /// Starts below the budget.
    StartsPast,
    /// Starts within the budget but ends below it.
    EndsPast,
    /// Taller than a whole page.
    Oversized,
}

impl Fall {
    /// Classifies `rect` against `available` pixels measured from `origin_top`.
    pub fn classify(rect: &Rect, origin_top: f32, available: f32) -> Fall {
        if rect.width == 0.0 || rect.height == 0.0 {
            Fall::Fits
        } else if rect.height > available {
            Fall::Oversized
        } else if rect.top() - origin_top > available {
            Fall::StartsPast
        } else if rect.bottom() - origin_top > available {
            Fall::EndsPast
        } else {
            Fall::Fits
        }
    }
}

/// The off-screen clone, ready to be split.
#[derive(Debug)]
pub struct PreparedDocument {
    container: NodeId,
    copy: NodeId,
    config: PaginationConfig,
    state: PaginationState,
}

/// Clones `target` into a working container inserted right before it.
///
/// Table footers are moved to the end of their table and ordered-list items
/// are tagged with their position, so both survive splitting.
pub fn prepare(
    doc: &mut Document,
    target: NodeId,
    config: PaginationConfig,
) -> Result<PreparedDocument, PaginationError> {
    let parent = doc.parent(target).ok_or(PaginationError::TargetDetached)?;
    let copy = doc.deep_clone(target);

    for tfoot in doc.elements_by_tag(copy, "tfoot") {
        if let Some(table) = doc.parent(tfoot) {
            doc.append_child(table, tfoot);
        }
    }
    let mut lists = doc.elements_by_tag(copy, "ol");
    if doc.is_tag(copy, "ol") {
        lists.insert(0, copy);
    }
    for ol in lists {
        for (index, item) in doc.element_children(ol).into_iter().enumerate() {
            doc.set_attr(item, SPLIT_INDEX_ATTR, &index.to_string());
        }
    }

    let container = doc.create_element(DOCUMENT_TAG);
    let mut css = String::from(
        "display: block; position: absolute; box-sizing: content-box; left: -10000px; top: -10000px;",
    );
    if let Some(width) = config.page_width {
        css.push_str(&format!(
            " width: {}px; padding-left: {}px; padding-right: {}px;",
            width, config.margin.left, config.margin.right
        ));
        if let Some(style) = doc.inline_style_mut(copy) {
            style.set("overflow", "hidden", false);
        }
    }
    doc.set_attr(container, "style", &css);
    doc.append_child(container, copy);
    doc.insert_before(parent, container, Some(target));
    log::debug!("pagination prepared: container {:?}", container);

    Ok(PreparedDocument {
        container,
        copy,
        config,
        state: PaginationState::Initial,
    })
}

impl PreparedDocument {
    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn state(&self) -> PaginationState {
        self.state
    }

    /// Removes the working container without splitting.
    pub fn discard(mut self, doc: &mut Document) -> PaginationState {
        doc.detach(self.container);
        self.state = PaginationState::Canceled;
        self.state
    }

    /// Breaks the clone into pages. The remainder becomes the last page.
    pub fn split(mut self, doc: &mut Document, host: &dyn LayoutHost) -> Result<PageSet, PaginationError> {
        if self.state != PaginationState::Initial {
            return Err(PaginationError::InvalidTransition {
                from: self.state,
                to: PaginationState::Splitting,
            });
        }
        self.state = PaginationState::Splitting;
        let mut splitter = Splitter {
            host,
            container: self.container,
            copy: self.copy,
            config: &self.config,
            adjust: 0.0,
            pages: Vec::new(),
        };
        if splitter.config.force_break.is_some() || splitter.config.page_height.is_some() {
            splitter.split_element(doc, self.copy);
        }
        let last = splitter.make_page(doc);
        doc.insert_before(self.container, last, Some(self.copy));
        doc.append_child(last, self.copy);

        let pages = splitter.pages;
        log::info!("pagination produced {} page(s)", pages.len());
        Ok(PageSet {
            container: self.container,
            state: PaginationState::PageAssembled(pages.len()),
            pages,
            config: self.config,
        })
    }
}

/// The page elements, in order, inside the working container.
#[derive(Debug)]
pub struct PageSet {
    container: NodeId,
    pages: Vec<NodeId>,
    config: PaginationConfig,
    state: PaginationState,
}

impl PageSet {
    pub fn pages(&self) -> &[NodeId] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    pub fn state(&self) -> PaginationState {
        self.state
    }

    fn close(&mut self, doc: &mut Document, to: PaginationState) -> Result<(), PaginationError> {
        match self.state {
            PaginationState::PageAssembled(_) => {
                doc.detach(self.container);
                self.state = to;
                Ok(())
            }
            from => Err(PaginationError::InvalidTransition { from, to }),
        }
    }

    /// Detaches the working container once every page has been rendered.
    pub fn finalize(&mut self, doc: &mut Document) -> Result<(), PaginationError> {
        self.close(doc, PaginationState::Finalized)
    }

    /// Detaches the working container, abandoning the remaining pages.
    pub fn cancel(&mut self, doc: &mut Document) -> Result<(), PaginationError> {
        self.close(doc, PaginationState::Canceled)
    }
}

struct Splitter<'a> {
    host: &'a dyn LayoutHost,
    container: NodeId,
    copy: NodeId,
    config: &'a PaginationConfig,
    /// Bottom padding and border of the ancestors being split.
    adjust: f32,
    pages: Vec<NodeId>,
}

impl Splitter<'_> {
    fn falls(&self, doc: &Document, rect: &Rect) -> Fall {
        let Some(page_height) = self.config.page_height else {
            return Fall::Fits;
        };
        let top = self.host.bounding_rect(doc, self.copy).top();
        Fall::classify(rect, top, page_height - self.adjust)
    }

    fn is_forced_break(&self, doc: &Document, node: NodeId) -> bool {
        self.config
            .force_break
            .as_ref()
            .is_some_and(|selector| doc.matches(node, selector))
    }

    fn is_atomic(&self, doc: &Document, node: NodeId) -> bool {
        let tag = doc.tag_name(node).unwrap_or("").to_ascii_lowercase();
        ATOMIC_TAGS.contains(&tag.as_str())
            || doc.attr(node, "data-role").is_some_and(|r| r.eq_ignore_ascii_case("chart"))
    }

    fn split_element(&mut self, doc: &mut Document, element: NodeId) {
        let style = self.host.computed_style(doc, element, None);
        let saved = self.adjust;
        self.adjust += style.px("padding-bottom") + style.px("border-bottom-width");

        let mut is_first = true;
        let mut cursor = doc.first_child(element);
        while let Some(node) = cursor {
            let mut resume = node;
            if doc.is_element(node) {
                is_first = false;
                self.visit_element(doc, node);
            } else if doc.is_text(node) && self.config.page_height.is_some() {
                resume = self.split_text(doc, node, is_first);
                is_first = false;
            }
            cursor = doc.next_sibling(resume);
        }
        self.adjust = saved;
    }

    fn visit_element(&mut self, doc: &mut Document, node: NodeId) {
        if self.is_forced_break(doc, node) {
            log::debug!("forced page break before {:?}", node);
            self.break_at(doc, node, true);
            return;
        }
        if self.config.page_height.is_none() {
            self.split_element(doc, node);
            return;
        }
        let position = self.host.computed_style(doc, node, None).get("position").to_string();
        if position != "static" && position != "relative" {
            return;
        }
        let rect = self.host.bounding_rect(doc, node);
        match self.falls(doc, &rect) {
            Fall::StartsPast => {
                self.break_at(doc, node, false);
            }
            Fall::EndsPast | Fall::Oversized if self.is_atomic(doc, node) => {
                self.break_at(doc, node, false);
            }
            _ => self.split_element(doc, node),
        }
    }

    /// Splits a text node at the last character that fits. Returns the node
    /// holding the remaining text.
    fn split_text(&mut self, doc: &mut Document, mut node: NodeId, mut is_first: bool) -> NodeId {
        let mut split_at_start = false;
        loop {
            if doc.text(node).is_none_or(|t| t.trim().is_empty()) {
                return node;
            }
            let len = doc.char_len(node);
            let whole = self.host.range_bounding_rect(doc, TextRange::new(node, 0, len));
            match self.falls(doc, &whole) {
                Fall::Fits => return node,
                Fall::StartsPast => {
                    let broke = match doc.parent(node) {
                        Some(parent) if is_first => self.break_at(doc, parent, false),
                        _ => self.break_at(doc, node, false),
                    };
                    if !broke {
                        return node;
                    }
                }
                Fall::EndsPast | Fall::Oversized => {
                    let pos = self.find_eop(doc, node, len);
                    let head_blank = doc.text_slice(node, 0, pos).trim().is_empty();
                    if head_blank && is_first {
                        let Some(parent) = doc.parent(node) else {
                            return node;
                        };
                        if !self.break_at(doc, parent, false) {
                            return node;
                        }
                    } else {
                        if pos == 0 {
                            if split_at_start {
                                return node;
                            }
                            split_at_start = true;
                        } else {
                            split_at_start = false;
                        }
                        let Some(tail) = doc.split_text(node, pos) else {
                            return node;
                        };
                        let Some(extracted) = doc.extract_before(self.copy, tail) else {
                            return tail;
                        };
                        log::debug!("page break inside text at offset {}", pos);
                        let page = self.make_page(doc);
                        doc.append_child(page, extracted);
                        doc.insert_before(self.container, page, Some(self.copy));
                        node = tail;
                    }
                }
            }
            is_first = false;
        }
    }

    /// Largest prefix length whose box still fits the page, by bisection.
    fn find_eop(&self, doc: &Document, node: NodeId, len: usize) -> usize {
        let (mut min, mut pos, mut max) = (0, len / 2, len);
        while min != pos && pos != max {
            let rect = self.host.range_bounding_rect(doc, TextRange::new(node, 0, pos));
            if self.falls(doc, &rect) != Fall::Fits {
                max = pos;
                pos = (min + pos) / 2;
            } else {
                min = pos;
                pos = (pos + max) / 2;
            }
        }
        pos
    }

    /// Moves everything before `node` into a new page. A node that is the
    /// first content of its parent hands the break to the parent instead,
    /// so no empty block is left behind. Returns `false` when the break was
    /// skipped because the page would be empty.
    fn break_at(&mut self, doc: &mut Document, node: NodeId, forced: bool) -> bool {
        let mut target = node;
        while doc.is_element(target) && target != self.copy && first_in_parent(doc, target) {
            match doc.parent(target) {
                Some(parent) => target = parent,
                None => break,
            }
        }

        let table = std::iter::once(target)
            .chain(doc.ancestors(target))
            .take_while(|&n| n != self.container)
            .find(|&n| doc.is_tag(n, "table"));
        let colgroups = table
            .map(|t| doc.elements_by_tag(t, "colgroup"))
            .unwrap_or_default();

        let extracted = doc.extract_before(self.copy, target);
        if extracted.is_none() && !forced {
            log::trace!("skipping break before {:?}: nothing precedes it", target);
            return false;
        }
        let page = self.make_page(doc);
        if let Some(content) = extracted {
            doc.append_child(page, content);
        }
        doc.insert_before(self.container, page, Some(self.copy));
        log::debug!("page {} ends before {:?}", self.pages.len(), target);

        if let Some(table) = table {
            for colgroup in colgroups.into_iter().rev() {
                if !doc.contains(table, colgroup) {
                    let copy = doc.deep_clone(colgroup);
                    doc.prepend_child(table, copy);
                }
            }
        }
        true
    }

    fn make_page(&mut self, doc: &mut Document) -> NodeId {
        let config = self.config;
        let page = doc.create_element(PAGE_TAG);
        let size = |v: Option<f32>| v.map_or_else(|| "auto".to_string(), |v| format!("{}px", v));
        let m = &config.margin;
        let overflow = if config.page_width.is_some() || config.page_height.is_some() {
            "hidden"
        } else {
            "visible"
        };
        let css = format!(
            "display: block; box-sizing: content-box; width: {}; padding: {}px {}px {}px {}px; \
             position: relative; height: {}; overflow: {}; clear: both;",
            size(config.page_width),
            m.top,
            m.right,
            m.bottom,
            m.left,
            size(config.page_height),
            overflow,
        );
        doc.set_attr(page, "style", &css);
        if let Some(class) = &config.page_class {
            doc.set_attr(page, "class", class);
        }
        self.pages.push(page);
        page
    }
}

/// `node` is preceded in its parent only by comments and blank text.
fn first_in_parent(doc: &Document, node: NodeId) -> bool {
    let Some(parent) = doc.parent(node) else {
        return false;
    };
    doc.children(parent)
        .iter()
        .take_while(|&&c| c != node)
        .all(|&c| match doc.text(c) {
            Some(t) => t.trim().is_empty(),
            None => !doc.is_element(c),
        })
}
