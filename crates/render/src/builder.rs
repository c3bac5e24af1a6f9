//! The DOM walker.
//!
//! Rendering an element happens in three nested steps, each undoing its
//! own document changes before returning:
//!
//! 1. [`TreeBuilder::render_element`] applies counters, decides whether the
//!    element is drawn at all, places its group in the stacking order and
//!    handles CSS transforms.
//! 2. `render_with_pseudo` materializes `::before`/`::after`.
//! 3. `render_box` draws the element's boxes, marker and clips, then its
//!    contents, recursing into children in paint order.

use crate::arena::{GroupId, SceneArena};
use crate::context::{ClipBox, Frame, FrameStack, StackingAnchor, TableInfo, parse_counter_list};
use crate::forms::{self, Toggle, toggle_paths};
use crate::markers;
use crate::painting::{FragmentSides, paint_background, paint_borders};
use crate::pseudo;
use crate::stacking::{Layer, compare_z, creates_stacking_context, stable_sort_by, z_index};
use drawdom_dom::{Document, NodeId, SelectorList};
use drawdom_layout::geom::{border_widths, content_box};
use drawdom_layout::{
    CornerRadii, HostProbe, RoundBoxKind, TextLayoutParams, decoration_lines, element_round_box, inner_box,
    layout_text, round_box,
};
use drawdom_resource::ImageCache;
use drawdom_scene::{Group, Image, Link, Path, Text};
use drawdom_style::parsers::{parse_clip_rect, parse_transform};
use drawdom_style::{BackgroundParser, ComputedStyle, parse_color, set_property_mirrored};
use drawdom_traits::{LayoutHost, PseudoElement};
use drawdom_types::{Color, Matrix, Rect};
use itertools::Itertools;
use std::mem;

/// Class set on the exported element while it renders, so documents can
/// style their printed form.
pub const EXPORT_CLASS: &str = "drawdom-pdf-export";

const SKIPPED_TAGS: [&str; 8] = ["style", "script", "link", "meta", "iframe", "svg", "col", "colgroup"];

pub struct TreeBuilder<'a> {
    doc: &'a mut Document,
    host: &'a dyn LayoutHost,
    images: &'a ImageCache,
    backgrounds: &'a BackgroundParser,
    avoid_links: Option<&'a SelectorList>,
    arena: SceneArena,
    frames: FrameStack,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(
        doc: &'a mut Document,
        host: &'a dyn LayoutHost,
        images: &'a ImageCache,
        backgrounds: &'a BackgroundParser,
    ) -> Self {
        let root = doc.root();
        let arena = SceneArena::new(Group::new());
        let anchor = StackingAnchor {
            node: root,
            group: arena.root(),
        };
        Self {
            doc,
            host,
            images,
            backgrounds,
            avoid_links: None,
            arena,
            frames: FrameStack::new(Frame::new(root, anchor)),
        }
    }

    /// Anchors matching `selector` get no link annotation.
    pub fn avoid_links(mut self, selector: Option<&'a SelectorList>) -> Self {
        self.avoid_links = selector;
        self
    }

    pub fn document(&self) -> &Document {
        &*self.doc
    }

    /// Renders `element` into a group translated so that the element's
    /// top-left corner is the origin. Counters defined at the top level
    /// carry over from one call to the next, so consecutive pages keep
    /// numbering.
    pub fn render_page(&mut self, element: NodeId) -> Group {
        let origin = self.host.bounding_rect(self.document(), element);
        self.arena = SceneArena::new(Group {
            transform: Some(Matrix::translate(-origin.x, -origin.y)),
            ..Group::default()
        });
        let root = self.arena.root();
        self.frames.reset(Frame::new(element, StackingAnchor { node: element, group: root }));

        self.doc.add_class(element, EXPORT_CLASS);
        self.render_element(element, root);
        self.doc.remove_class(element, EXPORT_CLASS);

        mem::replace(&mut self.arena, SceneArena::new(Group::new())).into_group()
    }

    fn style(&self, node: NodeId) -> ComputedStyle {
        self.host.computed_style(self.document(), node, None)
    }

    fn with_frame<R>(&mut self, frame: Frame, f: impl FnOnce(&mut Self) -> R) -> R {
        self.frames.push(frame);
        let out = f(self);
        self.frames.pop();
        out
    }

    /// Runs `f`, then puts the element's inline style back as it was.
    fn with_saved_style<R>(&mut self, node: NodeId, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.doc.inline_style(node).cloned().unwrap_or_default();
        let out = f(self);
        self.doc.set_inline_style(node, saved);
        out
    }

    fn apply_counters(&mut self, style: &ComputedStyle) {
        for (name, value) in parse_counter_list(style.get("counter-reset"), 0.0) {
            self.frames.reset_counter(&name, value);
        }
        for (name, by) in parse_counter_list(style.get("counter-increment"), 1.0) {
            self.frames.increment_counter(&name, by);
        }
    }

    pub fn render_element(&mut self, node: NodeId, container: GroupId) {
        let style = self.style(node);
        self.apply_counters(&style);

        let Some(tag) = self.document().tag_name(node).map(str::to_ascii_lowercase) else {
            return;
        };
        if SKIPPED_TAGS.contains(&tag.as_str()) {
            return;
        }
        if self.frames.current().clip == ClipBox::Empty {
            log::trace!("{tag} {node:?} is clipped away");
            return;
        }
        let opacity = style.number("opacity").unwrap_or(1.0);
        if opacity == 0.0 || style.get("visibility") == "hidden" || style.get("display") == "none" {
            return;
        }

        let transform = parse_transform(style.get("transform"), style.get("transform-origin"));
        let key = match z_index(&style) {
            None if transform.is_some() || opacity < 1.0 => Some(0.0),
            z => z,
        };
        let group = self.group_in_stacking_context(container, key);
        if opacity < 1.0 {
            self.arena.group_mut(group).opacity *= opacity;
        }

        let frame = self.child_frame(node, &tag, &style, group);
        self.with_frame(frame, |b| match transform {
            None => b.render_with_pseudo(node, group),
            Some(transform) => b.with_saved_style(node, |b| {
                let vendor = b.host.vendor();
                if let Some(css) = b.doc.inline_style_mut(node) {
                    set_property_mirrored(css, vendor, "transform", "none", true);
                    set_property_mirrored(css, vendor, "transition", "none", true);
                    if style.get("position") == "static" {
                        set_property_mirrored(css, vendor, "position", "relative", true);
                    }
                }
                let bbox = b.host.bounding_rect(b.document(), node);
                let (x, y) = (bbox.x + transform.origin[0], bbox.y + transform.origin[1]);
                let m = Matrix::translate(-x, -y)
                    .then(&Matrix::from_array(transform.matrix))
                    .then(&Matrix::translate(x, y));
                b.arena.group_mut(group).transform = Some(m);
                let frame = b.frames.current_mut();
                frame.matrix = frame.matrix.multiply(&m);
                b.render_with_pseudo(node, group);
            }),
        });
    }

    /// Creates the element's group. Elements with a `z-index` go into the
    /// group of the enclosing stacking context, clipped to what their
    /// container would have shown; the rest stay in `container`.
    fn group_in_stacking_context(&mut self, container: GroupId, z: Option<f32>) -> GroupId {
        let frame = self.frames.current();
        let (parent, key) = match z {
            Some(z) => (frame.stacking.group, z),
            None => (container, 0.0),
        };
        let mut group = Group::new();
        if parent != container
            && let Some(clip) = frame.clip.rect()
            && let Some(inverse) = frame.matrix.invert()
        {
            group.clip = Some(Path::from_rect(clip.transform(&inverse)));
        }
        self.arena.insert_ordered(parent, group, key)
    }

    fn child_frame(&self, node: NodeId, tag: &str, style: &ComputedStyle, group: GroupId) -> Frame {
        let parent = self.frames.current();
        let mut frame = parent.child(node);
        frame.decorations = parent
            .decorations
            .inherit(style.get("text-decoration"), parse_color(style.get("color")));
        if tag == "table" {
            frame.table = Some(TableInfo {
                node,
                style: style.clone(),
            });
        }
        if creates_stacking_context(style) {
            frame.stacking = StackingAnchor { node, group };
        }
        frame
    }

    fn render_with_pseudo(&mut self, node: NodeId, group: GroupId) {
        if self.document().is_tag(node, crate::STAND_IN_TAG) {
            self.render_box(node, group);
            return;
        }
        let stand_ins: Vec<NodeId> = [PseudoElement::Before, PseudoElement::After]
            .into_iter()
            .filter_map(|kind| pseudo::materialize(self.doc, self.host, &self.frames, node, kind))
            .collect();
        self.render_box(node, group);
        for stand_in in stand_ins {
            self.doc.detach(stand_in);
        }
    }

    /// Adds a group clipped by `clip` and narrows the running clip box.
    fn clipped_group(&mut self, parent: GroupId, clip: Path) -> GroupId {
        let frame = self.frames.current_mut();
        frame.clip = frame.clip.intersect(clip.bbox(Some(&frame.matrix)));
        self.arena.append_group(
            parent,
            Group {
                clip: Some(clip),
                ..Group::default()
            },
        )
    }

    fn render_box(&mut self, node: NodeId, group: GroupId) {
        let style = self.style(node);
        let tag = self.document().tag_name(node).unwrap_or_default().to_ascii_lowercase();
        let bbox = self.host.bounding_rect(self.document(), node);
        let inner = inner_box(bbox, &border_widths(&style));
        let mut group = group;

        if let Some(clip) = clip_rect(&style, &inner) {
            group = self.clipped_group(group, Path::from_rect(clip));
        }

        let display = style.get("display");
        let boxes = self.fragment_boxes(node, &tag, display, bbox);
        let rtl = style.get("direction") == "rtl";
        let count = boxes.len();
        for (i, rect) in boxes.into_iter().enumerate() {
            self.draw_box(node, &style, rect, FragmentSides::new(i == 0, i + 1 == count, rtl), group);
        }
        if count > 0 && display == "list-item" {
            self.render_marker(node, &style, group);
        }

        if forms::is_form_field(&tag) || clips_overflow(&style) {
            group = self.clipped_group(group, element_round_box(&style, &inner, RoundBoxKind::Padding));
        }

        if !self.render_widget(node, bbox, group) {
            self.render_contents(node, &tag, &style, group);
        }
    }

    /// The rectangles an element's background and borders are drawn on.
    fn fragment_boxes(&self, node: NodeId, tag: &str, display: &str, bbox: Rect) -> Vec<Rect> {
        let doc = self.document();
        let boxes = if display == "table-row" {
            // Rows are painted cell by cell so that spanning cells of
            // earlier rows are not painted over.
            doc.element_children(node)
                .into_iter()
                .map(|cell| self.host.bounding_rect(doc, cell))
                .collect()
        } else {
            let rects = self.host.client_rects(doc, node);
            if rects.len() == 1 { vec![bbox] } else { rects }
        };
        if tag == "td" {
            self.shift_collapsed_cell(boxes)
        } else {
            boxes
        }
    }

    /// Cells of a collapsed-border table can be reported overlapping the
    /// table's own border; move them inside it.
    fn shift_collapsed_cell(&self, boxes: Vec<Rect>) -> Vec<Rect> {
        let Some(table) = &self.frames.current().table else {
            return boxes;
        };
        if table.style.get("border-collapse") != "collapse" {
            return boxes;
        }
        let borders = border_widths(&table.style);
        if borders.left == 0.0 && borders.top == 0.0 {
            return boxes;
        }
        let doc = self.document();
        let first_cell = doc
            .elements_by_tag(table.node, "tr")
            .first()
            .and_then(|&row| doc.element_children(row).first().copied());
        let Some(first_cell) = first_cell else {
            return boxes;
        };
        let table_box = self.host.bounding_rect(doc, table.node);
        let cell_box = self.host.bounding_rect(doc, first_cell);
        if cell_box.y == table_box.y || cell_box.x == table_box.x {
            boxes
                .into_iter()
                .map(|b| b.translate(borders.left, borders.top))
                .collect()
        } else {
            boxes
        }
    }

    fn draw_box(&mut self, node: NodeId, style: &ComputedStyle, rect: Rect, sides: FragmentSides, group: GroupId) {
        if rect.width == 0.0 || rect.height == 0.0 {
            return;
        }
        let background = Group {
            clip: Some(round_box(&rect, &CornerRadii::from_style(style))),
            link: self.link_for(node, rect),
            ..Group::default()
        };
        let background = self.arena.append_group(group, background);
        let layers = self.backgrounds.parse(style.get("background-image"));
        for element in paint_background(style, rect, &layers, self.images) {
            self.arena.append(background, element);
        }
        for element in paint_borders(style, rect, sides) {
            self.arena.append(group, element);
        }
    }

    fn link_for(&self, node: NodeId, rect: Rect) -> Option<Link> {
        let doc = self.document();
        if !doc.is_tag(node, "a") {
            return None;
        }
        let href = doc.attr(node, "href")?;
        if href.is_empty() || href == "#" {
            return None;
        }
        if self.avoid_links.is_some_and(|selector| doc.matches(node, selector)) {
            return None;
        }
        Some(Link {
            url: href.to_string(),
            rect,
        })
    }

    fn render_marker(&mut self, item: NodeId, style: &ComputedStyle, group: GroupId) {
        self.with_saved_style(item, |b| {
            if let Some(css) = b.doc.inline_style_mut(item) {
                css.set("position", "relative", false);
            }
            if let Some(marker) = markers::insert_marker(b.doc, item, style) {
                b.render_element(marker, group);
                b.doc.detach(marker);
            }
        });
    }

    fn render_widget(&mut self, node: NodeId, bbox: Rect, group: GroupId) -> bool {
        if !self.document().attr(node, "data-role").is_some_and(|role| !role.is_empty()) {
            return false;
        }
        let Some(visual) = self.host.export_visual(self.document(), node) else {
            return false;
        };
        let mut wrap = Group {
            transform: Some(Matrix::translate(bbox.x, bbox.y)),
            ..Group::default()
        };
        wrap.append(visual);
        self.arena.append(group, wrap);
        true
    }

    fn render_contents(&mut self, node: NodeId, tag: &str, style: &ComputedStyle, group: GroupId) {
        // Clips and transforms may have replaced the group the stacking
        // context was opened with.
        let frame = self.frames.current_mut();
        if frame.stacking.node == node {
            frame.stacking.group = group;
        }

        match tag {
            "img" => {
                let Some(src) = self.document().attr(node, "src").map(str::to_string) else {
                    return;
                };
                if self.images.is_failed(&src) {
                    log::debug!("skipping image {src} that failed to load");
                    return;
                }
                self.render_image(node, style, src, group);
            }
            "canvas" => match self.host.canvas_data_url(self.document(), node) {
                Ok(url) => self.render_image(node, style, url, group),
                Err(err) => log::debug!("skipping canvas {node:?}: {err}"),
            },
            "input" | "textarea" | "select" => self.render_form_field(node, style, group),
            _ => self.render_children(node, group),
        }
    }

    fn render_image(&mut self, node: NodeId, style: &ComputedStyle, src: String, group: GroupId) {
        let rect = content_box(self.host.bounding_rect(self.document(), node), style);
        let clip = element_round_box(style, &rect, RoundBoxKind::Content);
        self.arena.append(
            group,
            Image {
                src,
                rect,
                clip: Some(clip),
            },
        );
    }

    fn render_form_field(&mut self, node: NodeId, style: &ComputedStyle, group: GroupId) {
        if let Some(toggle) = Toggle::of(self.document(), node) {
            let color = parse_color(style.get("color")).unwrap_or(Color::BLACK);
            let rect = self.host.bounding_rect(self.document(), node);
            let checked = self.document().has_attr(node, "checked");
            for path in toggle_paths(toggle, rect, checked, color) {
                self.arena.append(group, path);
            }
            return;
        }
        if let Some(stand_in) = forms::insert_field_stand_in(self.doc, self.host, node) {
            self.render_children(stand_in, group);
            self.doc.detach(stand_in);
        }
    }

    /// Text first, in document order, then child elements: blocks, floats,
    /// inline elements and positioned elements, each pass sorted by
    /// `z-index`.
    fn render_children(&mut self, node: NodeId, group: GroupId) {
        let children = self.document().children(node).to_vec();
        let mut elements = Vec::new();
        for child in children {
            let doc = self.document();
            if doc.is_element(child) {
                elements.push(child);
            } else if doc.text(child).is_some_and(|t| t.chars().any(|c| !c.is_whitespace())) {
                self.render_text(node, child, group);
            }
        }

        let mut layers = elements
            .into_iter()
            .map(|child| (child, self.style(child)))
            .into_group_map_by(|(_, style)| Layer::of(style));
        for layer in Layer::PAINT_ORDER {
            let Some(mut members) = layers.remove(&layer) else {
                continue;
            };
            stable_sort_by(&mut members, |a, b| compare_z(&a.1, &b.1));
            for (child, _) in members {
                self.render_element(child, group);
            }
        }
    }

    fn render_text(&mut self, element: NodeId, node: NodeId, group: GroupId) {
        if self.frames.current().clip.is_empty() {
            return;
        }
        let style = self.style(element);
        // Hidden labels are often moved far off to the left.
        if style.number("text-indent").is_some_and(|indent| indent < -500.0) {
            return;
        }
        let font_size = style.px("font-size");
        if font_size == 0.0 {
            return;
        }

        let width = self.host.bounding_rect(self.document(), element).width;
        let params = TextLayoutParams::from_style(&style, width);
        let fragments = {
            let doc = self.document();
            let Some(text) = doc.text(node) else {
                return;
            };
            layout_text(text, node, &HostProbe::new(self.host, doc), &params)
        };

        let font = ["font-style", "font-variant", "font-weight", "font-size", "font-family"]
            .iter()
            .map(|prop| style.get(prop))
            .join(" ");
        let fill = parse_color(style.get("color")).unwrap_or(Color::BLACK);
        let decorations = self.frames.current().decorations.clone();
        for fragment in fragments {
            let lines = decoration_lines(&fragment.rect, font_size, &decorations);
            self.arena.append(
                group,
                Text {
                    content: fragment.text,
                    rect: fragment.rect,
                    font: font.clone(),
                    fill: fill.clone(),
                },
            );
            for line in lines {
                self.arena.append(group, line);
            }
        }
    }
}

/// The `clip: rect(...)` rectangle, with offsets relative to the padding
/// box and `auto` sides falling on its edges.
fn clip_rect(style: &ComputedStyle, inner: &Rect) -> Option<Rect> {
    let [top, right, bottom, left] = parse_clip_rect(style.get("clip"))?;
    Some(Rect::from_edges(
        left.map_or(inner.left(), |v| inner.left() + v),
        top.map_or(inner.top(), |v| inner.top() + v),
        right.map_or(inner.right(), |v| inner.left() + v),
        bottom.map_or(inner.bottom(), |v| inner.top() + v),
    ))
}

fn clips_overflow(style: &ComputedStyle) -> bool {
    ["overflow", "overflow-x", "overflow-y"].iter().any(|prop| {
        let value = style.get(prop);
        ["hidden", "auto", "scroll"].iter().any(|v| value.starts_with(v))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use drawdom_style::Vendor;

    fn style(pairs: &[(&str, &str)]) -> ComputedStyle {
        ComputedStyle::from_pairs(Vendor::Unknown, pairs.iter().copied())
    }

    #[test]
    fn clip_rect_offsets_from_the_padding_box() {
        let inner = Rect::new(10.0, 20.0, 100.0, 50.0);
        let clip = clip_rect(&style(&[("clip", "rect(5px, 60px, auto, auto)")]), &inner);
        assert_eq!(clip, Some(Rect::new(10.0, 25.0, 60.0, 45.0)));
        assert_eq!(clip_rect(&style(&[("clip", "auto")]), &inner), None);
    }

    #[test]
    fn overflow_values_that_clip() {
        assert!(clips_overflow(&style(&[("overflow", "hidden")])));
        assert!(clips_overflow(&style(&[("overflow", "visible"), ("overflow-y", "scroll")])));
        assert!(!clips_overflow(&style(&[("overflow", "visible")])));
        assert!(!clips_overflow(&style(&[])));
    }
}
