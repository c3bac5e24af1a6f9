#![allow(dead_code)]

use drawdom_dom::{Document, ElementSpec, NodeId, SelectorList};
use drawdom_render::TreeBuilder;
use drawdom_resource::{ImageCache, InMemoryResourceProvider};
use drawdom_scene::Group;
use drawdom_sim::SimHost;
use drawdom_style::BackgroundParser;
use std::sync::Arc;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn mount(doc: &mut Document, spec: ElementSpec) -> NodeId {
    let root = doc.root();
    doc.append_spec(root, &spec.into())
}

pub fn empty_cache() -> ImageCache {
    ImageCache::new(Arc::new(InMemoryResourceProvider::new()))
}

/// Renders `target` as a single page.
pub fn render(doc: &mut Document, host: &SimHost, target: NodeId) -> Group {
    render_with(doc, host, &empty_cache(), None, target)
}

pub fn render_with(
    doc: &mut Document,
    host: &SimHost,
    images: &ImageCache,
    avoid_links: Option<&SelectorList>,
    target: NodeId,
) -> Group {
    let backgrounds = BackgroundParser::new();
    TreeBuilder::new(doc, host, images, &backgrounds)
        .avoid_links(avoid_links)
        .render_page(target)
}

pub fn texts(group: &Group) -> Vec<&str> {
    group.texts().iter().map(|t| t.content.as_str()).collect()
}
