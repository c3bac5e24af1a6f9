#![allow(dead_code)]

use drawdom::Exporter;
use drawdom::dom::{Document, ElementSpec, NodeId, el};
use drawdom::scene::Group;
use drawdom_resource::InMemoryResourceProvider;
use std::sync::Arc;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Mounts `spec` inside a body-like wrapper and returns the mounted element.
pub fn mount(spec: ElementSpec) -> (Document, NodeId) {
    let mut doc = Document::new();
    let root = doc.root();
    let body = doc.append_spec(root, &el("div").into());
    let target = doc.append_spec(body, &spec.into());
    (doc, target)
}

pub fn exporter() -> Exporter {
    Exporter::new(Arc::new(InMemoryResourceProvider::new()))
}

pub fn texts(group: &Group) -> Vec<&str> {
    group.texts().iter().map(|t| t.content.as_str()).collect()
}

pub fn paragraphs(count: usize) -> ElementSpec {
    el("div").children((0..count).map(|i| el("p").text(&format!("p{i}"))))
}
