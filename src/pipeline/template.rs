//! Per-page header and footer content.
use crate::error::ExportError;
use drawdom_dom::{Document, NodeId, NodeSpec, parse_fragment};
use handlebars::{Handlebars, no_escape};
use serde::{Deserialize, Deserializer};
use serde_json::json;
use std::fmt;
use std::sync::Arc;

/// What a generator template is called with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageContext {
    /// The page element the content will be appended to.
    pub element: NodeId,
    pub page_num: usize,
    pub total_pages: usize,
}

pub type PageGenerator = Arc<dyn Fn(&PageContext) -> Option<NodeSpec> + Send + Sync>;

/// Content appended to every page after splitting.
#[derive(Clone)]
pub enum PageTemplate {
    /// Handlebars source producing XHTML, with `pageNum` and `totalPages`
    /// in scope: `<div class="footer">{{pageNum}} / {{totalPages}}</div>`.
    Markup(String),
    /// The same fragment on every page.
    Fragment(NodeSpec),
    Generator(PageGenerator),
}

impl PageTemplate {
    pub fn generator<F>(f: F) -> Self
    where
        F: Fn(&PageContext) -> Option<NodeSpec> + Send + Sync + 'static,
    {
        PageTemplate::Generator(Arc::new(f))
    }

    fn nodes(&self, engine: &Handlebars<'_>, page: &PageContext) -> Result<Vec<NodeSpec>, ExportError> {
        match self {
            PageTemplate::Markup(source) => {
                let data = json!({
                    "pageNum": page.page_num,
                    "totalPages": page.total_pages,
                });
                let markup = engine.render_template(source.trim(), &data)?;
                Ok(parse_fragment(markup.trim())?)
            }
            PageTemplate::Fragment(spec) => Ok(vec![spec.clone()]),
            PageTemplate::Generator(generate) => Ok(generate(page).into_iter().collect()),
        }
    }
}

impl fmt::Debug for PageTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageTemplate::Markup(source) => f.debug_tuple("Markup").field(source).finish(),
            PageTemplate::Fragment(spec) => f.debug_tuple("Fragment").field(spec).finish(),
            PageTemplate::Generator(_) => f.write_str("Generator"),
        }
    }
}

impl<'de> Deserialize<'de> for PageTemplate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(PageTemplate::Markup)
    }
}

fn template_engine() -> Handlebars<'static> {
    let mut engine = Handlebars::new();
    engine.set_strict_mode(false);
    // Output is markup for the document, not HTML to be escaped twice.
    engine.register_escape_fn(no_escape);
    engine
}

/// Appends the template's content to each page. Returns the inserted
/// nodes, in page order.
pub(crate) fn inject(doc: &mut Document, pages: &[NodeId], template: &PageTemplate) -> Result<Vec<NodeId>, ExportError> {
    let engine = template_engine();
    let total_pages = pages.len();
    let mut inserted = Vec::new();
    for (i, &element) in pages.iter().enumerate() {
        let page = PageContext {
            element,
            page_num: i + 1,
            total_pages,
        };
        for spec in template.nodes(&engine, &page)? {
            inserted.push(doc.append_spec(element, &spec));
        }
    }
    log::debug!("page template added {} node(s) to {} page(s)", inserted.len(), total_pages);
    Ok(inserted)
}
