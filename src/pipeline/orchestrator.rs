use super::config::ExportOptions;
use super::progress::Progress;
use super::template;
use crate::error::ExportError;
use drawdom_dom::{Document, NodeId, SelectorList};
use drawdom_layout::{PageSet, PaginationConfig, prepare};
use drawdom_render::TreeBuilder;
use drawdom_resource::{ImageCache, collect_font_faces, discover_image_urls};
use drawdom_scene::{DocumentInfo, Group};
use drawdom_style::{BackgroundParser, PageSize};
use drawdom_traits::{LayoutHost, ResourceProvider};
use log::{debug, info};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// The element to export: a node, or the first match of a selector.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportTarget {
    Node(NodeId),
    Selector(String),
}

impl From<NodeId> for ExportTarget {
    fn from(node: NodeId) -> Self {
        ExportTarget::Node(node)
    }
}

impl From<&str> for ExportTarget {
    fn from(selector: &str) -> Self {
        ExportTarget::Selector(selector.to_string())
    }
}

impl ExportTarget {
    fn resolve(&self, doc: &Document) -> Result<NodeId, ExportError> {
        let node = match self {
            ExportTarget::Node(node) => Some(*node).filter(|&n| doc.contains_id(n) && doc.is_element(n)),
            ExportTarget::Selector(selector) => {
                let selector = SelectorList::parse(selector)?;
                doc.query_selector(doc.root(), &selector)
            }
        };
        node.ok_or(ExportError::TargetNotFound)
    }
}

/// Turns document subtrees into scene graphs.
///
/// The exporter owns the caches that outlive a single export: decoded image
/// dimensions and parsed background declarations. Exports never modify the
/// caller's document; each one works on a private copy.
pub struct Exporter {
    images: ImageCache,
    backgrounds: BackgroundParser,
}

impl Exporter {
    pub fn new(provider: Arc<dyn ResourceProvider>) -> Self {
        Self {
            images: ImageCache::new(provider),
            backgrounds: BackgroundParser::new(),
        }
    }

    pub fn images(&self) -> &ImageCache {
        &self.images
    }

    /// Exports `target` as a scene.
    ///
    /// Without a paper size or forced page breaks the result is a single
    /// group translated so the element's top-left corner is the origin.
    /// Otherwise it is a multi-page group holding one group per page.
    pub async fn draw_dom(
        &self,
        doc: &Document,
        target: impl Into<ExportTarget>,
        host: &dyn LayoutHost,
        options: &ExportOptions,
    ) -> Result<Group, ExportError> {
        let started = Instant::now();
        let target: ExportTarget = target.into();
        let element = target.resolve(doc)?;
        if !host.supports_computed_style() {
            return Err(ExportError::EnvironmentUnsupported);
        }
        options.validate()?;
        let avoid_links = options.avoid_links_selector()?;
        let force_break = options.force_break_selector()?;
        info!("exporting {:?}", element);

        let fonts = collect_font_faces(&host.style_sheets(doc)).into_map();
        let mut doc = doc.clone();
        let urls = discover_image_urls(&doc, host, element, &self.backgrounds);
        self.images.preload(urls).await;

        let group = if options.paginates() {
            let pages = self.paginate(&mut doc, element, host, options, force_break).await?;
            self.render_pages(&mut doc, pages, host, options, avoid_links.as_ref(), fonts)
                .await?
        } else {
            let mut builder = TreeBuilder::new(&mut doc, host, &self.images, &self.backgrounds)
                .avoid_links(avoid_links.as_ref());
            let mut group = builder.render_page(element);
            group.document = Some(DocumentInfo {
                multi_page: false,
                paper_size: None,
                fonts,
            });
            group
        };
        info!("export finished in {:?}", started.elapsed());
        Ok(group)
    }

    /// Splits a copy of `element` into pages and adds the page template.
    async fn paginate(
        &self,
        doc: &mut Document,
        element: NodeId,
        host: &dyn LayoutHost,
        options: &ExportOptions,
        force_break: Option<SelectorList>,
    ) -> Result<PageSet, ExportError> {
        let geometry = options.page_geometry();
        let config = PaginationConfig {
            force_break,
            page_width: geometry.map(|g| g.content_width()),
            page_height: geometry.map(|g| g.content_height()),
            margin: geometry.map(|g| g.margin.to_edges()).unwrap_or_default(),
            page_class: options.page_class_name.clone(),
        };
        let prepared = prepare(doc, element, config)?;

        // Let the host lay out the working copy before it is measured.
        tokio::task::yield_now().await;
        if let Some(hook) = &options.before_page_break {
            hook(doc, prepared.container());
        }
        let pages = prepared.split(doc, host)?;

        if let Some(page_template) = &options.template {
            let inserted = template::inject(doc, pages.pages(), page_template)?;
            let mut urls = Vec::new();
            for node in inserted.into_iter().filter(|&n| doc.is_element(n)) {
                urls.extend(discover_image_urls(doc, host, node, &self.backgrounds));
            }
            self.images.preload(urls).await;
        }
        tokio::task::yield_now().await;
        Ok(pages)
    }

    async fn render_pages(
        &self,
        doc: &mut Document,
        mut pages: PageSet,
        host: &dyn LayoutHost,
        options: &ExportOptions,
        avoid_links: Option<&SelectorList>,
        fonts: BTreeMap<String, String>,
    ) -> Result<Group, ExportError> {
        let geometry = options.page_geometry();
        let mut root = Group {
            document: Some(DocumentInfo {
                multi_page: true,
                paper_size: geometry.map(|g| PageSize::Custom {
                    width: g.width,
                    height: g.height,
                }),
                fonts,
            }),
            ..Group::default()
        };

        let cancel = options.cancel.clone().unwrap_or_default();
        let page_nodes = pages.pages().to_vec();
        let total_pages = page_nodes.len();
        let mut builder =
            TreeBuilder::new(doc, host, &self.images, &self.backgrounds).avoid_links(avoid_links);
        let mut canceled = false;
        for (i, &page) in page_nodes.iter().enumerate() {
            root.append(builder.render_page(page));
            debug!("rendered page {} of {}", i + 1, total_pages);
            if let Some(progress) = &options.progress {
                progress(&Progress::new(i + 1, total_pages, cancel.clone()));
            }
            if cancel.is_canceled() {
                canceled = true;
                break;
            }
            if options.progress.is_some() && i + 1 < total_pages {
                tokio::task::yield_now().await;
            }
        }
        drop(builder);

        if canceled {
            pages.cancel(doc)?;
            info!("export canceled after {} of {} page(s)", root.children.len(), total_pages);
            return Err(ExportError::Canceled);
        }
        pages.finalize(doc)?;
        Ok(root)
    }
}

/// Shorthand for a one-off export with a fresh [`Exporter`].
pub async fn draw_dom(
    doc: &Document,
    target: impl Into<ExportTarget>,
    host: &dyn LayoutHost,
    provider: Arc<dyn ResourceProvider>,
    options: &ExportOptions,
) -> Result<Group, ExportError> {
    Exporter::new(provider).draw_dom(doc, target, host, options).await
}
