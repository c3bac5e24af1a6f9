use super::progress::{CancelToken, Progress};
use super::template::PageTemplate;
use crate::error::ExportError;
use drawdom_dom::{Document, NodeId, SelectorList};
use drawdom_style::{Margins, PageSize};
use serde::{Deserialize, Deserializer, de};
use std::fmt;
use std::sync::Arc;

/// Called with the off-screen working container right before it is split,
/// for last-moment adjustments to the copy being paginated.
pub type BeforePageBreak = Arc<dyn Fn(&mut Document, NodeId) + Send + Sync>;

/// Called after each page has been rendered.
pub type ProgressCallback = Arc<dyn Fn(&Progress) + Send + Sync>;

/// Which anchors are exported without a link annotation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AvoidLinks {
    /// `true` skips every anchor, `false` none.
    All(bool),
    Matching(String),
}

impl Default for AvoidLinks {
    fn default() -> Self {
        AvoidLinks::All(false)
    }
}

impl AvoidLinks {
    fn selector(&self) -> Option<&str> {
        match self {
            AvoidLinks::All(true) => Some("a"),
            AvoidLinks::All(false) => None,
            AvoidLinks::Matching(selector) => Some(selector.as_str()),
        }
    }
}

/// `auto` keeps the content on one page of whatever size it needs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PaperSize {
    #[default]
    Auto,
    Fixed(PageSize),
}

impl<'de> Deserialize<'de> for PaperSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum PaperSizeDef {
            Name(String),
            Size(PageSize),
        }

        match PaperSizeDef::deserialize(deserializer)? {
            PaperSizeDef::Name(name) if name.trim().eq_ignore_ascii_case("auto") => Ok(PaperSize::Auto),
            PaperSizeDef::Name(name) => PageSize::parse(name.trim())
                .map(PaperSize::Fixed)
                .map_err(de::Error::custom),
            PaperSizeDef::Size(size) => Ok(PaperSize::Fixed(size)),
        }
    }
}

/// Paper dimensions and margins of a paginated export, in points. Page
/// content is laid out with one point per CSS pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: Margins,
}

impl PageGeometry {
    pub fn content_width(&self) -> f32 {
        self.width - self.margin.left - self.margin.right
    }

    pub fn content_height(&self) -> f32 {
        self.height - self.margin.top - self.margin.bottom
    }
}

/// Options of one export.
///
/// The data fields deserialize from camelCase JSON:
///
/// ```
/// # use drawdom::ExportOptions;
/// let options: ExportOptions = serde_json::from_str(r#"{
///     "paperSize": "A4",
///     "margin": "1cm 2cm",
///     "forcePageBreak": ".page-break",
///     "avoidLinks": true
/// }"#).unwrap();
/// assert!(options.page_geometry().is_some());
/// ```
///
/// Hooks are code-only and set with the `with_*` methods.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    pub avoid_links: AvoidLinks,
    /// Selector of elements that always start a new page. `-` produces a
    /// single-page multi-page document without splitting.
    pub force_page_break: Option<String>,
    pub paper_size: PaperSize,
    pub landscape: bool,
    /// Only used together with a paper size; zero when absent.
    pub margin: Option<Margins>,
    pub template: Option<PageTemplate>,
    pub page_class_name: Option<String>,
    #[serde(skip)]
    pub before_page_break: Option<BeforePageBreak>,
    #[serde(skip)]
    pub progress: Option<ProgressCallback>,
    #[serde(skip)]
    pub cancel: Option<CancelToken>,
}

impl fmt::Debug for ExportOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportOptions")
            .field("avoid_links", &self.avoid_links)
            .field("force_page_break", &self.force_page_break)
            .field("paper_size", &self.paper_size)
            .field("landscape", &self.landscape)
            .field("margin", &self.margin)
            .field("template", &self.template)
            .field("page_class_name", &self.page_class_name)
            .field("before_page_break", &self.before_page_break.is_some())
            .field("progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_avoid_links(mut self, avoid: AvoidLinks) -> Self {
        self.avoid_links = avoid;
        self
    }

    pub fn with_force_page_break(mut self, selector: impl Into<String>) -> Self {
        self.force_page_break = Some(selector.into());
        self
    }

    pub fn with_paper_size(mut self, size: PageSize) -> Self {
        self.paper_size = PaperSize::Fixed(size);
        self
    }

    pub fn with_landscape(mut self, landscape: bool) -> Self {
        self.landscape = landscape;
        self
    }

    pub fn with_margin(mut self, margin: Margins) -> Self {
        self.margin = Some(margin);
        self
    }

    pub fn with_template(mut self, template: PageTemplate) -> Self {
        self.template = Some(template);
        self
    }

    pub fn with_page_class_name(mut self, class: impl Into<String>) -> Self {
        self.page_class_name = Some(class.into());
        self
    }

    pub fn with_before_page_break<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Document, NodeId) + Send + Sync + 'static,
    {
        self.before_page_break = Some(Arc::new(hook));
        self
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Progress) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// A token checked between pages, in addition to the one handed to
    /// the progress callback.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Paper geometry, `None` for `auto`. Landscape puts the long side
    /// horizontally.
    pub fn page_geometry(&self) -> Option<PageGeometry> {
        let PaperSize::Fixed(size) = self.paper_size else {
            return None;
        };
        let (width, height) = if self.landscape {
            size.landscape_pt()
        } else {
            size.dimensions_pt()
        };
        Some(PageGeometry {
            width,
            height,
            margin: self.margin.unwrap_or_default(),
        })
    }

    /// Whether the export produces a multi-page document.
    pub fn paginates(&self) -> bool {
        self.force_page_break.is_some() || self.page_geometry().is_some()
    }

    pub(crate) fn validate(&self) -> Result<(), ExportError> {
        if let Some(geometry) = self.page_geometry()
            && (geometry.content_width() <= 0.0 || geometry.content_height() <= 0.0)
        {
            return Err(ExportError::InvalidOption {
                option: "margin",
                reason: format!(
                    "leaves no room for content on a {}x{}pt page",
                    geometry.width, geometry.height
                ),
            });
        }
        Ok(())
    }

    pub(crate) fn avoid_links_selector(&self) -> Result<Option<SelectorList>, ExportError> {
        self.avoid_links
            .selector()
            .map(SelectorList::parse)
            .transpose()
            .map_err(ExportError::from)
    }

    pub(crate) fn force_break_selector(&self) -> Result<Option<SelectorList>, ExportError> {
        match self.force_page_break.as_deref().map(str::trim) {
            None | Some("-") | Some("") => Ok(None),
            Some(selector) => Ok(Some(SelectorList::parse(selector)?)),
        }
    }
}
