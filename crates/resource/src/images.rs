//! Image preloading.
//!
//! Every image an export will draw is loaded and decoded once before
//! rendering starts, so the renderer can ask synchronously whether an image
//! is usable and how large it is. Entries are created once per URL and move
//! from pending to a terminal state exactly once; concurrent preloads of the
//! same URL share one load.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use drawdom_dom::{Document, NodeId};
use drawdom_style::{BackgroundImage, BackgroundParser};
use drawdom_traits::{LayoutHost, ResourceError, ResourceProvider};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::OnceCell;
use tokio::task::JoinSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageState {
    Pending,
    Loaded { width: u32, height: u32 },
    Failed,
}

#[derive(Error, Debug)]
pub enum ImageLoadError {
    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("malformed data URL: {0}")]
    DataUrl(String),

    #[error("cannot decode image: {0}")]
    Decode(String),

    #[error("image loader task failed: {0}")]
    Task(String),
}

type Slot = Arc<OnceCell<ImageState>>;

#[derive(Debug)]
struct CacheInner {
    provider: Arc<dyn ResourceProvider>,
    entries: Mutex<HashMap<String, Slot>>,
}

/// URL → decoded dimensions. Cloning shares the cache.
#[derive(Debug, Clone)]
pub struct ImageCache {
    inner: Arc<CacheInner>,
}

impl ImageCache {
    pub fn new(provider: Arc<dyn ResourceProvider>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                provider,
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// `None` for URLs never requested.
    pub fn state(&self, url: &str) -> Option<ImageState> {
        let entries = self.inner.entries.lock().ok()?;
        let slot = entries.get(url)?;
        Some(slot.get().copied().unwrap_or(ImageState::Pending))
    }

    /// Dimensions of a loaded image with a non-empty raster.
    pub fn dimensions(&self, url: &str) -> Option<(u32, u32)> {
        match self.state(url)? {
            ImageState::Loaded { width, height } if width > 0 && height > 0 => {
                Some((width, height))
            }
            _ => None,
        }
    }

    pub fn is_failed(&self, url: &str) -> bool {
        self.state(url) == Some(ImageState::Failed)
    }

    pub fn len(&self) -> usize {
        self.inner.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, url: &str) -> Slot {
        match self.inner.entries.lock() {
            Ok(mut entries) => entries.entry(url.to_string()).or_default().clone(),
            // A poisoned map still yields a working, if unshared, slot.
            Err(_) => Slot::default(),
        }
    }

    /// Loads one URL, or waits for the load already in flight.
    pub async fn load(&self, url: &str) -> ImageState {
        let slot = self.slot(url);
        let provider = Arc::clone(&self.inner.provider);
        let owned = url.to_string();
        *slot
            .get_or_init(|| async move {
                let label = owned.clone();
                let result = tokio::task::spawn_blocking(move || read_dimensions(&*provider, &owned))
                    .await
                    .map_err(|e| ImageLoadError::Task(e.to_string()))
                    .and_then(|r| r);
                match result {
                    Ok((width, height)) => {
                        log::debug!("image {} loaded ({}x{})", short(&label), width, height);
                        ImageState::Loaded { width, height }
                    }
                    Err(e) => {
                        log::warn!("image {} failed to load: {}", short(&label), e);
                        ImageState::Failed
                    }
                }
            })
            .await
    }

    /// Loads every URL concurrently and returns once all of them are in a
    /// terminal state.
    pub async fn preload<I>(&self, urls: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut tasks = JoinSet::new();
        for url in urls {
            if matches!(self.state(&url), Some(ImageState::Loaded { .. } | ImageState::Failed)) {
                continue;
            }
            let cache = self.clone();
            tasks.spawn(async move { cache.load(&url).await });
        }
        if !tasks.is_empty() {
            log::debug!("preloading {} image(s)", tasks.len());
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                log::warn!("image preload task aborted: {}", e);
            }
        }
    }
}

fn short(url: &str) -> &str {
    if url.len() > 64 && url.starts_with("data:") {
        let end = (0..=48).rev().find(|&i| url.is_char_boundary(i)).unwrap_or(0);
        &url[..end]
    } else {
        url
    }
}

fn read_dimensions(provider: &dyn ResourceProvider, url: &str) -> Result<(u32, u32), ImageLoadError> {
    let bytes = if url.starts_with("data:") {
        Arc::new(decode_data_url(url)?)
    } else {
        provider.load(url)?
    };
    image::ImageReader::new(Cursor::new(bytes.as_slice()))
        .with_guessed_format()
        .map_err(|e| ImageLoadError::Decode(e.to_string()))?
        .into_dimensions()
        .map_err(|e| ImageLoadError::Decode(e.to_string()))
}

/// Payload of a `data:` URL, base64 or percent-encoded.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, ImageLoadError> {
    let body = url
        .strip_prefix("data:")
        .ok_or_else(|| ImageLoadError::DataUrl("missing data: prefix".to_string()))?;
    let (meta, payload) = body
        .split_once(',')
        .ok_or_else(|| ImageLoadError::DataUrl("missing ','".to_string()))?;
    if meta.split(';').any(|p| p.trim().eq_ignore_ascii_case("base64")) {
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| ImageLoadError::DataUrl(e.to_string()))
    } else {
        Ok(percent_decode(payload))
    }
}

fn percent_decode(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && let Some(v) = bytes.get(i + 1..i + 3).and_then(hex_byte)
        {
            out.push(v);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    out
}

fn hex_byte(pair: &[u8]) -> Option<u8> {
    let digit = |b: u8| (b as char).to_digit(16);
    Some((digit(pair[0])? * 16 + digit(pair[1])?) as u8)
}

/// Image URLs referenced by `root` and its descendants: `<img src>` and every
/// `url(...)` layer of the computed `background-image`. Document order,
/// duplicates removed.
pub fn discover_image_urls(
    doc: &Document,
    host: &dyn LayoutHost,
    root: NodeId,
    backgrounds: &BackgroundParser,
) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    let mut push = |url: &str| {
        if !url.is_empty() && !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
    };
    let nodes = std::iter::once(root).chain(doc.descendants(root));
    for node in nodes.filter(|&n| doc.is_element(n)) {
        if doc.is_tag(node, "img")
            && let Some(src) = doc.attr(node, "src")
        {
            push(src.trim());
        }
        let style = host.computed_style(doc, node, None);
        let value = style.get("background-image");
        if value.is_empty() || value == "none" {
            continue;
        }
        for layer in backgrounds.parse(value).iter() {
            if let BackgroundImage::Url(url) = layer {
                push(url);
            }
        }
    }
    urls
}
