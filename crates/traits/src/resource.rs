//! Where image bytes come from.
//!
//! `data:` URLs are decoded by the image cache and never reach a provider.
//! Everything else (relative paths, `http(s)` URLs, custom schemes) is
//! handed over exactly as it appears in the document.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResourceError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Failed to load resource '{url}': {message}")]
    LoadFailed { url: String, message: String },
}

/// Bytes of one fetched resource, shared between the cache and decoders.
pub type SharedResourceData = Arc<Vec<u8>>;

/// Fetches image bytes by URL. Runs on the blocking pool, so
/// implementations may do synchronous I/O.
pub trait ResourceProvider: Send + Sync + Debug {
    fn load(&self, url: &str) -> Result<SharedResourceData, ResourceError>;
}

/// Serves bytes registered up front, keyed by the exact URL string.
#[derive(Debug, Default)]
pub struct InMemoryResourceProvider {
    entries: RwLock<HashMap<String, SharedResourceData>>,
}

impl InMemoryResourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`InMemoryResourceProvider::insert`].
    pub fn with(self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(url.into(), Arc::new(bytes));
        }
        self
    }

    /// Registers bytes under a URL, replacing any previous entry.
    pub fn insert(&self, url: impl Into<String>, bytes: Vec<u8>) -> Result<(), ResourceError> {
        let url = url.into();
        let mut entries = self.entries.write().map_err(|_| poisoned(&url))?;
        entries.insert(url, Arc::new(bytes));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned(url: &str) -> ResourceError {
    ResourceError::LoadFailed {
        url: url.to_string(),
        message: "resource store lock poisoned".to_string(),
    }
}

impl ResourceProvider for InMemoryResourceProvider {
    fn load(&self, url: &str) -> Result<SharedResourceData, ResourceError> {
        let entries = self.entries.read().map_err(|_| poisoned(url))?;
        entries
            .get(url)
            .cloned()
            .ok_or_else(|| ResourceError::NotFound(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_urls_load() {
        let provider = InMemoryResourceProvider::new().with("img/logo.png", b"PNG".to_vec());
        provider.insert("bg.jpg", b"JPG".to_vec()).unwrap();
        assert_eq!(&*provider.load("img/logo.png").unwrap(), b"PNG");
        assert_eq!(&*provider.load("bg.jpg").unwrap(), b"JPG");
        assert_eq!(provider.len(), 2);
    }

    #[test]
    fn urls_are_matched_verbatim() {
        let provider = InMemoryResourceProvider::new().with("logo.png", Vec::new());
        assert!(matches!(
            provider.load("./logo.png"),
            Err(ResourceError::NotFound(url)) if url == "./logo.png"
        ));
    }
}
