//! Serves image URLs from a local directory.
//!
//! Documents reference images by relative URL (`img/logo.png`,
//! `./bg.jpg?v=2`) or `file://` URL. Both are resolved below a base
//! directory; anything that would leave it is refused.

use drawdom_traits::{ResourceError, ResourceProvider, SharedResourceData};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

#[derive(Debug)]
pub struct DirectoryResourceProvider {
    base_path: PathBuf,
    /// Canonical form of `base_path`, when it exists.
    canonical_base: Option<PathBuf>,
}

impl DirectoryResourceProvider {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        let base = base_path.as_ref().to_path_buf();
        let canonical = base.canonicalize().ok();
        Self {
            base_path: base,
            canonical_base: canonical,
        }
    }

    pub fn base(&self) -> &Path {
        &self.base_path
    }

    /// Maps a URL to a file below the base directory. Returns `None` for
    /// network URLs and for paths escaping the base.
    fn resolve(&self, url: &str) -> Option<PathBuf> {
        let path = url_path(url)?;
        if path.is_empty() || Path::new(path).is_absolute() {
            return None;
        }
        if Path::new(path)
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return None;
        }

        let full_path = self.base_path.join(path);
        if let Ok(canonical) = full_path.canonicalize()
            && let Some(base) = &self.canonical_base
        {
            return canonical.starts_with(base).then_some(canonical);
        }
        Some(full_path)
    }
}

/// The path part of a relative or `file://` URL, without query or fragment.
fn url_path(url: &str) -> Option<&str> {
    let rest = match url.strip_prefix("file://") {
        Some(rest) => rest.trim_start_matches('/'),
        None if url.contains("://") => return None,
        None => url,
    };
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    Some(rest[..end].trim_start_matches("./"))
}

impl ResourceProvider for DirectoryResourceProvider {
    fn load(&self, url: &str) -> Result<SharedResourceData, ResourceError> {
        let full_path = self
            .resolve(url)
            .ok_or_else(|| ResourceError::NotFound(format!("{} (outside {})", url, self.base_path.display())))?;

        std::fs::read(&full_path).map(Arc::new).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ResourceError::NotFound(url.to_string())
            } else {
                ResourceError::LoadFailed {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn loads_relative_url() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("logo.png"), b"png bytes").unwrap();

        let provider = DirectoryResourceProvider::new(dir.path());
        let data = provider.load("logo.png").unwrap();
        assert_eq!(&*data, b"png bytes");
    }

    #[test]
    fn strips_query_fragment_and_dot_prefix() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("img")).unwrap();
        fs::write(dir.path().join("img").join("bg.jpg"), b"jpg").unwrap();

        let provider = DirectoryResourceProvider::new(dir.path());
        assert_eq!(&*provider.load("./img/bg.jpg?v=2").unwrap(), b"jpg");
        assert_eq!(&*provider.load("img/bg.jpg#frag").unwrap(), b"jpg");
        assert_eq!(&*provider.load("file:///img/bg.jpg").unwrap(), b"jpg");
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let provider = DirectoryResourceProvider::new(dir.path());
        assert!(matches!(
            provider.load("nothing.png"),
            Err(ResourceError::NotFound(_))
        ));
    }

    #[test]
    fn refuses_network_urls() {
        let dir = tempdir().unwrap();
        let provider = DirectoryResourceProvider::new(dir.path());
        assert!(provider.load("https://example.com/a.png").is_err());
    }

    #[test]
    fn blocks_path_traversal() {
        let dir = tempdir().unwrap();
        let provider = DirectoryResourceProvider::new(dir.path());
        assert!(provider.load("../../../etc/passwd").is_err());
        assert!(provider.load("img/../../secret").is_err());
        assert!(provider.load("/etc/passwd").is_err());
    }
}
