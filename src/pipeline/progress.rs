use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag, shared by cloning. The exporter checks it
/// between pages.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Reported after each page of a multi-page export.
#[derive(Debug, Clone)]
pub struct Progress {
    /// One-based number of the page just rendered.
    pub page_num: usize,
    pub total_pages: usize,
    cancel: CancelToken,
}

impl Progress {
    pub(crate) fn new(page_num: usize, total_pages: usize, cancel: CancelToken) -> Self {
        Self {
            page_num,
            total_pages,
            cancel,
        }
    }

    /// Stops the export once this callback returns.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}
