use image::RgbaImage;
use std::path::PathBuf;
use thiserror::Error;

/// Size of one page in document units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMeta {
    /// 1-based.
    pub page_number: u32,
    pub width: f64,
    pub height: f64,
}

/// An opened background document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRef {
    pub path: PathBuf,
    pub pages: Vec<PageMeta>,
}

impl DocumentRef {
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    pub fn page(&self, page_number: u32) -> Option<&PageMeta> {
        self.pages.iter().find(|p| p.page_number == page_number)
    }

    pub fn contains(&self, page_number: u32) -> bool {
        page_number >= 1 && page_number <= self.page_count()
    }
}

/// A rasterized page. `width`/`height` are the page's document size; the
/// bitmap may have a different pixel resolution.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub page_number: u32,
    pub width: f64,
    pub height: f64,
    pub image: RgbaImage,
}

/// Errors surfaced by page providers.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("Document not found: {0}")]
    NotFound(PathBuf),

    #[error("Document has no pages: {0}")]
    Empty(PathBuf),

    #[error("Page {page} is outside the document (1..={count})")]
    OutOfRange { page: u32, count: u32 },

    #[error("Failed to decode page image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Page worker failed: {0}")]
    Worker(String),
}

/// Notifications published by the prefetch worker.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    Loaded { page_number: u32 },
    Failed { page_number: u32, error: String },
}
