use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::imageops::FilterType;
use log::debug;

use crate::pages::types::{DocumentRef, PageError, PageMeta, RenderedPage};

/// Default raster width requested for background pages.
pub const DEFAULT_TARGET_WIDTH: u32 = 1600;

const PAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Source of rasterized background pages. Implementations may be slow; they
/// are only ever awaited from the prefetch worker.
#[async_trait]
pub trait PageProvider: Send + Sync {
    async fn open(&self, path: &Path) -> Result<DocumentRef, PageError>;

    async fn render_page(
        &self,
        document: &DocumentRef,
        page_number: u32,
        target_width: u32,
    ) -> Result<RenderedPage, PageError>;
}

/// Reads pre-rasterized pages named `page-<n>.png|jpg|jpeg` from a directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageDirectoryProvider;

impl ImageDirectoryProvider {
    pub fn new() -> Self {
        Self
    }
}

/// Finds the image file for `page_number` inside `dir`.
pub fn page_file(dir: &Path, page_number: u32) -> Option<PathBuf> {
    PAGE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("page-{page_number}.{ext}")))
        .find(|candidate| candidate.is_file())
}

fn page_number_of(path: &Path) -> Option<u32> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if !PAGE_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .strip_prefix("page-")?
        .parse::<u32>()
        .ok()
        .filter(|n| *n >= 1)
}

fn scan_directory(dir: &Path) -> Result<DocumentRef, PageError> {
    if !dir.is_dir() {
        return Err(PageError::NotFound(dir.to_path_buf()));
    }

    let mut numbers: Vec<u32> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| page_number_of(&entry.path()))
        .collect();
    numbers.sort_unstable();
    numbers.dedup();

    // Pages are numbered contiguously from 1; anything after a gap is ignored.
    let mut pages = Vec::new();
    for (expected, number) in (1u32..).zip(numbers) {
        if number != expected {
            break;
        }
        let Some(file) = page_file(dir, number) else {
            break;
        };
        let (width, height) = image::image_dimensions(&file)?;
        pages.push(PageMeta {
            page_number: number,
            width: width as f64,
            height: height as f64,
        });
    }

    if pages.is_empty() {
        return Err(PageError::Empty(dir.to_path_buf()));
    }
    Ok(DocumentRef {
        path: dir.to_path_buf(),
        pages,
    })
}

fn rasterize(
    file: &Path,
    meta: PageMeta,
    target_width: u32,
) -> Result<RenderedPage, PageError> {
    let mut image = image::open(file)?.to_rgba8();
    if target_width > 0 && image.width() != target_width && image.width() > 0 {
        let ratio = target_width as f64 / image.width() as f64;
        let height = ((image.height() as f64 * ratio).round() as u32).max(1);
        image = image::imageops::resize(&image, target_width, height, FilterType::Triangle);
    }
    Ok(RenderedPage {
        page_number: meta.page_number,
        width: meta.width,
        height: meta.height,
        image,
    })
}

#[async_trait]
impl PageProvider for ImageDirectoryProvider {
    async fn open(&self, path: &Path) -> Result<DocumentRef, PageError> {
        let dir = path.to_path_buf();
        let document = tokio::task::spawn_blocking(move || scan_directory(&dir))
            .await
            .map_err(|e| PageError::Worker(e.to_string()))??;
        debug!(
            "Opened {} with {} page(s)",
            document.path.display(),
            document.page_count()
        );
        Ok(document)
    }

    async fn render_page(
        &self,
        document: &DocumentRef,
        page_number: u32,
        target_width: u32,
    ) -> Result<RenderedPage, PageError> {
        let meta = *document.page(page_number).ok_or(PageError::OutOfRange {
            page: page_number,
            count: document.page_count(),
        })?;
        let file = page_file(&document.path, page_number)
            .ok_or_else(|| PageError::NotFound(document.path.join(format!("page-{page_number}"))))?;

        tokio::task::spawn_blocking(move || rasterize(&file, meta, target_width))
            .await
            .map_err(|e| PageError::Worker(e.to_string()))?
    }
}
