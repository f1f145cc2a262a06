use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use tokio::time::{Duration, sleep, timeout};

use super::*;

#[derive(Clone, Default)]
struct MockProvider {
    requested: Arc<Mutex<Vec<u32>>>,
    failing: Vec<u32>,
    latency: Duration,
}

#[async_trait]
impl PageProvider for MockProvider {
    async fn open(&self, path: &Path) -> Result<DocumentRef, PageError> {
        Ok(document_at(path, 10))
    }

    async fn render_page(
        &self,
        _document: &DocumentRef,
        page_number: u32,
        _target_width: u32,
    ) -> Result<RenderedPage, PageError> {
        self.requested.lock().unwrap().push(page_number);
        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }
        if self.failing.contains(&page_number) {
            return Err(PageError::Worker(format!("page {page_number} is corrupt")));
        }
        Ok(RenderedPage {
            page_number,
            width: 100.0,
            height: 140.0,
            image: RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255])),
        })
    }
}

fn document_at(path: &Path, count: u32) -> DocumentRef {
    DocumentRef {
        path: path.to_path_buf(),
        pages: (1..=count)
            .map(|n| PageMeta {
                page_number: n,
                width: 100.0,
                height: 140.0,
            })
            .collect(),
    }
}

fn quick_settings() -> PrefetchSettings {
    PrefetchSettings {
        delay: Duration::from_millis(1),
        target_width: 200,
    }
}

fn make_queue(provider: MockProvider, cache: PageCache) -> PrefetchQueue {
    let mut queue = PrefetchQueue::new(
        &tokio::runtime::Handle::current(),
        Arc::new(provider),
        cache,
        quick_settings(),
    );
    queue.set_document(Some(document_at(Path::new("/docs/sample"), 10)));
    queue
}

async fn collect_events(queue: &mut PrefetchQueue, count: usize) -> Vec<PageEvent> {
    let mut events = Vec::new();
    while events.len() < count {
        match timeout(Duration::from_secs(5), queue.next_event()).await {
            Ok(Some(event)) => events.push(event),
            _ => break,
        }
    }
    events
}

#[tokio::test]
async fn navigate_requests_current_then_neighbours() {
    let provider = MockProvider::default();
    let requested = provider.requested.clone();
    let mut queue = make_queue(provider, PageCache::new());

    assert_eq!(queue.navigate(5), vec![5, 4, 6]);
    let events = collect_events(&mut queue, 3).await;
    assert_eq!(
        events,
        vec![
            PageEvent::Loaded { page_number: 5 },
            PageEvent::Loaded { page_number: 4 },
            PageEvent::Loaded { page_number: 6 },
        ]
    );
    assert_eq!(*requested.lock().unwrap(), vec![5, 4, 6]);
    assert_eq!(queue.cache().page_numbers(), vec![4, 5, 6]);
}

#[tokio::test]
async fn navigate_skips_cached_and_out_of_range_pages() {
    let cache = PageCache::new();
    cache.insert(RenderedPage {
        page_number: 2,
        width: 1.0,
        height: 1.0,
        image: RgbaImage::new(1, 1),
    });
    let mut queue = make_queue(MockProvider::default(), cache);

    assert_eq!(queue.navigate(1), vec![1]);
    assert_eq!(queue.navigate(10), vec![10, 9]);
}

#[tokio::test]
async fn navigate_without_document_is_a_no_op() {
    let mut queue = PrefetchQueue::new(
        &tokio::runtime::Handle::current(),
        Arc::new(MockProvider::default()),
        PageCache::new(),
        quick_settings(),
    );
    assert!(queue.navigate(1).is_empty());
    assert!(queue.drain_events().is_empty());
}

#[tokio::test]
async fn failure_is_reported_and_queue_continues() {
    let provider = MockProvider {
        failing: vec![4],
        ..Default::default()
    };
    let mut queue = make_queue(provider, PageCache::new());

    queue.navigate(5);
    let events = collect_events(&mut queue, 3).await;
    assert_eq!(events.len(), 3);
    assert!(matches!(
        events[1],
        PageEvent::Failed { page_number: 4, .. }
    ));
    assert_eq!(events[2], PageEvent::Loaded { page_number: 6 });
    assert!(!queue.cache().contains(4));
    assert!(queue.cache().contains(6));
}

#[tokio::test]
async fn superseded_fetch_is_discarded() {
    let provider = MockProvider {
        latency: Duration::from_millis(60),
        ..Default::default()
    };
    let requested = provider.requested.clone();
    let mut queue = make_queue(provider, PageCache::new());

    queue.navigate(1);
    // Let the worker start on page 1.
    sleep(Duration::from_millis(20)).await;
    queue.navigate(8);

    let events = collect_events(&mut queue, 3).await;
    assert_eq!(
        events,
        vec![
            PageEvent::Loaded { page_number: 8 },
            PageEvent::Loaded { page_number: 7 },
            PageEvent::Loaded { page_number: 9 },
        ]
    );
    assert!(!queue.cache().contains(1));
    assert_eq!(requested.lock().unwrap().first(), Some(&1));
    assert!(!requested.lock().unwrap().contains(&2));
}

#[tokio::test]
async fn cache_never_replaces_entries() {
    let cache = PageCache::new();
    let first = RenderedPage {
        page_number: 3,
        width: 10.0,
        height: 10.0,
        image: RgbaImage::new(1, 1),
    };
    assert!(cache.insert(first));
    let second = RenderedPage {
        page_number: 3,
        width: 99.0,
        height: 99.0,
        image: RgbaImage::new(2, 2),
    };
    assert!(!cache.insert(second));
    assert_eq!(cache.get(3).unwrap().width, 10.0);
    assert_eq!(cache.len(), 1);
}

fn write_page(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
    let path = dir.join(name);
    RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255]))
        .save(&path)
        .unwrap();
    path
}

#[tokio::test]
async fn image_directory_provider_reads_contiguous_pages() {
    let dir = tempfile::tempdir().unwrap();
    write_page(dir.path(), "page-1.png", 40, 60);
    write_page(dir.path(), "page-2.png", 80, 60);
    write_page(dir.path(), "page-4.png", 10, 10);
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let provider = ImageDirectoryProvider::new();
    let document = provider.open(dir.path()).await.unwrap();
    assert_eq!(document.page_count(), 2);
    assert_eq!(
        document.page(2),
        Some(&PageMeta {
            page_number: 2,
            width: 80.0,
            height: 60.0
        })
    );

    let page = provider.render_page(&document, 1, 20).await.unwrap();
    assert_eq!(page.image.dimensions(), (20, 30));
    assert_eq!(page.width, 40.0);

    let missing = provider.render_page(&document, 3, 20).await;
    assert!(matches!(missing, Err(PageError::OutOfRange { page: 3, count: 2 })));
}

#[tokio::test]
async fn image_directory_provider_rejects_empty_or_missing_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ImageDirectoryProvider::new();
    assert!(matches!(
        provider.open(dir.path()).await,
        Err(PageError::Empty(_))
    ));
    assert!(matches!(
        provider.open(&dir.path().join("nope")).await,
        Err(PageError::NotFound(_))
    ));
}
