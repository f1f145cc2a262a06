use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc;

use crate::pages::cache::PageCache;
use crate::pages::provider::{DEFAULT_TARGET_WIDTH, PageProvider};
use crate::pages::types::{DocumentRef, PageEvent};

/// Shared cancellation flag for one navigation's batch of requests.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Tuning for the prefetch worker.
#[derive(Debug, Clone, Copy)]
pub struct PrefetchSettings {
    /// Pause between consecutive fetches, yielding to the render loop.
    pub delay: Duration,
    pub target_width: u32,
}

impl Default for PrefetchSettings {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(16),
            target_width: DEFAULT_TARGET_WIDTH,
        }
    }
}

struct Batch {
    document: Arc<DocumentRef>,
    pages: Vec<u32>,
    token: CancelToken,
}

/// Keeps the current page and its neighbours rasterized.
///
/// Owns a single long-lived worker task; each [`navigate`](Self::navigate)
/// cancels the previous batch and queues a new one. The worker fetches one page
/// at a time and drops results whose batch was cancelled while in flight.
pub struct PrefetchQueue {
    request_tx: mpsc::UnboundedSender<Batch>,
    event_rx: mpsc::UnboundedReceiver<PageEvent>,
    cache: PageCache,
    document: Option<Arc<DocumentRef>>,
    current: Option<CancelToken>,
}

impl PrefetchQueue {
    /// Spawns the worker on `runtime_handle`.
    pub fn new(
        runtime_handle: &tokio::runtime::Handle,
        provider: Arc<dyn PageProvider>,
        cache: PageCache,
        settings: PrefetchSettings,
    ) -> Self {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<Batch>();
        let (event_tx, event_rx) = mpsc::unbounded_channel::<PageEvent>();
        let worker_cache = cache.clone();

        runtime_handle.spawn(async move {
            while let Some(batch) = request_rx.recv().await {
                run_batch(&*provider, &worker_cache, &event_tx, batch, settings).await;
            }
            debug!("Prefetch worker exiting");
        });

        Self {
            request_tx,
            event_rx,
            cache,
            document: None,
            current: None,
        }
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    pub fn document(&self) -> Option<&DocumentRef> {
        self.document.as_deref()
    }

    /// Switches documents, abandoning any pending work for the old one.
    pub fn set_document(&mut self, document: Option<DocumentRef>) {
        self.cancel();
        self.document = document.map(Arc::new);
    }

    /// Queues `[n, n-1, n+1]` (minus cached and out-of-range pages), replacing any pending batch.
    ///
    /// Returns the pages actually requested.
    pub fn navigate(&mut self, page_number: u32) -> Vec<u32> {
        self.cancel();
        let Some(document) = self.document.clone() else {
            return Vec::new();
        };

        let mut pages = Vec::with_capacity(3);
        for candidate in [
            Some(page_number),
            page_number.checked_sub(1),
            page_number.checked_add(1),
        ]
        .into_iter()
        .flatten()
        {
            if document.contains(candidate)
                && !self.cache.contains(candidate)
                && !pages.contains(&candidate)
            {
                pages.push(candidate);
            }
        }
        if pages.is_empty() {
            return pages;
        }

        let token = CancelToken::new();
        let batch = Batch {
            document,
            pages: pages.clone(),
            token: token.clone(),
        };
        if self.request_tx.send(batch).is_err() {
            warn!("Prefetch worker is not running; page {} will stay blank", page_number);
            return Vec::new();
        }
        debug!("Queued pages {:?} for page {}", pages, page_number);
        self.current = Some(token);
        pages
    }

    /// Abandons the pending batch, if any.
    pub fn cancel(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
    }

    /// Collects events published since the last call without blocking.
    pub fn drain_events(&mut self) -> Vec<PageEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.event_rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Waits for the next event; `None` once the worker has stopped.
    pub async fn next_event(&mut self) -> Option<PageEvent> {
        self.event_rx.recv().await
    }
}

impl Drop for PrefetchQueue {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_batch(
    provider: &dyn PageProvider,
    cache: &PageCache,
    events: &mpsc::UnboundedSender<PageEvent>,
    batch: Batch,
    settings: PrefetchSettings,
) {
    for (index, page_number) in batch.pages.iter().copied().enumerate() {
        if batch.token.is_cancelled() {
            debug!("Prefetch batch superseded before page {}", page_number);
            return;
        }
        if index > 0 && !settings.delay.is_zero() {
            tokio::time::sleep(settings.delay).await;
            if batch.token.is_cancelled() {
                return;
            }
        }
        if cache.contains(page_number) {
            continue;
        }

        let result = provider
            .render_page(&batch.document, page_number, settings.target_width)
            .await;
        if batch.token.is_cancelled() {
            debug!("Discarding stale result for page {}", page_number);
            return;
        }

        let event = match result {
            Ok(page) => {
                cache.insert(page);
                info!("Rendered background page {}", page_number);
                PageEvent::Loaded { page_number }
            }
            Err(err) => {
                warn!("Failed to render page {}: {}", page_number, err);
                PageEvent::Failed {
                    page_number,
                    error: err.to_string(),
                }
            }
        };
        let _ = events.send(event);
    }
}
