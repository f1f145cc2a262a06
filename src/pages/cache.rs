use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::pages::types::RenderedPage;

/// Append-only map of rasterized pages shared between the prefetch worker and
/// the renderer. Entries are never replaced or evicted within a session.
#[derive(Debug, Clone, Default)]
pub struct PageCache {
    pages: Arc<Mutex<HashMap<u32, Arc<RenderedPage>>>>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u32, Arc<RenderedPage>>> {
        // A panicked writer cannot leave a half-inserted entry behind.
        self.pages.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, page_number: u32) -> Option<Arc<RenderedPage>> {
        self.lock().get(&page_number).cloned()
    }

    pub fn contains(&self, page_number: u32) -> bool {
        self.lock().contains_key(&page_number)
    }

    /// Inserts `page` unless that page number is already cached; returns whether it was stored.
    pub fn insert(&self, page: RenderedPage) -> bool {
        let mut pages = self.lock();
        if pages.contains_key(&page.page_number) {
            return false;
        }
        pages.insert(page.page_number, Arc::new(page));
        true
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached page numbers in ascending order.
    pub fn page_numbers(&self) -> Vec<u32> {
        let mut numbers: Vec<u32> = self.lock().keys().copied().collect();
        numbers.sort_unstable();
        numbers
    }
}
