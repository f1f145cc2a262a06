//! Background page loading: provider trait, append-only cache and the
//! cancellable prefetch queue.

mod cache;
mod provider;
mod queue;
#[cfg(test)]
mod tests;
mod types;

pub use cache::PageCache;
pub use provider::{DEFAULT_TARGET_WIDTH, ImageDirectoryProvider, PageProvider, page_file};
pub use queue::{CancelToken, PrefetchQueue, PrefetchSettings};
pub use types::{DocumentRef, PageError, PageEvent, PageMeta, RenderedPage};
