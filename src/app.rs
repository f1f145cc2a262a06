//! Headless host that wires the store, controller, render loop and page
//! prefetching together.
//!
//! Platform front ends feed device-space input into an [`Annotator`] and call
//! [`tick`](Annotator::tick) once per display refresh with a cairo context for
//! the visible surface.

use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::accel::AccelerationBoundary;
use crate::config::Config;
use crate::draw::{StrokeId, StrokeStore};
use crate::input::{InputState, Key, PageRequest, PointerEvent};
use crate::pages::{
    DocumentRef, ImageDirectoryProvider, PageCache, PageEvent, PageProvider, PrefetchQueue,
};
use crate::project::{self, BackgroundRef, ProjectFile, SaveReport};
use crate::render_loop::{FrameInput, RenderLoop};
use crate::util::ViewTransform;

pub struct Annotator {
    store: StrokeStore,
    input: InputState,
    render: RenderLoop,
    queue: PrefetchQueue,
    provider: Arc<dyn PageProvider>,
}

impl Annotator {
    /// Builds a host reading background pages from image directories.
    pub fn new(config: &Config, runtime_handle: &tokio::runtime::Handle) -> Result<Self> {
        Self::with_provider(config, runtime_handle, Arc::new(ImageDirectoryProvider::new()))
    }

    /// Builds a host around a custom page provider.
    ///
    /// The acceleration probe and the prefetch worker are started on
    /// `runtime_handle`; this call does not block on either.
    pub fn with_provider(
        config: &Config,
        runtime_handle: &tokio::runtime::Handle,
        provider: Arc<dyn PageProvider>,
    ) -> Result<Self> {
        let input = InputState::from_config(config)
            .map_err(|err| anyhow!("invalid keybindings: {err}"))?;
        let boundary = AccelerationBoundary::with_probe(
            config.font_descriptor(),
            runtime_handle,
            config.accel_settings(),
        );
        let queue = PrefetchQueue::new(
            runtime_handle,
            provider.clone(),
            PageCache::new(),
            config.prefetch_settings(),
        );

        Ok(Self {
            store: StrokeStore::with_history_limit(config.interaction.history_limit),
            input,
            render: RenderLoop::new(boundary, config.render_settings()),
            queue,
            provider,
        })
    }

    pub fn store(&self) -> &StrokeStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut StrokeStore {
        &mut self.store
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn render_loop(&self) -> &RenderLoop {
        &self.render
    }

    pub fn cache(&self) -> &PageCache {
        self.queue.cache()
    }

    pub fn document(&self) -> Option<&DocumentRef> {
        self.queue.document()
    }

    pub fn page(&self) -> u32 {
        self.input.page()
    }

    pub fn transform(&self) -> ViewTransform {
        self.input.transform
    }

    pub fn set_transform(&mut self, transform: ViewTransform) {
        self.input.transform = transform;
        self.render.mark_dirty();
    }

    /// Opens a background document and shows its first page.
    pub async fn open(&mut self, path: &Path) -> Result<DocumentRef> {
        let document = self
            .provider
            .open(path)
            .await
            .with_context(|| format!("failed to open document {}", path.display()))?;
        info!(
            "Opened {} ({} page(s))",
            document.path.display(),
            document.page_count()
        );
        self.queue.set_document(Some(document.clone()));
        let page = self.page().min(document.page_count()).max(1);
        self.show_page(page);
        Ok(document)
    }

    /// Drops the background document; annotations stay.
    pub fn close_document(&mut self) {
        self.queue.set_document(None);
        self.render.mark_dirty();
    }

    /// Switches to `page`, clamped to the open document. Without a document
    /// any page from 1 up is allowed. Returns the page now shown.
    pub fn go_to_page(&mut self, page: u32) -> u32 {
        let page = match self.queue.document() {
            Some(document) => page.clamp(1, document.page_count().max(1)),
            None => page.max(1),
        };
        self.show_page(page);
        page
    }

    pub fn next_page(&mut self) -> u32 {
        self.go_to_page(self.page().saturating_add(1))
    }

    pub fn previous_page(&mut self) -> u32 {
        self.go_to_page(self.page().saturating_sub(1))
    }

    fn show_page(&mut self, page: u32) {
        self.input.set_page(&mut self.store, page);
        let requested = self.queue.navigate(page);
        if !requested.is_empty() {
            debug!("Page {} prefetch requested {:?}", page, requested);
        }
        self.render.mark_dirty();
    }

    /// Sets the device surface size.
    pub fn resize(&mut self, width: i32, height: i32) {
        self.render.resize(width, height);
    }

    pub fn pointer_down(&mut self, event: PointerEvent) {
        let event = self.to_document(event);
        self.input.on_pointer_down(&mut self.store, &event);
        self.after_input();
    }

    pub fn pointer_move(&mut self, event: PointerEvent) {
        let event = self.to_document(event);
        self.input.on_pointer_move(&mut self.store, &event);
        self.after_input();
    }

    pub fn pointer_up(&mut self, event: PointerEvent) {
        let event = self.to_document(event);
        self.input.on_pointer_up(&mut self.store, &event);
        self.after_input();
    }

    pub fn pointer_cancel(&mut self) {
        self.input.on_pointer_cancel(&mut self.store);
        self.after_input();
    }

    pub fn key_press(&mut self, key: Key) {
        self.input.on_key_press(&mut self.store, key);
        match self.input.take_page_request() {
            Some(PageRequest::Next) => {
                self.next_page();
            }
            Some(PageRequest::Previous) => {
                self.previous_page();
            }
            None => {}
        }
        self.after_input();
    }

    pub fn key_release(&mut self, key: Key) {
        self.input.on_key_release(key);
    }

    /// Incoming pointer events are in device pixels; the controller works in
    /// document units.
    fn to_document(&self, event: PointerEvent) -> PointerEvent {
        let point = self.input.transform.to_document(event.point());
        PointerEvent {
            x: point.x,
            y: point.y,
            ..event
        }
    }

    fn after_input(&mut self) {
        if std::mem::take(&mut self.input.needs_redraw) {
            self.render.mark_dirty();
        }
        self.render.set_active(self.input.is_active());
    }

    /// Applies published page events without blocking.
    fn process_page_events(&mut self) {
        for event in self.queue.drain_events() {
            self.apply_page_event(event);
        }
    }

    fn apply_page_event(&mut self, event: PageEvent) {
        match event {
            PageEvent::Loaded { page_number } => {
                debug!("Page {} ready", page_number);
                if page_number == self.page() {
                    self.render.mark_dirty();
                }
            }
            PageEvent::Failed { page_number, error } => {
                warn!("Page {} could not be rendered: {}", page_number, error);
            }
        }
    }

    /// Waits until the current page's bitmap is cached, or `timeout` passes.
    ///
    /// Returns false when the page failed, timed out, or no document is open.
    pub async fn wait_for_page(&mut self, timeout: Duration) -> bool {
        let page = self.page();
        if self.queue.document().is_none() {
            return false;
        }
        let deadline = tokio::time::Instant::now() + timeout;
        while !self.queue.cache().contains(page) {
            let event = match tokio::time::timeout_at(deadline, self.queue.next_event()).await {
                Ok(Some(event)) => event,
                Ok(None) | Err(_) => return false,
            };
            let failed = matches!(event, PageEvent::Failed { page_number, .. } if page_number == page);
            self.apply_page_event(event);
            if failed {
                return false;
            }
        }
        true
    }

    /// One display refresh. Returns true when a frame was drawn onto `ctx`.
    pub fn tick(&mut self, now: Instant, ctx: &cairo::Context) -> bool {
        self.process_page_events();
        self.render.set_active(self.input.is_active());

        let overlays = self.input.overlays();
        let background = self.queue.cache().get(self.input.page());
        let frame = FrameInput {
            store: &self.store,
            page: self.input.page(),
            transform: self.input.transform,
            overlays: &overlays,
            background: background.as_ref(),
        };
        self.render.tick(now, ctx, &frame)
    }

    /// Draws the current page unconditionally, e.g. for export.
    pub fn render_now(&mut self, ctx: &cairo::Context) {
        self.process_page_events();
        self.sync();
        self.render.draw(Instant::now(), ctx);
    }

    fn sync(&mut self) {
        let overlays = self.input.overlays();
        let background = self.queue.cache().get(self.input.page());
        let frame = FrameInput {
            store: &self.store,
            page: self.input.page(),
            transform: self.input.transform,
            overlays: &overlays,
            background: background.as_ref(),
        };
        self.render.sync(&frame);
    }

    /// Topmost stroke under a device position on the current page.
    pub fn stroke_at(&mut self, x: f64, y: f64) -> Option<StrokeId> {
        self.sync();
        let radius = self.input.settings.hit_radius * self.input.transform.scale;
        self.render.hit_test_device(x, y, radius)
    }

    /// Replaces all strokes with the project's. Returns the background the
    /// project was made against, if any; opening it is left to the caller.
    pub fn load_project(&mut self, path: &Path) -> Result<Option<BackgroundRef>> {
        let project = project::load(path)?;
        info!(
            "Loaded project {} ({} strokes)",
            path.display(),
            project.strokes.len()
        );
        self.input.on_pointer_cancel(&mut self.store);
        self.store.replace_all(project.strokes);
        self.render.mark_dirty();
        Ok(project.background)
    }

    pub fn save_project(&self, path: &Path) -> Result<SaveReport> {
        let background = self.queue.document().map(|document| BackgroundRef {
            path: document.path.clone(),
            page_count: document.page_count(),
        });
        project::save(path, &ProjectFile::new(self.store.strokes().to_vec(), background))
    }
}
