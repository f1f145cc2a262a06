//! Per-frame draw cycle.
//!
//! Each tick polls the acceleration probe, mirrors store and interaction state
//! into the active accelerator when it changed, and redraws when the
//! [`FrameScheduler`] allows it. Compositing order is fixed: background bitmap,
//! page base, committed strokes, then overlays.

use std::sync::Arc;
use std::time::Instant;

use log::debug;

use crate::accel::{AccelerationBoundary, Accelerator};
use crate::draw::{BackgroundLayer, FrameScheduler, Point, Stroke, StrokeStore, SymbolPreview};
use crate::pages::RenderedPage;
use crate::util::ViewTransform;

/// Transient, uncommitted visuals produced by the interaction controller, in
/// document coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlays {
    pub transient: Option<Stroke>,
    pub shape_preview: Option<Stroke>,
    pub symbol_preview: Option<SymbolPreview>,
    pub rubber_band: Option<(Point, Point)>,
}

impl Overlays {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn to_device(&self, transform: &ViewTransform) -> Overlays {
        Overlays {
            transient: self.transient.as_ref().map(|s| transform.stroke_to_device(s)),
            shape_preview: self
                .shape_preview
                .as_ref()
                .map(|s| transform.stroke_to_device(s)),
            symbol_preview: self.symbol_preview.as_ref().map(|p| SymbolPreview {
                start: transform.to_device(p.start),
                end: transform.to_device(p.end),
                ..p.clone()
            }),
            rubber_band: self
                .rubber_band
                .map(|(a, b)| (transform.to_device(a), transform.to_device(b))),
        }
    }
}

/// Displayed frame rate that only moves when the measurement drifts past a threshold.
#[derive(Debug, Clone)]
pub struct FpsReadout {
    shown: f64,
    threshold: f64,
}

impl FpsReadout {
    pub fn new(threshold: f64) -> Self {
        Self {
            shown: 0.0,
            threshold: threshold.max(0.0),
        }
    }

    /// Feeds a fresh measurement; returns true when the displayed value changed.
    pub fn update(&mut self, fps: f64) -> bool {
        if (fps - self.shown).abs() > self.threshold {
            self.shown = fps;
            true
        } else {
            false
        }
    }

    pub fn value(&self) -> f64 {
        self.shown
    }

    /// Rounded value for display.
    pub fn label(&self) -> String {
        format!("{:.0} fps", self.shown)
    }
}

/// Render loop tuning, from the `performance` config section.
#[derive(Debug, Clone, Copy)]
pub struct RenderSettings {
    pub target_fps: u32,
    pub fps_threshold: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            target_fps: 60,
            fps_threshold: 2.0,
        }
    }
}

/// Read-only view of everything a frame depends on.
pub struct FrameInput<'a> {
    pub store: &'a StrokeStore,
    pub page: u32,
    pub transform: ViewTransform,
    pub overlays: &'a Overlays,
    pub background: Option<&'a Arc<RenderedPage>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SyncKey {
    revision: u64,
    page: u32,
    transform: ViewTransform,
}

pub struct RenderLoop {
    boundary: AccelerationBoundary,
    scheduler: FrameScheduler,
    background: BackgroundLayer,
    readout: FpsReadout,
    synced: Option<SyncKey>,
    synced_overlays: Option<(Overlays, ViewTransform)>,
    width: i32,
    height: i32,
    epoch: Instant,
    frames: u64,
}

impl RenderLoop {
    pub fn new(boundary: AccelerationBoundary, settings: RenderSettings) -> Self {
        Self {
            boundary,
            scheduler: FrameScheduler::new(settings.target_fps),
            background: BackgroundLayer::new(),
            readout: FpsReadout::new(settings.fps_threshold),
            synced: None,
            synced_overlays: None,
            width: 0,
            height: 0,
            epoch: Instant::now(),
            frames: 0,
        }
    }

    /// Sets the device surface size.
    pub fn resize(&mut self, width: i32, height: i32) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.boundary.resize(width, height);
        self.scheduler.mark_dirty();
    }

    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    /// True while the user is drawing, panning, dragging or resizing.
    pub fn set_active(&mut self, active: bool) {
        self.scheduler.set_active(active);
    }

    pub fn mark_dirty(&mut self) {
        self.scheduler.mark_dirty();
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn boundary(&self) -> &AccelerationBoundary {
        &self.boundary
    }

    pub fn boundary_mut(&mut self) -> &mut AccelerationBoundary {
        &mut self.boundary
    }

    pub fn fps_readout(&self) -> &FpsReadout {
        &self.readout
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Topmost stroke at a device position, as last synced.
    pub fn hit_test_device(&self, x: f64, y: f64, radius: f64) -> Option<crate::draw::StrokeId> {
        self.boundary.hit_test(x, y, radius)
    }

    /// Mirrors `frame` into the accelerator and background layer, marking the
    /// scheduler dirty when anything visible changed.
    pub fn sync(&mut self, frame: &FrameInput<'_>) {
        if self.boundary.poll() {
            self.scheduler.mark_dirty();
        }

        let key = SyncKey {
            revision: frame.store.revision(),
            page: frame.page,
            transform: frame.transform,
        };
        if self.synced != Some(key) {
            let strokes: Vec<Stroke> = frame
                .store
                .page_strokes(frame.page)
                .map(|s| frame.transform.stroke_to_device(s))
                .collect();
            debug!(
                "Syncing {} stroke(s) for page {} (revision {})",
                strokes.len(),
                frame.page,
                key.revision
            );
            self.boundary.load_strokes(strokes);
            self.boundary.set_selection(frame.store.selected_ids());
            self.synced = Some(key);
            self.scheduler.mark_dirty();
        }

        let overlays_stale = match &self.synced_overlays {
            Some((overlays, transform)) => {
                overlays != frame.overlays || *transform != frame.transform
            }
            None => true,
        };
        if overlays_stale {
            let device = frame.overlays.to_device(&frame.transform);
            self.boundary.set_transient_stroke(device.transient);
            self.boundary.set_shape_preview(device.shape_preview);
            self.boundary.set_symbol_preview(device.symbol_preview);
            self.boundary.set_rubber_band(device.rubber_band);
            self.synced_overlays = Some((frame.overlays.clone(), frame.transform));
            self.scheduler.mark_dirty();
        }

        let had_background = self.background.has_background();
        let rebuilt = self.background.update(
            frame.background,
            frame.transform,
            self.width,
            self.height,
        );
        if rebuilt || had_background != self.background.has_background() {
            self.scheduler.mark_dirty();
        }
    }

    /// Runs one tick; returns true when a frame was drawn onto `ctx`.
    pub fn tick(&mut self, now: Instant, ctx: &cairo::Context, frame: &FrameInput<'_>) -> bool {
        self.sync(frame);
        if !self.scheduler.should_redraw(now) {
            return false;
        }
        self.draw(now, ctx);
        true
    }

    /// Draws unconditionally (exports, first paint).
    pub fn draw(&mut self, now: Instant, ctx: &cairo::Context) {
        let has_background = self.background.paint(ctx);
        self.boundary.render(ctx, has_background);

        let time_ms = now.saturating_duration_since(self.epoch).as_secs_f64() * 1000.0;
        self.boundary.record_frame(time_ms);
        self.readout.update(self.boundary.fps());
        self.scheduler.frame_drawn(now);
        self.frames += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::{FontDescriptor, ShapeType, StrokeDraft, StrokeKind};
    use std::time::Duration;

    fn render_loop() -> RenderLoop {
        let mut rl = RenderLoop::new(
            AccelerationBoundary::software(FontDescriptor::default()),
            RenderSettings::default(),
        );
        rl.resize(120, 100);
        rl
    }

    fn surface() -> (cairo::ImageSurface, cairo::Context) {
        let surface = cairo::ImageSurface::create(cairo::Format::ARgb32, 120, 100).unwrap();
        let ctx = cairo::Context::new(&surface).unwrap();
        (surface, ctx)
    }

    fn frame<'a>(store: &'a StrokeStore, overlays: &'a Overlays, page: u32) -> FrameInput<'a> {
        FrameInput {
            store,
            page,
            transform: ViewTransform::identity(),
            overlays,
            background: None,
        }
    }

    #[test]
    fn fps_readout_ignores_small_changes() {
        let mut readout = FpsReadout::new(2.0);
        assert!(readout.update(60.0));
        assert!(!readout.update(61.5));
        assert!(!readout.update(58.0));
        assert!(readout.update(57.9));
        assert_eq!(readout.value(), 57.9);
        assert_eq!(readout.label(), "58 fps");
    }

    #[test]
    fn idle_loop_skips_redundant_frames() {
        let mut rl = render_loop();
        let (_s, ctx) = surface();
        let store = StrokeStore::new();
        let overlays = Overlays::default();
        let start = Instant::now();

        assert!(rl.tick(start, &ctx, &frame(&store, &overlays, 1)));
        // Nothing changed: no redraw even after the interval.
        assert!(!rl.tick(start + Duration::from_millis(50), &ctx, &frame(&store, &overlays, 1)));
        assert_eq!(rl.frames(), 1);
    }

    #[test]
    fn store_changes_trigger_sync_and_redraw() {
        let mut rl = render_loop();
        let (_s, ctx) = surface();
        let mut store = StrokeStore::new();
        let overlays = Overlays::default();
        let start = Instant::now();
        rl.tick(start, &ctx, &frame(&store, &overlays, 1));

        store.add_stroke(StrokeDraft::new(
            StrokeKind::shape(ShapeType::Rectangle),
            vec![Point::new(10.0, 10.0), Point::new(40.0, 40.0)],
            1,
        ));
        store.add_stroke(StrokeDraft::new(
            StrokeKind::pen(),
            vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)],
            2,
        ));
        // Throttled until a frame interval has elapsed.
        assert!(!rl.tick(start + Duration::from_millis(2), &ctx, &frame(&store, &overlays, 1)));
        assert!(rl.tick(start + Duration::from_millis(20), &ctx, &frame(&store, &overlays, 1)));
        assert_eq!(rl.boundary().scene().strokes.len(), 1);
        assert!(rl.hit_test_device(20.0, 20.0, 0.0).is_some());
    }

    #[test]
    fn active_interaction_redraws_every_tick() {
        let mut rl = render_loop();
        let (_s, ctx) = surface();
        let store = StrokeStore::new();
        let overlays = Overlays::default();
        let start = Instant::now();
        rl.tick(start, &ctx, &frame(&store, &overlays, 1));

        rl.set_active(true);
        assert!(rl.tick(start + Duration::from_millis(1), &ctx, &frame(&store, &overlays, 1)));
        assert!(rl.tick(start + Duration::from_millis(2), &ctx, &frame(&store, &overlays, 1)));
    }

    #[test]
    fn overlays_are_converted_to_device_space() {
        let mut rl = render_loop();
        let (_s, ctx) = surface();
        let store = StrokeStore::new();
        let overlays = Overlays {
            rubber_band: Some((Point::new(1.0, 2.0), Point::new(10.0, 20.0))),
            ..Default::default()
        };
        let input = FrameInput {
            store: &store,
            page: 1,
            transform: ViewTransform {
                scale: 2.0,
                offset_x: 5.0,
                offset_y: 0.0,
            },
            overlays: &overlays,
            background: None,
        };
        rl.tick(Instant::now(), &ctx, &input);
        assert_eq!(
            rl.boundary().scene().rubber_band,
            Some((Point::new(7.0, 4.0), Point::new(25.0, 40.0)))
        );
    }

    #[test]
    fn page_switch_resyncs_strokes() {
        let mut rl = render_loop();
        let (_s, ctx) = surface();
        let mut store = StrokeStore::new();
        store.add_stroke(StrokeDraft::new(
            StrokeKind::pen(),
            vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)],
            2,
        ));
        let overlays = Overlays::default();
        let start = Instant::now();
        rl.tick(start, &ctx, &frame(&store, &overlays, 1));
        assert!(rl.boundary().scene().strokes.is_empty());

        rl.tick(start + Duration::from_millis(40), &ctx, &frame(&store, &overlays, 2));
        assert_eq!(rl.boundary().scene().strokes.len(), 1);
    }
}
