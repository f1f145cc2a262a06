use log::{info, warn};
use tokio::sync::oneshot::{self, error::TryRecvError};

use super::cached::CachedAccelerator;
use super::probe::{AccelSettings, Capabilities, probe};
use super::software::SoftwareAccelerator;
use super::{AccelError, Accelerator, Scene, replay_scene};
use crate::draw::{FontDescriptor, Point, Stroke, StrokeId, SymbolPreview};

type ProbeResult = Result<Capabilities, AccelError>;

/// Owns the active [`Accelerator`] and upgrades it when the probe resolves.
///
/// Until then every call goes to the software implementation; the probe is
/// polled without blocking from [`poll`](Self::poll), once per frame.
pub struct AccelerationBoundary {
    active: Box<dyn Accelerator>,
    pending: Option<oneshot::Receiver<ProbeResult>>,
    font: FontDescriptor,
}

impl AccelerationBoundary {
    /// Software only; no probe is started.
    pub fn software(font: FontDescriptor) -> Self {
        Self {
            active: Box::new(SoftwareAccelerator::new(font.clone())),
            pending: None,
            font,
        }
    }

    /// Starts the probe on `runtime_handle` and returns immediately.
    pub fn with_probe(
        font: FontDescriptor,
        runtime_handle: &tokio::runtime::Handle,
        settings: AccelSettings,
    ) -> Self {
        let (tx, rx) = oneshot::channel();
        runtime_handle.spawn(async move {
            let _ = tx.send(probe(settings).await);
        });
        Self {
            pending: Some(rx),
            ..Self::software(font)
        }
    }

    pub fn is_accelerated(&self) -> bool {
        self.active.name() != "software"
    }

    pub fn probe_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Checks the probe; on success swaps in the cached implementation and
    /// replays the current scene into it. Returns true when a swap happened.
    pub fn poll(&mut self) -> bool {
        let Some(rx) = self.pending.as_mut() else {
            return false;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Closed) => {
                self.pending = None;
                warn!("Acceleration probe ended without a result");
                return false;
            }
        };
        self.pending = None;

        match result {
            Ok(caps) => self.install(caps),
            Err(err) => {
                info!("Staying on software rendering: {}", err);
                false
            }
        }
    }

    /// Replaces the software path with a [`CachedAccelerator`] built from `caps`.
    pub fn install(&mut self, caps: Capabilities) -> bool {
        let scene = self.active.scene().clone();
        let mut cached = CachedAccelerator::new(caps, self.font.clone());
        if scene.width > 0 && scene.height > 0 {
            if let Err(err) = cached.create_surface(scene.width, scene.height) {
                info!("Staying on software rendering: {}", err);
                return false;
            }
        }
        replay_scene(&mut cached, &scene);
        info!("Switched to {} rendering", cached.name());
        self.active = Box::new(cached);
        true
    }
}

impl Accelerator for AccelerationBoundary {
    fn name(&self) -> &'static str {
        self.active.name()
    }

    fn create_surface(&mut self, width: i32, height: i32) -> Result<(), AccelError> {
        self.active.create_surface(width, height)
    }

    fn resize(&mut self, width: i32, height: i32) {
        self.active.resize(width, height);
    }

    fn load_strokes(&mut self, strokes: Vec<Stroke>) {
        self.active.load_strokes(strokes);
    }

    fn set_transient_stroke(&mut self, stroke: Option<Stroke>) {
        self.active.set_transient_stroke(stroke);
    }

    fn set_shape_preview(&mut self, preview: Option<Stroke>) {
        self.active.set_shape_preview(preview);
    }

    fn set_symbol_preview(&mut self, preview: Option<SymbolPreview>) {
        self.active.set_symbol_preview(preview);
    }

    fn set_rubber_band(&mut self, band: Option<(Point, Point)>) {
        self.active.set_rubber_band(band);
    }

    fn set_selection(&mut self, ids: &[StrokeId]) {
        self.active.set_selection(ids);
    }

    fn record_frame(&mut self, time_ms: f64) {
        self.active.record_frame(time_ms);
    }

    fn fps(&self) -> f64 {
        self.active.fps()
    }

    fn render(&mut self, ctx: &cairo::Context, has_background: bool) {
        self.active.render(ctx, has_background);
    }

    fn hit_test(&self, x: f64, y: f64, radius: f64) -> Option<StrokeId> {
        self.active.hit_test(x, y, radius)
    }

    fn simplify(&self, points: &[Point], tolerance: f64) -> Vec<Point> {
        self.active.simplify(points, tolerance)
    }

    fn scene(&self) -> &Scene {
        self.active.scene()
    }
}
