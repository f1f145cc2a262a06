//! Redraw scheduling for the render loop.
//!
//! Tracks whether composited output is stale and whether the user is in the
//! middle of a gesture, and decides per tick whether a frame should be drawn.

use std::time::{Duration, Instant};

/// Decides when the render loop repaints.
///
/// While `active` every tick redraws, so interaction never waits on the
/// throttle. Otherwise a frame is drawn only when `dirty` is set and at least
/// one frame interval has passed since the previous one.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    dirty: bool,
    active: bool,
    interval: Duration,
    last_frame: Option<Instant>,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new(60)
    }
}

impl FrameScheduler {
    /// Creates a scheduler targeting `target_fps` (clamped to 1..=240).
    ///
    /// Starts dirty so the first tick paints.
    pub fn new(target_fps: u32) -> Self {
        let fps = target_fps.clamp(1, 240);
        Self {
            dirty: true,
            active: false,
            interval: Duration::from_secs_f64(1.0 / fps as f64),
            last_frame: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether a frame should be drawn at `now`.
    pub fn should_redraw(&self, now: Instant) -> bool {
        if self.active {
            return true;
        }
        if !self.dirty {
            return false;
        }
        match self.last_frame {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    /// Records that a frame was drawn at `now` and clears the dirty flag.
    pub fn frame_drawn(&mut self, now: Instant) {
        self.dirty = false;
        self.last_frame = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_draws() {
        let scheduler = FrameScheduler::default();
        assert!(scheduler.should_redraw(Instant::now()));
    }

    #[test]
    fn idle_redraw_waits_for_interval_and_dirty() {
        let mut scheduler = FrameScheduler::new(60);
        let start = Instant::now();
        scheduler.frame_drawn(start);

        scheduler.mark_dirty();
        assert!(!scheduler.should_redraw(start + Duration::from_millis(5)));
        assert!(scheduler.should_redraw(start + Duration::from_millis(17)));

        scheduler.frame_drawn(start + Duration::from_millis(17));
        assert!(!scheduler.should_redraw(start + Duration::from_millis(100)));
    }

    #[test]
    fn active_always_redraws() {
        let mut scheduler = FrameScheduler::new(60);
        let start = Instant::now();
        scheduler.frame_drawn(start);
        scheduler.set_active(true);
        assert!(scheduler.should_redraw(start));
        assert!(scheduler.should_redraw(start + Duration::from_millis(1)));
    }

    #[test]
    fn interval_follows_target_rate() {
        assert_eq!(FrameScheduler::new(50).interval(), Duration::from_millis(20));
        assert_eq!(FrameScheduler::new(0).interval(), Duration::from_secs(1));
    }
}
