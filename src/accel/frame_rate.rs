use std::collections::VecDeque;

const WINDOW: usize = 30;
const MIN_SAMPLES: usize = 5;
const MAX_FPS: f64 = 144.0;

/// Rolling frame-rate estimate over the last 30 frame deltas.
#[derive(Debug, Clone, Default)]
pub struct FrameRate {
    last: Option<f64>,
    deltas: VecDeque<f64>,
}

impl FrameRate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a frame timestamp in milliseconds.
    ///
    /// Deltas outside (0, 1000) ms are dropped (clock jumps, long idle gaps).
    pub fn record(&mut self, time_ms: f64) {
        if let Some(last) = self.last {
            let delta = time_ms - last;
            if delta > 0.0 && delta < 1000.0 {
                self.deltas.push_back(delta);
                if self.deltas.len() > WINDOW {
                    self.deltas.pop_front();
                }
            }
        }
        self.last = Some(time_ms);
    }

    /// Smoothed FPS, or 0 until enough frames have been seen.
    pub fn fps(&self) -> f64 {
        if self.deltas.len() < MIN_SAMPLES {
            return 0.0;
        }
        let avg = self.deltas.iter().sum::<f64>() / self.deltas.len() as f64;
        if avg > 0.0 { (1000.0 / avg).min(MAX_FPS) } else { 0.0 }
    }

    pub fn reset(&mut self) {
        self.last = None;
        self.deltas.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_five_samples() {
        let mut rate = FrameRate::new();
        for i in 0..5 {
            rate.record(i as f64 * 16.0);
        }
        assert_eq!(rate.fps(), 0.0);
        rate.record(80.0);
        assert!((rate.fps() - 62.5).abs() < 1e-9);
    }

    #[test]
    fn caps_at_144_and_ignores_gaps() {
        let mut rate = FrameRate::new();
        let mut t = 0.0;
        for _ in 0..10 {
            t += 1.0;
            rate.record(t);
        }
        assert_eq!(rate.fps(), 144.0);

        let mut rate = FrameRate::new();
        for t in [0.0, 5000.0, 5020.0, 5040.0, 5040.0, 5060.0, 5080.0, 5100.0] {
            rate.record(t);
        }
        // Only the five 20 ms deltas count.
        assert!((rate.fps() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn window_keeps_latest_thirty() {
        let mut rate = FrameRate::new();
        let mut t = 0.0;
        for _ in 0..40 {
            t += 100.0;
            rate.record(t);
        }
        for _ in 0..30 {
            t += 10.0;
            rate.record(t);
        }
        assert!((rate.fps() - 100.0).abs() < 1e-9);
    }
}
