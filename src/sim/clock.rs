//! Frame clock
//!
//! Turns monotonic frame timestamps into a clamped delta and the normalized
//! time scale used by every per-frame update.

use crate::consts::{BASELINE_FRAME_MS, MAX_FRAME_DELTA_MS};
use crate::time_scale;

/// Delta for one simulated frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStep {
    /// Wall-clock delta in milliseconds (clamped)
    pub dt_ms: f32,
    /// Normalized step (1.0 at 60 Hz)
    pub s: f32,
}

impl FrameStep {
    pub fn from_ms(dt_ms: f32) -> Self {
        let dt_ms = dt_ms.clamp(0.0, MAX_FRAME_DELTA_MS);
        Self {
            dt_ms,
            s: time_scale(dt_ms),
        }
    }

    /// A single 60 Hz frame
    pub fn baseline() -> Self {
        Self::from_ms(BASELINE_FRAME_MS)
    }
}

/// Tracks the previous frame timestamp
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_ms: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to `now_ms` and return the step since the previous call
    ///
    /// The first call after construction or [`FrameClock::reset`] yields a zero step.
    pub fn advance(&mut self, now_ms: f64) -> FrameStep {
        let dt = match self.last_ms {
            Some(last) => (now_ms - last).max(0.0) as f32,
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        FrameStep::from_ms(dt)
    }

    /// Forget the previous timestamp (used when resuming from pause or a new run)
    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}
