#[cfg(not(target_arch = "wasm32"))]
pub use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
pub use web_time::{Duration, Instant};

use crate::renderer::governor::FrameSample;

/// Measures the time between consecutive display callbacks.
///
/// Each [`tick_at`](Self::tick_at) closes the previous frame and yields its
/// [`FrameSample`]. The first tick only establishes the baseline.
pub struct FrameTimer {
    start_time: Option<Instant>,
    last_tick: Option<Instant>,
    /// Duration of the last completed frame
    pub delta: Duration,
    /// Total number of completed frames
    pub frame_count: u64,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTimer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            start_time: None,
            last_tick: None,
            delta: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Ticks with the current wall-clock time.
    pub fn tick(&mut self) -> Option<FrameSample> {
        self.tick_at(Instant::now())
    }

    /// Ticks at an explicit timestamp.
    pub fn tick_at(&mut self, now: Instant) -> Option<FrameSample> {
        if self.start_time.is_none() {
            self.start_time = Some(now);
        }

        let previous = self.last_tick.replace(now)?;
        self.delta = now.saturating_duration_since(previous);
        self.frame_count += 1;

        Some(FrameSample {
            timestamp: now,
            duration: self.delta,
        })
    }

    /// Time since the first tick.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        match (self.start_time, self.last_tick) {
            (Some(start), Some(last)) => last.saturating_duration_since(start),
            _ => Duration::ZERO,
        }
    }
}
