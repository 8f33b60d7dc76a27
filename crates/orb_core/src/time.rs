//! Bounded-cadence tick driver.
//!
//! The host calls `tick(now_ms)` once per display refresh. The driver turns
//! host timestamps into a clamped elapsed time for the simulation: never more
//! than `max_step_ms` per tick, and nothing at all while stopped or hidden.
//! Hiding the stage stops the driver outright, so coming back never delivers
//! one huge catch-up tick.

const FPS_SAMPLE_COUNT: usize = 60;

/// Default per-tick ceiling: one 60 Hz frame.
pub const DEFAULT_MAX_STEP_MS: f64 = 1000.0 / 60.0;

pub struct TickDriver {
    pub max_step_ms: f64,
    running: bool,
    last_time_ms: f64,
    pub tick_count: u64,
    pub total_time_ms: f64,
    pub clamped_ticks: u64,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl TickDriver {
    pub fn new(max_step_ms: f64) -> Self {
        Self {
            max_step_ms,
            running: false,
            last_time_ms: 0.0,
            tick_count: 0,
            total_time_ms: 0.0,
            clamped_ticks: 0,
            fps_samples: [DEFAULT_MAX_STEP_MS; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 60.0,
            smoothed_frame_time_ms: DEFAULT_MAX_STEP_MS,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start delivering ticks, measuring from `now_ms`.
    pub fn run(&mut self, now_ms: f64) {
        self.running = true;
        self.last_time_ms = now_ms;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Visibility changes pause and resume the driver.
    pub fn set_visible(&mut self, visible: bool, now_ms: f64) {
        if visible {
            if !self.running {
                self.run(now_ms);
            }
        } else {
            self.stop();
        }
    }

    /// Returns the clamped elapsed time for this tick, or `None` while stopped.
    pub fn tick(&mut self, now_ms: f64) -> Option<f64> {
        if !self.running {
            return None;
        }

        let raw = (now_ms - self.last_time_ms).max(0.0);
        self.last_time_ms = now_ms;

        let dt = if raw > self.max_step_ms {
            log::debug!(
                "Tick took {:.1}ms, clamping to {:.1}ms",
                raw,
                self.max_step_ms
            );
            self.clamped_ticks += 1;
            self.max_step_ms
        } else {
            raw
        };

        self.tick_count += 1;
        self.total_time_ms += dt;

        self.fps_samples[self.fps_sample_index] = raw;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_ms: f64 = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_ms;
        self.smoothed_fps = if avg_ms > 0.0 { 1000.0 / avg_ms } else { 0.0 };

        Some(dt)
    }
}

impl Default for TickDriver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STEP_MS)
    }
}
