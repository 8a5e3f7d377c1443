//! Time management utilities

use std::time::{Duration, Instant};

/// Shortest delta handed to the UI; Dear ImGui asserts on a zero delta.
pub const MIN_DELTA: Duration = Duration::from_micros(100);

/// Frame timer
///
/// Tracks the delta between frames, a tick counter and a smoothed framerate
/// for on-screen display.
pub struct Timer {
    last_frame: Instant,
    delta: Duration,
    total_time: Duration,
    frame_count: u64,
    smoothed_fps: f32,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Weight of the newest sample in the smoothed framerate
    const SMOOTHING: f32 = 0.1;

    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta: Duration::ZERO,
            total_time: Duration::ZERO,
            frame_count: 0,
            smoothed_fps: 0.0,
        }
    }

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        let now = Instant::now();
        self.advance(now.duration_since(self.last_frame));
        self.last_frame = now;
    }

    /// Advance by an explicit delta
    pub fn advance(&mut self, elapsed: Duration) {
        self.delta = elapsed;
        self.total_time += elapsed;
        self.frame_count += 1;

        let secs = elapsed.as_secs_f32();
        if secs > 0.0 {
            let fps = 1.0 / secs;
            self.smoothed_fps = if self.smoothed_fps == 0.0 {
                fps
            } else {
                self.smoothed_fps + (fps - self.smoothed_fps) * Self::SMOOTHING
            };
        }
    }

    /// Time since the last frame
    pub const fn delta(&self) -> Duration {
        self.delta
    }

    /// Time since the last frame, never below [`MIN_DELTA`]
    pub fn ui_delta(&self) -> Duration {
        self.delta.max(MIN_DELTA)
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total_time.as_secs_f32()
    }

    /// Get the current frame count
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Smoothed frames per second
    pub const fn fps(&self) -> f32 {
        self.smoothed_fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_advance_counts_frames() {
        let mut timer = Timer::new();
        timer.advance(Duration::from_millis(10));
        timer.advance(Duration::from_millis(20));
        assert_eq!(timer.frame_count(), 2);
        assert_relative_eq!(timer.total_time(), 0.03, epsilon = 1e-6);
        assert_relative_eq!(timer.delta_time(), 0.02, epsilon = 1e-6);
    }

    #[test]
    fn test_first_sample_sets_fps() {
        let mut timer = Timer::new();
        timer.advance(Duration::from_millis(10));
        assert_relative_eq!(timer.fps(), 100.0, epsilon = 1e-3);
    }

    #[test]
    fn test_fps_is_smoothed() {
        let mut timer = Timer::new();
        timer.advance(Duration::from_millis(10));
        timer.advance(Duration::from_millis(20));
        // 100 + (50 - 100) * 0.1
        assert_relative_eq!(timer.fps(), 95.0, epsilon = 1e-3);
    }

    #[test]
    fn test_zero_delta_is_clamped_for_ui() {
        let mut timer = Timer::new();
        timer.advance(Duration::ZERO);
        assert_eq!(timer.ui_delta(), MIN_DELTA);
        assert_eq!(timer.fps(), 0.0);
    }
}
