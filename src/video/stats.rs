//! Frame rate measurement.

// ============================================================================
// Imports
// ============================================================================

use std::time::{Duration, Instant};

// ============================================================================
// Constants
// ============================================================================

/// Length of one measurement window.
pub const FPS_WINDOW: Duration = Duration::from_millis(1000);

// ============================================================================
// FrameStats
// ============================================================================

/// Rolling frame counter.
///
/// Every frame increments the counter. Once the window reaches
/// [`FPS_WINDOW`], the rate `count * 1000 / elapsed_ms` is reported and both
/// counter and window restart.
#[derive(Debug, Clone, Copy)]
pub struct FrameStats {
    frame_count: u32,
    window_start: Instant,
}

impl FrameStats {
    /// Starts a window now.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Starts a window at `start`.
    #[inline]
    #[must_use]
    pub const fn starting_at(start: Instant) -> Self {
        Self {
            frame_count: 0,
            window_start: start,
        }
    }

    /// Records a frame received at `now`.
    ///
    /// Returns the frame rate when this frame closes a window.
    pub fn record(&mut self, now: Instant) -> Option<f64> {
        self.frame_count += 1;

        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < FPS_WINDOW {
            return None;
        }

        let fps = f64::from(self.frame_count) * 1000.0 / (elapsed.as_secs_f64() * 1000.0);
        self.frame_count = 0;
        self.window_start = now;
        Some(fps)
    }

    /// Returns frames counted in the current window.
    #[inline]
    #[must_use]
    pub const fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Returns when the current window started.
    #[inline]
    #[must_use]
    pub const fn window_start(&self) -> Instant {
        self.window_start
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_thirty_frames_over_one_second() {
        let start = Instant::now();
        let mut stats = FrameStats::starting_at(start);

        let mut reports = Vec::new();
        for i in 1..=30u64 {
            let at = start + Duration::from_micros(i * 1_000_000 / 30);
            if let Some(fps) = stats.record(at) {
                reports.push(fps);
            }
        }

        assert_eq!(reports.len(), 1);
        assert!((reports[0] - 30.0).abs() < 1e-6);
        assert_eq!(stats.frame_count(), 0);
    }

    #[test]
    fn test_no_report_inside_window() {
        let start = Instant::now();
        let mut stats = FrameStats::starting_at(start);

        assert_eq!(stats.record(start + Duration::from_millis(500)), None);
        assert_eq!(stats.record(start + Duration::from_millis(999)), None);
        assert_eq!(stats.frame_count(), 2);
    }

    #[test]
    fn test_window_restarts_at_report() {
        let start = Instant::now();
        let mut stats = FrameStats::starting_at(start);
        let report_at = start + Duration::from_millis(2000);

        let fps = stats.record(report_at).expect("report");
        assert!((fps - 0.5).abs() < 1e-9);
        assert_eq!(stats.window_start(), report_at);
    }

    proptest! {
        #[test]
        fn prop_even_delivery_reports_rate(rate in 1u64..240) {
            let start = Instant::now();
            let mut stats = FrameStats::starting_at(start);
            let mut report = None;

            for i in 1..=rate {
                let at = start + Duration::from_nanos(i * 1_000_000_000 / rate);
                if let Some(fps) = stats.record(at) {
                    report = Some(fps);
                }
            }

            let fps = report.expect("window closed on last frame");
            prop_assert!((fps - rate as f64).abs() < 1e-6);
        }
    }
}
