//! Per-frame performance tracking

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Weight kept from the previous average on each sample
const AVERAGE_RETAIN: f32 = 0.9;

/// Snapshot of engine performance
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Duration of the last update in seconds
    pub tick_time: f32,
    /// Longest update seen since the last reset
    pub peak_tick_time: f32,
    /// Moving average of collision detection time in seconds
    pub avg_collision_time: f32,
    pub active_objects: usize,
    pub active_constraints: usize,
    pub active_collisions: usize,
    /// Updates recorded since the last reset
    pub frames: u64,
    /// Updates that ran longer than the frame budget
    pub over_budget_frames: u64,
}

/// Counts sampled after an update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameCounts {
    pub objects: usize,
    pub constraints: usize,
    pub collisions: usize,
}

/// Tracks update timings against a frame budget
#[derive(Debug, Clone)]
pub struct PerformanceMonitor {
    budget: Duration,
    metrics: PerformanceMetrics,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(Duration::from_secs_f32(1.0 / 90.0))
    }
}

impl PerformanceMonitor {
    /// Create a monitor with the given per-frame budget
    pub fn new(budget: Duration) -> Self {
        Self {
            budget,
            metrics: PerformanceMetrics::default(),
        }
    }

    /// The frame budget
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Change the frame budget
    pub fn set_budget(&mut self, budget: Duration) {
        self.budget = budget;
    }

    /// Record one update.
    ///
    /// `collision_time` is `None` when no detector pass ran this frame; the
    /// collision average is then left alone.
    pub fn record(&mut self, tick: Duration, collision_time: Option<Duration>, counts: FrameCounts) {
        let m = &mut self.metrics;
        m.tick_time = tick.as_secs_f32();
        m.peak_tick_time = m.peak_tick_time.max(m.tick_time);
        if let Some(collision_time) = collision_time {
            m.avg_collision_time =
                m.avg_collision_time * AVERAGE_RETAIN + collision_time.as_secs_f32() * (1.0 - AVERAGE_RETAIN);
        }
        m.active_objects = counts.objects;
        m.active_constraints = counts.constraints;
        m.active_collisions = counts.collisions;
        m.frames += 1;

        if tick > self.budget {
            m.over_budget_frames += 1;
            log::trace!("Frame {} over budget: {:?} > {:?}", m.frames, tick, self.budget);
        }
    }

    /// Whether the last recorded update exceeded the budget
    pub fn last_over_budget(&self) -> bool {
        self.metrics.tick_time > self.budget.as_secs_f32()
    }

    /// Current metrics
    pub fn metrics(&self) -> PerformanceMetrics {
        self.metrics
    }

    /// Forget everything recorded
    pub fn reset(&mut self) {
        self.metrics = PerformanceMetrics::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_moving_average() {
        let mut monitor = PerformanceMonitor::default();
        let counts = FrameCounts::default();

        monitor.record(Duration::from_millis(1), Some(Duration::from_millis(10)), counts);
        assert_relative_eq!(monitor.metrics().avg_collision_time, 0.001, epsilon = 1e-6);

        monitor.record(Duration::from_millis(1), Some(Duration::from_millis(10)), counts);
        assert_relative_eq!(monitor.metrics().avg_collision_time, 0.0019, epsilon = 1e-6);
    }

    #[test]
    fn test_frame_without_detector_pass_keeps_average() {
        let mut monitor = PerformanceMonitor::default();
        let counts = FrameCounts::default();

        monitor.record(Duration::from_millis(1), Some(Duration::from_millis(10)), counts);
        monitor.record(Duration::from_millis(1), None, counts);
        monitor.record(Duration::from_millis(1), None, counts);

        let metrics = monitor.metrics();
        assert_relative_eq!(metrics.avg_collision_time, 0.001, epsilon = 1e-6);
        assert_eq!(metrics.frames, 3);
    }

    #[test]
    fn test_budget_and_peak() {
        let mut monitor = PerformanceMonitor::new(Duration::from_millis(5));
        let counts = FrameCounts {
            objects: 3,
            constraints: 1,
            collisions: 2,
        };

        monitor.record(Duration::from_millis(2), Some(Duration::ZERO), counts);
        monitor.record(Duration::from_millis(8), Some(Duration::ZERO), counts);
        monitor.record(Duration::from_millis(3), Some(Duration::ZERO), counts);

        let metrics = monitor.metrics();
        assert_eq!(metrics.frames, 3);
        assert_eq!(metrics.over_budget_frames, 1);
        assert_relative_eq!(metrics.peak_tick_time, 0.008, epsilon = 1e-6);
        assert_relative_eq!(metrics.tick_time, 0.003, epsilon = 1e-6);
        assert_eq!(metrics.active_collisions, 2);
        assert!(!monitor.last_over_budget());

        monitor.reset();
        assert_eq!(monitor.metrics(), PerformanceMetrics::default());
    }
}
