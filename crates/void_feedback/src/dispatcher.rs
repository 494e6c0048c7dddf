//! Feedback dispatcher - bounded haptic and visual queues
//!
//! Producers on any thread push entries; once per frame the owner calls
//! [`FeedbackDispatcher::tick`] to forward them into a sink. Each queue
//! has its own lock, and no lock is held while the sink runs.

use crate::haptic::HapticFeedback;
use crate::queue::BoundedQueue;
use crate::sink::FeedbackSink;
use crate::visual::VisualFeedback;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use void_physics::{Hand, ObjectId};

/// Configuration for the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Maximum pending haptic entries
    pub haptic_capacity: usize,
    /// Maximum pending visual entries
    pub visual_capacity: usize,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            haptic_capacity: 100,
            visual_capacity: 100,
        }
    }
}

/// Statistics about dispatcher usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackStats {
    /// Haptic entries queued
    pub haptic_queued: u64,
    /// Haptic entries evicted at capacity
    pub haptic_evicted: u64,
    /// Haptic forwards (one per entry per tick)
    pub haptic_forwarded: u64,
    /// Haptic entries that ran out their duration
    pub haptic_expired: u64,
    /// Visual entries queued
    pub visual_queued: u64,
    /// Visual entries evicted at capacity
    pub visual_evicted: u64,
    /// Visual entries forwarded
    pub visual_forwarded: u64,
    /// Ticks processed
    pub ticks: u64,
}

/// What one tick forwarded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub haptic_forwarded: usize,
    pub haptic_expired: usize,
    pub visual_forwarded: usize,
}

/// The central feedback dispatcher
pub struct FeedbackDispatcher {
    config: FeedbackConfig,
    haptic: Mutex<BoundedQueue<HapticFeedback>>,
    visual: Mutex<BoundedQueue<VisualFeedback>>,
    stats: Mutex<FeedbackStats>,
}

impl Default for FeedbackDispatcher {
    fn default() -> Self {
        Self::new(FeedbackConfig::default())
    }
}

impl std::fmt::Debug for FeedbackDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedbackDispatcher")
            .field("config", &self.config)
            .field("haptic_pending", &self.haptic_len())
            .field("visual_pending", &self.visual_len())
            .finish()
    }
}

impl FeedbackDispatcher {
    /// Create a new dispatcher
    pub fn new(config: FeedbackConfig) -> Self {
        Self {
            config,
            haptic: Mutex::new(BoundedQueue::new(config.haptic_capacity)),
            visual: Mutex::new(BoundedQueue::new(config.visual_capacity)),
            stats: Mutex::new(FeedbackStats::default()),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &FeedbackConfig {
        &self.config
    }

    /// Queue a haptic pulse, evicting the oldest pending one at capacity
    pub fn add_haptic_feedback(&self, feedback: HapticFeedback) {
        let evicted = self.haptic.lock().push(feedback).is_some();
        let mut stats = self.stats.lock();
        stats.haptic_queued += 1;
        if evicted {
            stats.haptic_evicted += 1;
        }
    }

    /// Queue a highlight, evicting the oldest pending one at capacity
    pub fn add_visual_feedback(&self, feedback: VisualFeedback) {
        let evicted = self.visual.lock().push(feedback).is_some();
        let mut stats = self.stats.lock();
        stats.visual_queued += 1;
        if evicted {
            stats.visual_evicted += 1;
        }
    }

    /// Remove pending pulses for `hand` (every pulse for `Hand::Both`)
    pub fn clear_haptic_feedback(&self, hand: Hand) -> usize {
        self.haptic.lock().retain(|h| !h.hand.matches(hand))
    }

    /// Remove pending highlights for `object`
    pub fn clear_visual_feedback(&self, object: ObjectId) -> usize {
        self.visual.lock().retain(|v| v.object != object)
    }

    /// Forward pending feedback into `sink`.
    ///
    /// Every active pulse is forwarded, then its remaining duration drops
    /// by `dt` and pulses at or below zero are removed. Highlights are
    /// forwarded once and removed.
    pub fn tick(&self, dt: f32, sink: &mut dyn FeedbackSink) -> TickSummary {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        let (haptics, expired) = {
            let mut queue = self.haptic.lock();
            let snapshot: Vec<HapticFeedback> = queue.iter().filter(|h| h.active).copied().collect();
            for pulse in queue.iter_mut() {
                pulse.remaining -= dt;
            }
            let expired = queue.retain(|h| h.active && h.remaining > 0.0);
            (snapshot, expired)
        };
        let visuals: Vec<VisualFeedback> = self.visual.lock().drain().filter(|v| v.active).collect();

        for pulse in &haptics {
            sink.haptic(pulse);
        }
        for highlight in &visuals {
            sink.visual(highlight);
        }

        let summary = TickSummary {
            haptic_forwarded: haptics.len(),
            haptic_expired: expired,
            visual_forwarded: visuals.len(),
        };

        let mut stats = self.stats.lock();
        stats.haptic_forwarded += summary.haptic_forwarded as u64;
        stats.haptic_expired += summary.haptic_expired as u64;
        stats.visual_forwarded += summary.visual_forwarded as u64;
        stats.ticks += 1;

        summary
    }

    /// Pending pulses, oldest first
    pub fn pending_haptics(&self) -> Vec<HapticFeedback> {
        self.haptic.lock().iter().copied().collect()
    }

    /// Pending highlights, oldest first
    pub fn pending_visuals(&self) -> Vec<VisualFeedback> {
        self.visual.lock().iter().copied().collect()
    }

    /// Number of pending pulses
    pub fn haptic_len(&self) -> usize {
        self.haptic.lock().len()
    }

    /// Number of pending highlights
    pub fn visual_len(&self) -> usize {
        self.visual.lock().len()
    }

    /// Get statistics
    pub fn stats(&self) -> FeedbackStats {
        *self.stats.lock()
    }

    /// Drop everything pending
    pub fn clear(&self) {
        self.haptic.lock().clear();
        self.visual.lock().clear();
    }
}
