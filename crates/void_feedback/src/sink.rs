//! Output sinks for dispatched feedback
//!
//! The dispatcher never talks to hardware. Whatever drives the controllers
//! and the renderer implements [`FeedbackSink`] and receives each entry as
//! it is forwarded.

use crate::haptic::HapticFeedback;
use crate::visual::VisualFeedback;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};

/// One forwarded entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeedbackEvent {
    Haptic(HapticFeedback),
    Visual(VisualFeedback),
}

/// Receiver of forwarded feedback
pub trait FeedbackSink {
    /// Called once per tick for every active haptic entry
    fn haptic(&mut self, feedback: &HapticFeedback);

    /// Called exactly once for every visual entry
    fn visual(&mut self, feedback: &VisualFeedback);
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl FeedbackSink for NullSink {
    fn haptic(&mut self, _feedback: &HapticFeedback) {}

    fn visual(&mut self, _feedback: &VisualFeedback) {}
}

/// Sink that buffers events for later inspection
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    /// Haptic entries forwarded so far
    pub haptics: Vec<HapticFeedback>,
    /// Visual entries forwarded so far
    pub visuals: Vec<VisualFeedback>,
}

impl CollectingSink {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all collected events
    pub fn clear(&mut self) {
        self.haptics.clear();
        self.visuals.clear();
    }

    /// Total number of buffered events
    pub fn len(&self) -> usize {
        self.haptics.len() + self.visuals.len()
    }

    /// Whether nothing has been collected
    pub fn is_empty(&self) -> bool {
        self.haptics.is_empty() && self.visuals.is_empty()
    }
}

impl FeedbackSink for CollectingSink {
    fn haptic(&mut self, feedback: &HapticFeedback) {
        self.haptics.push(*feedback);
    }

    fn visual(&mut self, feedback: &VisualFeedback) {
        self.visuals.push(*feedback);
    }
}

/// Sink that forwards events to another thread over a channel
///
/// Sends never block: when a bounded channel is full, or the receiver is
/// gone, the event is dropped and counted.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<FeedbackEvent>,
    dropped: u64,
}

impl ChannelSink {
    /// Channel holding at most `capacity` undelivered events
    pub fn bounded(capacity: usize) -> (Self, Receiver<FeedbackEvent>) {
        let (sender, receiver) = bounded(capacity);
        (Self { sender, dropped: 0 }, receiver)
    }

    /// Channel without a bound
    pub fn unbounded() -> (Self, Receiver<FeedbackEvent>) {
        let (sender, receiver) = unbounded();
        (Self { sender, dropped: 0 }, receiver)
    }

    /// Events that could not be delivered
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn send(&mut self, event: FeedbackEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
            }
            Err(TrySendError::Disconnected(_)) => {
                if self.dropped == 0 {
                    log::warn!("Feedback receiver disconnected, dropping events");
                }
                self.dropped += 1;
            }
        }
    }
}

impl FeedbackSink for ChannelSink {
    fn haptic(&mut self, feedback: &HapticFeedback) {
        self.send(FeedbackEvent::Haptic(*feedback));
    }

    fn visual(&mut self, feedback: &VisualFeedback) {
        self.send(FeedbackEvent::Visual(*feedback));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haptic::HapticCategory;
    use void_physics::Hand;

    #[test]
    fn test_channel_sink_delivers_and_counts_drops() {
        let (mut sink, receiver) = ChannelSink::bounded(1);
        let pulse = HapticFeedback::preset(Hand::Left, HapticCategory::Light);

        sink.haptic(&pulse);
        sink.haptic(&pulse);
        assert_eq!(receiver.try_recv(), Ok(FeedbackEvent::Haptic(pulse)));
        assert_eq!(sink.dropped(), 1);

        drop(receiver);
        sink.haptic(&pulse);
        assert_eq!(sink.dropped(), 2);
    }
}
