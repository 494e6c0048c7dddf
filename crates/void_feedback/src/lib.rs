//! Void Feedback - haptic and visual feedback dispatch
//!
//! Interaction code queues short haptic pulses per hand and one-shot
//! highlights per object. The frame loop ticks the dispatcher, which
//! forwards pending entries to whatever [`FeedbackSink`] drives the
//! controllers and renderer.
//!
//! ```text
//!  producers (any thread)          frame loop
//!  ──────────────────────          ──────────
//!  add_haptic_feedback ─┐
//!                       ├──► FeedbackDispatcher ──tick(dt)──► FeedbackSink
//!  add_visual_feedback ─┘    (bounded, oldest evicted)
//! ```

pub mod dispatcher;
pub mod haptic;
pub mod queue;
pub mod sink;
pub mod visual;

pub mod prelude {
    //! Common imports for feedback functionality
    pub use crate::dispatcher::{FeedbackConfig, FeedbackDispatcher, FeedbackStats, TickSummary};
    pub use crate::haptic::{HapticCategory, HapticFeedback};
    pub use crate::queue::BoundedQueue;
    pub use crate::sink::{ChannelSink, CollectingSink, FeedbackEvent, FeedbackSink, NullSink};
    pub use crate::visual::{colors, VisualFeedback};
}

pub use prelude::*;
