//! Void Interaction - hand-driven VR object interaction
//!
//! Ties the physics core and the feedback dispatcher together behind one
//! engine: hand proxies follow tracked controllers, interaction verbs act
//! on objects, and every interaction emits the haptic pulse and highlight
//! configured for the object's category.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │               InteractionEngine                │
//! │  ┌──────────────┐ ┌─────────────┐ ┌──────────┐ │
//! │  │ PhysicsWorld │ │  Feedback   │ │ Perf     │ │
//! │  │ + hand proxy │ │ Dispatcher  │ │ Monitor  │ │
//! │  └──────────────┘ └─────────────┘ └──────────┘ │
//! └────────────────────────────────────────────────┘
//!          ▲                    │
//!   InteractionProfile          ▼
//!     (TOML presets)       FeedbackSink
//! ```
//!
//! # Example
//!
//! ```ignore
//! use void_interaction::prelude::*;
//!
//! let mut engine = InteractionEngine::new(load_profile("profile.toml")?)?;
//! engine.spawn_hand(Hand::Right, Transform::IDENTITY)?;
//! let door = engine.register_object(
//!     ObjectDesc::dynamic(CollisionShape::cuboid(0.4, 1.0, 0.05)),
//!     InteractionCategory::Door,
//! )?;
//!
//! engine.interact(door, Hand::Right, InteractionVerb::Open)?;
//! let report = engine.update(1.0 / 90.0);
//! ```

pub mod engine;
pub mod error;
pub mod monitor;
pub mod profile;

pub mod prelude {
    //! Common imports for interaction functionality
    pub use crate::engine::{FrameReport, Interaction, InteractionEngine, InteractionVerb};
    pub use crate::error::{InteractionError, ProfileError, ProfileResult, Result};
    pub use crate::monitor::{FrameCounts, PerformanceMetrics, PerformanceMonitor};
    pub use crate::profile::{
        load_profile, parse_profile, ComfortProfile, FeedbackPreset, HandSettings, InteractionCategory,
        InteractionProfile,
    };
    pub use void_feedback::prelude::*;
    pub use void_physics::prelude::*;
}

pub use prelude::*;
