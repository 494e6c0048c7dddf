//! Void Physics - VR interaction physics core
//!
//! Registry, collision detection and constrained rigid-body simulation for
//! hand/object manipulation, stepped deterministically every VR frame.
//!
//! # Features
//!
//! - Rigid bodies (static, dynamic, kinematic, trigger)
//! - Bounding-sphere collision detection with layer/mask gating
//! - Fixed-timestep integration with pluggable gravity models
//! - Hinge, ball-and-socket, slider and fixed constraints
//! - Raycasts and overlap queries
//! - Enter/stay/exit contact tracking
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 PhysicsWorld                    │
//! │  ┌──────────────┐  ┌────────────┐  ┌─────────┐  │
//! │  │ObjectRegistry│  │ Constraint │  │ Spatial │  │
//! │  │              │  │   Table    │  │  Query  │  │
//! │  └──────────────┘  └────────────┘  └─────────┘  │
//! │  ┌─────────────────────────────────────────────┐│
//! │  │           Simulator (fixed step)            ││
//! │  │  (integrate, constraints, detector)         ││
//! │  └─────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────┘
//!                        │
//!         ┌──────────────┼──────────────┐
//!         ▼              ▼              ▼
//!    ┌─────────┐   ┌──────────┐   ┌──────────┐
//!    │ Physics │   │Collision │   │ Contact  │
//!    │ Object  │   │ Result   │   │ Tracker  │
//!    └─────────┘   └──────────┘   └──────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use void_physics::prelude::*;
//!
//! let mut physics = PhysicsWorld::new(PhysicsConfig::vr())?;
//!
//! let crate_id = physics.create_object(
//!     ObjectDesc::dynamic(CollisionShape::cuboid(0.2, 0.2, 0.2))
//!         .with_position(Vec3::new(0.0, 1.0, -0.5)),
//! )?;
//!
//! physics.apply_impulse(crate_id, Vec3::new(0.0, 2.0, 0.0));
//! physics.advance(1.0 / 90.0);
//! ```

pub mod body;
pub mod collider;
pub mod config;
pub mod constraint;
pub mod detector;
pub mod error;
pub mod events;
pub mod layers;
pub mod material;
pub mod query;
pub mod registry;
pub mod simulator;
pub mod world;

pub mod prelude {
    //! Common imports for physics functionality
    pub use crate::body::{BodyKind, Hand, ObjectDesc, ObjectId, ObjectState, PhysicsObject, Transform, VrRole};
    pub use crate::collider::CollisionShape;
    pub use crate::config::{CapabilityFlags, GravityModel, PhysicsBackend, PhysicsConfig};
    pub use crate::constraint::{Constraint, ConstraintDesc, ConstraintId, ConstraintKind, ConstraintLimits};
    pub use crate::detector::{CollisionResult, CollisionType, DetectorStats};
    pub use crate::error::{PhysicsError, Result};
    pub use crate::events::{ContactEvent, ContactEventType, ContactTracker};
    pub use crate::layers::{CollisionGroups, CollisionLayer, LayerGating};
    pub use crate::material::{ContactMaterial, MixMode, PhysicsMaterial};
    pub use crate::query::{QueryFilter, RaycastHit, SpatialQuery};
    pub use crate::simulator::{BuiltinIntegrator, Integrator, StepReport};
    pub use crate::world::PhysicsWorld;
    pub use glam::{Quat, Vec3};
}

pub use prelude::*;
