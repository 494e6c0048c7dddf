//! Error types for the physics core

use crate::body::ObjectId;
use crate::constraint::{ConstraintId, ConstraintKind};
use thiserror::Error;

/// Physics core errors
///
/// None of these are fatal: every failing operation leaves the world
/// untouched and the caller is free to retry on the next frame.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    /// Object not found in the registry
    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// Constraint not found in the constraint table
    #[error("Constraint not found: {0}")]
    ConstraintNotFound(ConstraintId),

    /// Shape with zero, negative or non-finite extents
    #[error("Degenerate collision shape: {0}")]
    DegenerateShape(String),

    /// Dynamic body without a usable mass
    #[error("Invalid mass {0}: dynamic bodies need a positive, finite mass")]
    InvalidMass(f32),

    /// Constraint axis that cannot be normalized
    #[error("Constraint axis must be finite and non-zero")]
    ZeroLengthAxis,

    /// Constraint whose two ends are the same object
    #[error("Constraint cannot attach object {0} to itself")]
    SelfConstraint(ObjectId),

    /// Limits with min > max or non-finite bounds
    #[error("Invalid constraint limits [{min}, {max}]")]
    InvalidLimits { min: f32, max: f32 },

    /// Limits given to a constraint kind that has no free coordinate
    #[error("{0:?} constraints do not take limits")]
    LimitsUnsupported(ConstraintKind),

    /// NaN or infinite transform or velocity
    #[error("Non-finite {0}")]
    NonFinite(&'static str),

    /// Invalid configuration
    #[error("Invalid physics configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for physics operations
pub type Result<T> = std::result::Result<T, PhysicsError>;
