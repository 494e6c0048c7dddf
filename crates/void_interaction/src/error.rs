//! Interaction error types

use thiserror::Error;
use void_physics::{Hand, ObjectId, PhysicsError};

/// Errors from interaction requests
#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),

    #[error("No hand proxy spawned for {0:?}")]
    HandNotSpawned(Hand),

    #[error("Interaction needs a single hand, got {0:?}")]
    AmbiguousHand(Hand),

    #[error("Object {object} is out of reach of the {hand:?} hand")]
    OutOfReach { object: ObjectId, hand: Hand },

    #[error("Object {0} is static and cannot be grabbed")]
    NotGrabbable(ObjectId),

    #[error("The {hand:?} hand is already holding {held}")]
    HandOccupied { hand: Hand, held: ObjectId },

    #[error("Object {object} is already held by the {hand:?} hand")]
    AlreadyHeld { object: ObjectId, hand: Hand },

    #[error("The {0:?} hand is not holding anything")]
    NothingHeld(Hand),

    #[error("The {hand:?} hand is not holding {object}")]
    NotHolding { hand: Hand, object: ObjectId },

    #[error("Hand proxies cannot be interacted with: {0}")]
    HandProxy(ObjectId),

    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),
}

/// Errors from loading interaction profiles
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unknown interaction category: {0}")]
    UnknownCategory(String),

    #[error("Unknown haptic category: {0}")]
    UnknownHaptic(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type for interaction operations
pub type Result<T> = std::result::Result<T, InteractionError>;

/// Result type for profile operations
pub type ProfileResult<T> = std::result::Result<T, ProfileError>;
