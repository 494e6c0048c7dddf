//! Surface materials for interactive props
//!
//! Two touching bodies mix their materials into one [`ContactMaterial`].
//! Each coefficient carries a [`MixMode`]; when the two sides disagree the
//! stronger mode wins (`Mean` < `Product` < `Greatest` < `Least`).

use serde::{Deserialize, Serialize};

/// How two coefficients are mixed at a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MixMode {
    #[default]
    Mean,
    Product,
    Greatest,
    Least,
}

impl MixMode {
    /// Apply the mode to a pair of coefficients
    pub fn apply(self, a: f32, b: f32) -> f32 {
        match self {
            MixMode::Mean => 0.5 * (a + b),
            MixMode::Product => a * b,
            MixMode::Greatest => a.max(b),
            MixMode::Least => a.min(b),
        }
    }
}

/// Coefficients in effect at one contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactMaterial {
    pub friction: f32,
    pub restitution: f32,
}

/// Surface description of a body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsMaterial {
    /// Coulomb friction coefficient in [0, 1]
    pub friction: f32,
    /// Fraction of approach speed returned on impact, in [0, 1]
    pub restitution: f32,
    /// kg/m³, read when a body derives its mass from its volume
    pub density: f32,
    pub friction_mix: MixMode,
    pub restitution_mix: MixMode,
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self::preset(0.5, 0.0, 1.0)
    }
}

impl PhysicsMaterial {
    const fn preset(friction: f32, restitution: f32, density: f32) -> Self {
        Self {
            friction,
            restitution,
            density,
            friction_mix: MixMode::Mean,
            restitution_mix: MixMode::Mean,
        }
    }

    /// Material with the given coefficients and unit density
    pub fn new(friction: f32, restitution: f32) -> Self {
        Self::default()
            .with_friction(friction)
            .with_restitution(restitution)
    }

    /// Balls and grips
    pub fn rubber() -> Self {
        Self::preset(0.8, 0.8, 1.1)
    }

    /// Tools, weapons, railings
    pub fn metal() -> Self {
        Self::preset(0.3, 0.2, 7.8)
    }

    /// Crates, doors, furniture
    pub fn wood() -> Self {
        Self::preset(0.5, 0.3, 0.6)
    }

    /// Bottles and panes; always bounce at least as hard as their partner
    pub fn glass() -> Self {
        Self {
            restitution_mix: MixMode::Greatest,
            ..Self::preset(0.2, 0.4, 2.5)
        }
    }

    /// Cushions and cloth; kill any bounce
    pub fn fabric() -> Self {
        Self {
            restitution_mix: MixMode::Least,
            ..Self::preset(0.9, 0.0, 0.3)
        }
    }

    /// Replace friction, ignoring non-finite input
    pub fn with_friction(mut self, friction: f32) -> Self {
        if friction.is_finite() {
            self.friction = friction.clamp(0.0, 1.0);
        }
        self
    }

    /// Replace restitution, ignoring non-finite input
    pub fn with_restitution(mut self, restitution: f32) -> Self {
        if restitution.is_finite() {
            self.restitution = restitution.clamp(0.0, 1.0);
        }
        self
    }

    /// Replace density, ignoring non-finite input
    pub fn with_density(mut self, density: f32) -> Self {
        if density.is_finite() {
            self.density = density.max(0.001);
        }
        self
    }

    /// Coefficients in effect when this surface touches `other`
    pub fn mix(&self, other: &PhysicsMaterial) -> ContactMaterial {
        let friction_mode = self.friction_mix.max(other.friction_mix);
        let restitution_mode = self.restitution_mix.max(other.restitution_mix);
        ContactMaterial {
            friction: friction_mode.apply(self.friction, other.friction),
            restitution: restitution_mode.apply(self.restitution, other.restitution),
        }
    }
}
