//! Physics configuration

use crate::error::{PhysicsError, Result};
use crate::layers::LayerGating;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// How gravity acts on dynamic bodies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum GravityModel {
    /// No gravity at all
    None,
    /// Constant acceleration vector
    Uniform { acceleration: Vec3 },
    /// Constant acceleration along a direction (normalized on use)
    Directional { direction: Vec3, strength: f32 },
    /// Acceleration toward a point
    Radial { center: Vec3, strength: f32 },
}

impl Default for GravityModel {
    fn default() -> Self {
        Self::Uniform {
            acceleration: Vec3::new(0.0, -9.81, 0.0),
        }
    }
}

impl GravityModel {
    /// Earth gravity along -Y
    pub fn earth() -> Self {
        Self::default()
    }

    /// Gravitational acceleration experienced at `position`.
    ///
    /// Degenerate inputs (zero direction, body sitting on the radial
    /// center) yield zero acceleration.
    pub fn acceleration_at(&self, position: Vec3) -> Vec3 {
        match *self {
            Self::None => Vec3::ZERO,
            Self::Uniform { acceleration } => acceleration,
            Self::Directional { direction, strength } => {
                direction.normalize_or_zero() * strength
            }
            Self::Radial { center, strength } => {
                (center - position).normalize_or_zero() * strength
            }
        }
    }

    fn is_finite(&self) -> bool {
        match *self {
            Self::None => true,
            Self::Uniform { acceleration } => acceleration.is_finite(),
            Self::Directional { direction, strength } => direction.is_finite() && strength.is_finite(),
            Self::Radial { center, strength } => center.is_finite() && strength.is_finite(),
        }
    }
}

/// Simulation backend selection tag
///
/// Only the built-in integrator ships with the core. Other tags are
/// accepted so per-title configuration can name them, and resolve to the
/// built-in integrator at world creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhysicsBackend {
    /// Built-in explicit Euler integrator
    Builtin,
    /// Bullet physics
    Bullet,
    /// NVIDIA PhysX
    Physx,
    /// Pick the best available backend
    #[default]
    Auto,
}

impl std::fmt::Display for PhysicsBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Builtin => write!(f, "builtin"),
            Self::Bullet => write!(f, "bullet"),
            Self::Physx => write!(f, "physx"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

impl std::str::FromStr for PhysicsBackend {
    type Err = PhysicsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "builtin" | "native" => Ok(Self::Builtin),
            "bullet" => Ok(Self::Bullet),
            "physx" => Ok(Self::Physx),
            "auto" | "" => Ok(Self::Auto),
            _ => Err(PhysicsError::InvalidConfig(format!("Unknown physics backend: {}", s))),
        }
    }
}

/// Advanced simulation capabilities
///
/// These are reported to callers only. The core never simulates soft
/// bodies, fluids, cloth or particles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CapabilityFlags {
    pub soft_body: bool,
    pub fluid: bool,
    pub cloth: bool,
    pub particles: bool,
}

/// Physics world configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity model (default: uniform -9.81 in Y)
    pub gravity: GravityModel,

    /// Fixed timestep for physics simulation
    pub timestep: f32,

    /// Maximum number of fixed steps per `advance` call.
    ///
    /// Whole steps beyond the bound are dropped, not deferred. The default
    /// covers one second at the default timestep; the VR and fast presets
    /// drop earlier.
    pub max_substeps: u32,

    /// Maximum number of entries in the active collision list
    pub max_collisions: usize,

    /// Slack added to bounding-sphere overlap tests
    pub collision_tolerance: f32,

    /// Direction of the layer/mask gate
    pub layer_gating: LayerGating,

    /// Default linear damping for new bodies
    pub linear_damping: f32,

    /// Default angular damping for new bodies
    pub angular_damping: f32,

    /// Proportional gain of the constraint resolver, in (0, 1]
    pub constraint_gain: f32,

    /// Separate penetrating bodies after each step
    pub collision_response: bool,

    /// Fraction of penetration resolved per step when response is enabled
    pub response_strength: f32,

    /// Simulation backend tag
    pub backend: PhysicsBackend,

    /// Advanced capability flags
    pub capabilities: CapabilityFlags,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: GravityModel::default(),
            timestep: 1.0 / 60.0,
            max_substeps: 60,
            max_collisions: 1000,
            collision_tolerance: 0.001,
            layer_gating: LayerGating::Symmetric,
            linear_damping: 0.0,
            angular_damping: 0.0,
            constraint_gain: 0.5,
            collision_response: false,
            response_strength: 0.5,
            backend: PhysicsBackend::Auto,
            capabilities: CapabilityFlags::default(),
        }
    }
}

impl PhysicsConfig {
    /// Configuration tuned for a 90 Hz headset
    pub fn vr() -> Self {
        Self {
            timestep: 1.0 / 90.0,
            max_substeps: 10,
            collision_tolerance: 0.01,
            ..Default::default()
        }
    }

    /// Create a configuration for high-precision simulation
    pub fn high_precision() -> Self {
        Self {
            timestep: 1.0 / 120.0,
            max_substeps: 8,
            constraint_gain: 0.8,
            collision_response: true,
            ..Default::default()
        }
    }

    /// Create a configuration for fast simulation (lower quality)
    pub fn fast() -> Self {
        Self {
            max_substeps: 2,
            max_collisions: 64,
            constraint_gain: 0.3,
            ..Default::default()
        }
    }

    /// Set gravity model
    pub fn with_gravity(mut self, gravity: GravityModel) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set timestep
    pub fn with_timestep(mut self, timestep: f32) -> Self {
        self.timestep = timestep;
        self
    }

    /// Set the substep bound
    pub fn with_max_substeps(mut self, max_substeps: u32) -> Self {
        self.max_substeps = max_substeps;
        self
    }

    /// Set the active collision cap
    pub fn with_max_collisions(mut self, max_collisions: usize) -> Self {
        self.max_collisions = max_collisions;
        self
    }

    /// Set the layer gating direction
    pub fn with_layer_gating(mut self, gating: LayerGating) -> Self {
        self.layer_gating = gating;
        self
    }

    /// Enable or disable collision response
    pub fn with_collision_response(mut self, enabled: bool) -> Self {
        self.collision_response = enabled;
        self
    }

    /// Set the backend tag
    pub fn with_backend(mut self, backend: PhysicsBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Check ranges before a world is built from this configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.timestep.is_finite() && self.timestep > 0.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "timestep must be positive, got {}",
                self.timestep
            )));
        }
        if self.max_substeps == 0 {
            return Err(PhysicsError::InvalidConfig("max_substeps must be at least 1".into()));
        }
        if !(self.constraint_gain > 0.0 && self.constraint_gain <= 1.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "constraint_gain must be in (0, 1], got {}",
                self.constraint_gain
            )));
        }
        if !(0.0..=1.0).contains(&self.response_strength) {
            return Err(PhysicsError::InvalidConfig(format!(
                "response_strength must be in [0, 1], got {}",
                self.response_strength
            )));
        }
        if !self.gravity.is_finite() {
            return Err(PhysicsError::InvalidConfig("gravity must be finite".into()));
        }
        if self.linear_damping < 0.0 || self.angular_damping < 0.0 || self.collision_tolerance < 0.0 {
            return Err(PhysicsError::InvalidConfig(
                "damping and tolerance must be non-negative".into(),
            ));
        }
        Ok(())
    }
}
