//! Interactive bodies and their descriptions

use crate::collider::CollisionShape;
use crate::layers::CollisionGroups;
use crate::material::PhysicsMaterial;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Opaque handle to a body in the registry
///
/// Ids are handed out monotonically starting at 1 and never reused while
/// the registry lives. `ObjectId::INVALID` (0) is never returned by
/// registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub(crate) u64);

impl ObjectId {
    /// The invalid sentinel
    pub const INVALID: Self = Self(0);

    /// Wrap a raw value, e.g. one received from a caller across an FFI or log
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value
    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// Whether this is the invalid sentinel
    pub const fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a body participates in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyKind {
    /// Never moves, infinite mass
    Static,
    /// Fully simulated
    #[default]
    Dynamic,
    /// Driven externally (hand tracking), integrates its own velocity only
    Kinematic,
    /// Overlap volume that never moves and never gets pushed
    Trigger,
}

impl BodyKind {
    /// Whether gravity, forces and impulses act on this kind
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic)
    }

    /// Whether the integrator moves this kind at all
    pub fn moves(&self) -> bool {
        matches!(self, Self::Dynamic | Self::Kinematic)
    }
}

/// Position, rotation and scale of a body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// Identity transform
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Identity rotation and scale at `position`
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Set rotation
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Largest absolute scale component
    pub fn dominant_scale(&self) -> f32 {
        self.scale.abs().max_element()
    }

    /// Rigid transform of a local point into world space (scale ignored)
    pub fn point_to_world(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    /// Rigid transform of a world point into the local frame (scale ignored)
    pub fn point_to_local(&self, world: Vec3) -> Vec3 {
        self.rotation.inverse() * (world - self.position)
    }

    /// Copy with a unit rotation (identity if the rotation is degenerate)
    pub fn normalized(mut self) -> Self {
        self.rotation = if self.rotation.length_squared() > f32::EPSILON {
            self.rotation.normalize()
        } else {
            Quat::IDENTITY
        };
        self
    }

    /// Whether every component is finite
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite() && self.scale.is_finite()
    }
}

/// Left or right hand, or both when clearing feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Left,
    Right,
    Both,
}

impl Hand {
    /// Map a controller index to a hand (0 = left, 1 = right)
    pub fn from_controller_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::Left),
            1 => Some(Self::Right),
            _ => None,
        }
    }

    /// Controller index for a single hand
    pub fn controller_index(&self) -> Option<u32> {
        match self {
            Self::Left => Some(0),
            Self::Right => Some(1),
            Self::Both => None,
        }
    }

    /// Whether an entry tagged `self` is covered by a request for `other`
    pub fn matches(&self, other: Hand) -> bool {
        other == Hand::Both || *self == other
    }
}

/// VR tracking role of a proxy body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", content = "index", rename_all = "snake_case")]
pub enum VrRole {
    Controller(u32),
    Headset,
    BodyProxy(u32),
}

impl VrRole {
    /// Whether this role is a hand controller
    pub fn is_controller(&self) -> bool {
        matches!(self, Self::Controller(_))
    }

    /// Hand for a controller role
    pub fn hand(&self) -> Option<Hand> {
        match *self {
            Self::Controller(index) => Hand::from_controller_index(index),
            _ => None,
        }
    }
}

/// Description for registering a body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectDesc {
    pub kind: BodyKind,
    pub transform: Transform,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Mass in kg; `None` derives it from material density and shape volume
    pub mass: Option<f32>,
    pub shape: CollisionShape,
    pub material: PhysicsMaterial,
    pub groups: CollisionGroups,
    pub role: Option<VrRole>,
    pub gravity_enabled: bool,
    pub gravity_scale: f32,
    /// Falls back to the world default when unset
    pub linear_damping: Option<f32>,
    /// Falls back to the world default when unset
    pub angular_damping: Option<f32>,
    pub active: bool,
}

impl Default for ObjectDesc {
    fn default() -> Self {
        Self {
            kind: BodyKind::Dynamic,
            transform: Transform::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass: Some(1.0),
            shape: CollisionShape::default(),
            material: PhysicsMaterial::default(),
            groups: CollisionGroups::ALL,
            role: None,
            gravity_enabled: true,
            gravity_scale: 1.0,
            linear_damping: None,
            angular_damping: None,
            active: true,
        }
    }
}

impl ObjectDesc {
    /// Dynamic body with the given shape
    pub fn dynamic(shape: CollisionShape) -> Self {
        Self {
            shape,
            ..Default::default()
        }
    }

    /// Static body with the given shape
    pub fn fixed(shape: CollisionShape) -> Self {
        Self {
            kind: BodyKind::Static,
            shape,
            ..Default::default()
        }
    }

    /// Kinematic body with the given shape
    pub fn kinematic(shape: CollisionShape) -> Self {
        Self {
            kind: BodyKind::Kinematic,
            shape,
            ..Default::default()
        }
    }

    /// Trigger volume with the given shape
    pub fn trigger(shape: CollisionShape) -> Self {
        Self {
            kind: BodyKind::Trigger,
            shape,
            ..Default::default()
        }
    }

    /// Set position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    /// Set full transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Set linear velocity
    pub fn with_linear_velocity(mut self, velocity: Vec3) -> Self {
        self.linear_velocity = velocity;
        self
    }

    /// Set mass
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = Some(mass);
        self
    }

    /// Derive mass from material density
    pub fn with_density_mass(mut self) -> Self {
        self.mass = None;
        self
    }

    /// Set material
    pub fn with_material(mut self, material: PhysicsMaterial) -> Self {
        self.material = material;
        self
    }

    /// Set collision groups
    pub fn with_groups(mut self, groups: CollisionGroups) -> Self {
        self.groups = groups;
        self
    }

    /// Tag with a VR role
    pub fn with_role(mut self, role: VrRole) -> Self {
        self.role = Some(role);
        self
    }

    /// Enable or disable gravity
    pub fn with_gravity(mut self, enabled: bool) -> Self {
        self.gravity_enabled = enabled;
        self
    }

    /// Set gravity scale
    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    /// Set damping
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = Some(linear);
        self.angular_damping = Some(angular);
        self
    }
}

/// A registered body
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsObject {
    pub id: ObjectId,
    pub kind: BodyKind,
    pub transform: Transform,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub mass: f32,
    pub shape: CollisionShape,
    pub material: PhysicsMaterial,
    pub groups: CollisionGroups,
    pub active: bool,
    pub role: Option<VrRole>,
    pub gravity_enabled: bool,
    pub gravity_scale: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Force accumulated since the last step
    pub force: Vec3,
    /// Torque accumulated since the last step
    pub torque: Vec3,
}

impl PhysicsObject {
    /// Bounding radius of the shape times the dominant scale
    pub fn effective_radius(&self) -> f32 {
        self.shape.bounding_radius() * self.transform.dominant_scale()
    }

    /// Inverse mass; zero for anything that is not dynamic
    pub fn inverse_mass(&self) -> f32 {
        if self.kind.is_dynamic() && self.mass > 0.0 {
            1.0 / self.mass
        } else {
            0.0
        }
    }

    /// Scalar moment of inertia of the bounding sphere (0.4·m·r²)
    pub fn inertia(&self) -> f32 {
        let r = self.effective_radius();
        0.4 * self.mass * r * r
    }

    /// Inverse scalar inertia; zero for anything that is not dynamic
    pub fn inverse_inertia(&self) -> f32 {
        let inertia = self.inertia();
        if self.kind.is_dynamic() && inertia > 0.0 {
            1.0 / inertia
        } else {
            0.0
        }
    }

    /// Whether this body is a hand controller proxy
    pub fn is_controller(&self) -> bool {
        self.role.map_or(false, |r| r.is_controller())
    }

    /// Hand of a controller proxy
    pub fn hand(&self) -> Option<Hand> {
        self.role.and_then(|r| r.hand())
    }

    /// Friction read from the material
    pub fn friction(&self) -> f32 {
        self.material.friction
    }

    /// Restitution read from the material
    pub fn restitution(&self) -> f32 {
        self.material.restitution
    }

    /// Snapshot for callers outside the registry
    pub fn state(&self) -> ObjectState {
        ObjectState {
            id: self.id,
            kind: self.kind,
            transform: self.transform,
            linear_velocity: self.linear_velocity,
            angular_velocity: self.angular_velocity,
            active: self.active,
        }
    }
}

/// Copyable body state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectState {
    pub id: ObjectId,
    pub kind: BodyKind,
    pub transform: Transform,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_hand_from_controller() {
        assert_eq!(VrRole::Controller(0).hand(), Some(Hand::Left));
        assert_eq!(VrRole::Controller(1).hand(), Some(Hand::Right));
        assert_eq!(VrRole::Controller(7).hand(), None);
        assert_eq!(VrRole::Headset.hand(), None);
    }

    #[test]
    fn test_hand_matches() {
        assert!(Hand::Left.matches(Hand::Both));
        assert!(Hand::Left.matches(Hand::Left));
        assert!(!Hand::Left.matches(Hand::Right));
    }

    #[test]
    fn test_dominant_scale() {
        let t = Transform::IDENTITY.with_scale(Vec3::new(1.0, -3.0, 2.0));
        assert_relative_eq!(t.dominant_scale(), 3.0);
    }

    #[test]
    fn test_local_world_roundtrip() {
        let t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0))
            .with_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        let world = Vec3::new(2.0, 2.0, 3.0);
        let back = t.point_to_world(t.point_to_local(world));
        assert_relative_eq!(back.x, world.x, epsilon = 1e-5);
        assert_relative_eq!(back.z, world.z, epsilon = 1e-5);
    }

    #[test]
    fn test_object_id_sentinel() {
        assert!(!ObjectId::INVALID.is_valid());
        assert_eq!(ObjectId::from_raw(5).to_string(), "#5");
    }
}
