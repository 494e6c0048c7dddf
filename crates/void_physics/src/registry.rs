//! Object registry
//!
//! The registry exclusively owns every [`PhysicsObject`]. Objects are kept
//! in a `BTreeMap` keyed by id, so every iteration (broad phase, step,
//! queries) visits bodies in ascending id order and two worlds fed the
//! same calls evolve identically.

use crate::body::{BodyKind, ObjectDesc, ObjectId, PhysicsObject, Transform, VrRole};
use crate::error::{PhysicsError, Result};
use glam::Vec3;
use std::collections::BTreeMap;

/// Store of interactive bodies keyed by id
#[derive(Debug, Clone)]
pub struct ObjectRegistry {
    objects: BTreeMap<ObjectId, PhysicsObject>,
    next_id: u64,
    default_linear_damping: f32,
    default_angular_damping: f32,
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectRegistry {
    /// Create an empty registry with zero default damping
    pub fn new() -> Self {
        Self::with_damping(0.0, 0.0)
    }

    /// Create an empty registry whose bodies default to the given damping
    pub fn with_damping(linear: f32, angular: f32) -> Self {
        Self {
            objects: BTreeMap::new(),
            next_id: 1,
            default_linear_damping: linear,
            default_angular_damping: angular,
        }
    }

    /// Register a body.
    ///
    /// Fails without registering anything when the shape is degenerate,
    /// the transform is not finite, or a dynamic body has no usable mass.
    pub fn register(&mut self, desc: ObjectDesc) -> Result<ObjectId> {
        desc.shape.validate()?;
        if !desc.transform.is_finite() {
            return Err(PhysicsError::NonFinite("transform"));
        }
        if !(desc.linear_velocity.is_finite() && desc.angular_velocity.is_finite()) {
            return Err(PhysicsError::NonFinite("velocity"));
        }
        if desc.transform.dominant_scale() <= 0.0 {
            return Err(PhysicsError::DegenerateShape("zero scale".to_string()));
        }
        if !desc.gravity_scale.is_finite() {
            return Err(PhysicsError::NonFinite("gravity scale"));
        }
        let material = desc.material;
        if !(material.friction.is_finite() && material.restitution.is_finite() && material.density.is_finite()) {
            return Err(PhysicsError::NonFinite("material"));
        }

        let mass = match desc.mass {
            Some(mass) => mass,
            None => desc.material.density * desc.shape.volume(),
        };
        if desc.kind.is_dynamic() && !(mass.is_finite() && mass > 0.0) {
            return Err(PhysicsError::InvalidMass(mass));
        }

        let id = ObjectId(self.next_id);
        self.next_id += 1;

        let object = PhysicsObject {
            id,
            kind: desc.kind,
            transform: desc.transform.normalized(),
            linear_velocity: desc.linear_velocity,
            angular_velocity: desc.angular_velocity,
            mass: if mass.is_finite() { mass.max(0.0) } else { 0.0 },
            shape: desc.shape,
            // Coefficients outside [0, 1] are clamped, density floors like `with_density`
            material: material
                .with_friction(material.friction)
                .with_restitution(material.restitution)
                .with_density(material.density),
            groups: desc.groups,
            active: desc.active,
            role: desc.role,
            gravity_enabled: desc.gravity_enabled,
            gravity_scale: desc.gravity_scale,
            linear_damping: non_negative(desc.linear_damping, self.default_linear_damping),
            angular_damping: non_negative(desc.angular_damping, self.default_angular_damping),
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
        };

        log::debug!(
            "Registered {:?} body {} ({}, mass {:.3})",
            object.kind,
            id,
            object.shape.name(),
            object.mass
        );
        self.objects.insert(id, object);
        Ok(id)
    }

    /// Overwrite transform and linear velocity of a body
    pub fn update(&mut self, id: ObjectId, transform: Transform, linear_velocity: Vec3) -> Result<()> {
        if !transform.is_finite() {
            return Err(PhysicsError::NonFinite("transform"));
        }
        if !linear_velocity.is_finite() {
            return Err(PhysicsError::NonFinite("velocity"));
        }
        let object = self.get_mut(id).ok_or(PhysicsError::ObjectNotFound(id))?;
        object.transform = transform.normalized();
        object.linear_velocity = linear_velocity;
        Ok(())
    }

    /// Remove a body, returning its final record
    pub fn remove(&mut self, id: ObjectId) -> Result<PhysicsObject> {
        let object = self.objects.remove(&id).ok_or(PhysicsError::ObjectNotFound(id))?;
        log::debug!("Removed body {}", id);
        Ok(object)
    }

    /// Get a body
    pub fn get(&self, id: ObjectId) -> Option<&PhysicsObject> {
        self.objects.get(&id)
    }

    /// Get a body mutably
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut PhysicsObject> {
        self.objects.get_mut(&id)
    }

    /// Whether a body with this id exists
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// All bodies in ascending id order
    pub fn query_all(&self) -> impl Iterator<Item = &PhysicsObject> {
        self.objects.values()
    }

    /// Bodies of one kind in ascending id order
    pub fn query_by_kind(&self, kind: BodyKind) -> impl Iterator<Item = &PhysicsObject> {
        self.objects.values().filter(move |o| o.kind == kind)
    }

    /// Bodies carrying a VR role
    pub fn query_by_role(&self, role: VrRole) -> impl Iterator<Item = &PhysicsObject> {
        self.objects.values().filter(move |o| o.role == Some(role))
    }

    /// Mutable iteration in ascending id order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PhysicsObject> {
        self.objects.values_mut()
    }

    /// Ids of active bodies in ascending order
    pub fn active_ids(&self) -> Vec<ObjectId> {
        self.objects
            .values()
            .filter(|o| o.active)
            .map(|o| o.id)
            .collect()
    }

    /// Enable or disable a body for detection and simulation
    pub fn set_active(&mut self, id: ObjectId, active: bool) -> Result<()> {
        let object = self.get_mut(id).ok_or(PhysicsError::ObjectNotFound(id))?;
        object.active = active;
        Ok(())
    }

    /// Number of registered bodies
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Number of active bodies
    pub fn active_count(&self) -> usize {
        self.objects.values().filter(|o| o.active).count()
    }
}

fn non_negative(value: Option<f32>, fallback: f32) -> f32 {
    match value {
        Some(v) if v.is_finite() => v.max(0.0),
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collider::CollisionShape;
    use crate::material::PhysicsMaterial;

    fn sphere() -> ObjectDesc {
        ObjectDesc::dynamic(CollisionShape::sphere(0.5))
    }

    #[test]
    fn test_register_roundtrip() {
        let mut registry = ObjectRegistry::new();
        let transform = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        let id = registry
            .register(ObjectDesc::fixed(CollisionShape::cuboid(1.0, 1.0, 1.0)).with_transform(transform))
            .unwrap();

        let object = registry.get(id).unwrap();
        assert_eq!(object.kind, BodyKind::Static);
        assert_eq!(object.transform, transform);
        assert!(id.is_valid());
    }

    #[test]
    fn test_ids_monotonic_and_not_reused() {
        let mut registry = ObjectRegistry::new();
        let a = registry.register(sphere()).unwrap();
        registry.remove(a).unwrap();
        let b = registry.register(sphere()).unwrap();
        assert!(b > a);
    }

    #[test]
    fn test_rejects_degenerate_input() {
        let mut registry = ObjectRegistry::new();
        assert!(matches!(
            registry.register(ObjectDesc::dynamic(CollisionShape::sphere(0.0))),
            Err(PhysicsError::DegenerateShape(_))
        ));
        assert!(matches!(
            registry.register(sphere().with_mass(0.0)),
            Err(PhysicsError::InvalidMass(_))
        ));
        assert!(registry
            .register(sphere().with_transform(Transform::IDENTITY.with_scale(Vec3::ZERO)))
            .is_err());
        assert!(registry.is_empty());

        // Static bodies need no mass
        assert!(registry
            .register(ObjectDesc::fixed(CollisionShape::sphere(1.0)).with_mass(0.0))
            .is_ok());
    }

    #[test]
    fn test_rejects_non_finite_gravity_scale() {
        let mut registry = ObjectRegistry::new();
        assert_eq!(
            registry.register(sphere().with_gravity_scale(f32::NAN)),
            Err(PhysicsError::NonFinite("gravity scale"))
        );
        assert!(registry.register(sphere().with_gravity_scale(f32::INFINITY)).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_rejects_non_finite_material() {
        let mut registry = ObjectRegistry::new();
        let broken = [
            PhysicsMaterial { friction: f32::NAN, ..Default::default() },
            PhysicsMaterial { restitution: f32::NAN, ..Default::default() },
            PhysicsMaterial { density: f32::INFINITY, ..Default::default() },
        ];
        for material in broken {
            assert_eq!(
                registry.register(sphere().with_material(material)),
                Err(PhysicsError::NonFinite("material"))
            );
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_material_clamped_into_range() {
        let mut registry = ObjectRegistry::new();
        let id = registry
            .register(sphere().with_material(PhysicsMaterial {
                friction: 3.0,
                restitution: -0.5,
                density: -1.0,
                ..Default::default()
            }))
            .unwrap();

        let material = registry.get(id).unwrap().material;
        assert_eq!(material.friction, 1.0);
        assert_eq!(material.restitution, 0.0);
        assert!(material.density > 0.0);
    }

    #[test]
    fn test_non_finite_damping_falls_back() {
        let mut registry = ObjectRegistry::with_damping(0.1, 0.2);
        let id = registry
            .register(sphere().with_damping(f32::NAN, f32::INFINITY))
            .unwrap();
        let object = registry.get(id).unwrap();
        assert_eq!(object.linear_damping, 0.1);
        assert_eq!(object.angular_damping, 0.2);
    }

    #[test]
    fn test_unknown_ids_fail() {
        let mut registry = ObjectRegistry::new();
        let ghost = ObjectId::from_raw(42);
        assert_eq!(
            registry.update(ghost, Transform::IDENTITY, Vec3::ZERO),
            Err(PhysicsError::ObjectNotFound(ghost))
        );
        assert!(registry.remove(ghost).is_err());
        assert!(registry.set_active(ghost, false).is_err());
    }

    #[test]
    fn test_queries() {
        let mut registry = ObjectRegistry::new();
        let hand = registry
            .register(ObjectDesc::kinematic(CollisionShape::sphere(0.05)).with_role(VrRole::Controller(1)))
            .unwrap();
        registry.register(sphere()).unwrap();
        registry.register(sphere()).unwrap();

        assert_eq!(registry.query_by_kind(BodyKind::Dynamic).count(), 2);
        let hands: Vec<_> = registry.query_by_role(VrRole::Controller(1)).map(|o| o.id).collect();
        assert_eq!(hands, vec![hand]);

        registry.set_active(hand, false).unwrap();
        assert_eq!(registry.active_count(), 2);
    }

    #[test]
    fn test_density_mass() {
        let mut registry = ObjectRegistry::new();
        let id = registry
            .register(ObjectDesc::dynamic(CollisionShape::cuboid(0.5, 0.5, 0.5)).with_density_mass())
            .unwrap();
        // Unit cube at density 1
        assert!((registry.get(id).unwrap().mass - 1.0).abs() < 1e-6);
    }
}
