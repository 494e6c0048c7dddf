//! Constraints between pairs of bodies
//!
//! Constraints refer to their bodies by id only. Every step they are
//! resolved against the registry again, and a constraint whose body has
//! disappeared is deactivated instead of dangling.
//!
//! Correction is proportional: each step closes a fixed fraction (the
//! gain) of the remaining error. Hand-driven interaction forces are low
//! energy, so this converges in a handful of frames without an iterative
//! solver.

use crate::body::{ObjectId, PhysicsObject};
use crate::error::{PhysicsError, Result};
use crate::registry::ObjectRegistry;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f32::consts::PI;

/// Handle to a constraint in the constraint table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConstraintId(pub(crate) u64);

impl ConstraintId {
    /// Wrap a raw value
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Type of constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// Rotation about one axis, anchors pinned together
    Hinge,
    /// Anchors pinned together, free rotation
    BallSocket,
    /// Translation along one axis
    Slider,
    /// No relative motion
    Fixed,
}

impl ConstraintKind {
    /// Whether the kind has a free coordinate that limits can bound
    pub fn accepts_limits(&self) -> bool {
        matches!(self, ConstraintKind::Hinge | ConstraintKind::Slider)
    }
}

/// Inclusive [min, max] range of a constraint's free coordinate
///
/// Distance along the axis for sliders, angle in radians about the axis
/// for hinges. Both are measured from the pose at creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstraintLimits {
    pub min: f32,
    pub max: f32,
}

impl ConstraintLimits {
    /// Create limits, rejecting inverted or non-finite bounds
    pub fn new(min: f32, max: f32) -> Result<Self> {
        if !(min.is_finite() && max.is_finite()) || min > max {
            return Err(PhysicsError::InvalidLimits { min, max });
        }
        Ok(Self { min, max })
    }

    /// Limits valid for `kind`; hinge angles must lie within [-pi, pi]
    pub fn for_kind(kind: ConstraintKind, min: f32, max: f32) -> Result<Self> {
        if !kind.accepts_limits() {
            return Err(PhysicsError::LimitsUnsupported(kind));
        }
        let limits = Self::new(min, max)?;
        if kind == ConstraintKind::Hinge && (min < -PI || max > PI) {
            return Err(PhysicsError::InvalidLimits { min, max });
        }
        Ok(limits)
    }

    /// Clamp a value into the range
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

/// Description for creating a constraint
///
/// Anchor and axis are given in world space at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstraintDesc {
    pub kind: ConstraintKind,
    pub object_a: ObjectId,
    pub object_b: ObjectId,
    pub anchor: Vec3,
    pub axis: Vec3,
    pub limits: Option<(f32, f32)>,
}

impl ConstraintDesc {
    /// Hinge about `axis` through `anchor`
    pub fn hinge(object_a: ObjectId, object_b: ObjectId, anchor: Vec3, axis: Vec3) -> Self {
        Self {
            kind: ConstraintKind::Hinge,
            object_a,
            object_b,
            anchor,
            axis,
            limits: None,
        }
    }

    /// Ball-and-socket at `anchor`
    pub fn ball_socket(object_a: ObjectId, object_b: ObjectId, anchor: Vec3) -> Self {
        Self {
            kind: ConstraintKind::BallSocket,
            object_a,
            object_b,
            anchor,
            axis: Vec3::Y,
            limits: None,
        }
    }

    /// Slider along `axis`, positions measured from `anchor`
    pub fn slider(object_a: ObjectId, object_b: ObjectId, anchor: Vec3, axis: Vec3) -> Self {
        Self {
            kind: ConstraintKind::Slider,
            object_a,
            object_b,
            anchor,
            axis,
            limits: None,
        }
    }

    /// Weld b to a in their current relative pose
    pub fn fixed(object_a: ObjectId, object_b: ObjectId) -> Self {
        Self {
            kind: ConstraintKind::Fixed,
            object_a,
            object_b,
            anchor: Vec3::ZERO,
            axis: Vec3::Y,
            limits: None,
        }
    }

    /// Set limits
    pub fn with_limits(mut self, min: f32, max: f32) -> Self {
        self.limits = Some((min, max));
        self
    }

    /// Set anchor
    pub fn with_anchor(mut self, anchor: Vec3) -> Self {
        self.anchor = anchor;
        self
    }
}

/// A constraint stored in body-local frames
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub id: ConstraintId,
    pub kind: ConstraintKind,
    pub object_a: ObjectId,
    pub object_b: ObjectId,
    /// Anchor in a's local frame
    pub local_anchor_a: Vec3,
    /// Anchor in b's local frame
    pub local_anchor_b: Vec3,
    /// Unit axis in a's local frame
    pub local_axis: Vec3,
    pub limits: Option<ConstraintLimits>,
    pub active: bool,
    /// b's centre relative to a, in a's frame, at creation
    rest_offset: Vec3,
    /// b's rotation relative to a at creation
    rest_rotation: Quat,
}

impl Constraint {
    /// Whether `id` is one of the constrained bodies
    pub fn references(&self, id: ObjectId) -> bool {
        self.object_a == id || self.object_b == id
    }

    /// Axis in world space, following a's rotation
    pub fn world_axis(&self, a: &PhysicsObject) -> Vec3 {
        a.transform.rotation * self.local_axis
    }
}

/// Position and velocity snapshot of one constrained body
#[derive(Clone, Copy)]
struct BodyFrame {
    position: Vec3,
    rotation: Quat,
    linear_velocity: Vec3,
    angular_velocity: Vec3,
    inv_mass: f32,
    inv_inertia: f32,
    dynamic: bool,
}

impl BodyFrame {
    fn of(object: &PhysicsObject) -> Self {
        Self {
            position: object.transform.position,
            rotation: object.transform.rotation,
            linear_velocity: object.linear_velocity,
            angular_velocity: object.angular_velocity,
            inv_mass: object.inverse_mass(),
            inv_inertia: object.inverse_inertia(),
            dynamic: object.kind.is_dynamic(),
        }
    }

    fn write(&self, object: &mut PhysicsObject) {
        object.transform.position = self.position;
        object.transform.rotation = self.rotation;
        object.linear_velocity = self.linear_velocity;
        object.angular_velocity = self.angular_velocity;
    }
}

/// Owner of every constraint
#[derive(Debug, Clone)]
pub struct ConstraintTable {
    constraints: BTreeMap<ConstraintId, Constraint>,
    next_id: u64,
}

impl Default for ConstraintTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstraintTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            constraints: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Validate `desc` against the registry and store it in local frames
    pub fn create(&mut self, desc: ConstraintDesc, registry: &ObjectRegistry) -> Result<ConstraintId> {
        if desc.object_a == desc.object_b {
            return Err(PhysicsError::SelfConstraint(desc.object_a));
        }
        let a = registry
            .get(desc.object_a)
            .ok_or(PhysicsError::ObjectNotFound(desc.object_a))?;
        let b = registry
            .get(desc.object_b)
            .ok_or(PhysicsError::ObjectNotFound(desc.object_b))?;

        let axis = desc.axis.normalize_or_zero();
        if !desc.axis.is_finite() || axis == Vec3::ZERO {
            return Err(PhysicsError::ZeroLengthAxis);
        }
        if !desc.anchor.is_finite() {
            return Err(PhysicsError::NonFinite("anchor"));
        }
        let limits = desc
            .limits
            .map(|(min, max)| ConstraintLimits::for_kind(desc.kind, min, max))
            .transpose()?;

        let id = ConstraintId(self.next_id);
        self.next_id += 1;

        let inv_rot_a = a.transform.rotation.inverse();
        let constraint = Constraint {
            id,
            kind: desc.kind,
            object_a: a.id,
            object_b: b.id,
            local_anchor_a: a.transform.point_to_local(desc.anchor),
            local_anchor_b: b.transform.point_to_local(desc.anchor),
            local_axis: inv_rot_a * axis,
            limits,
            active: true,
            rest_offset: a.transform.point_to_local(b.transform.position),
            rest_rotation: (inv_rot_a * b.transform.rotation).normalize(),
        };

        log::debug!("Created {:?} constraint {} between {} and {}", desc.kind, id, a.id, b.id);
        self.constraints.insert(id, constraint);
        Ok(id)
    }

    /// Remove a constraint
    pub fn remove(&mut self, id: ConstraintId) -> Result<Constraint> {
        self.constraints
            .remove(&id)
            .ok_or(PhysicsError::ConstraintNotFound(id))
    }

    /// Replace the limits of a constraint
    pub fn set_limits(&mut self, id: ConstraintId, min: f32, max: f32) -> Result<()> {
        let constraint = self
            .constraints
            .get_mut(&id)
            .ok_or(PhysicsError::ConstraintNotFound(id))?;
        constraint.limits = Some(ConstraintLimits::for_kind(constraint.kind, min, max)?);
        Ok(())
    }

    /// Get a constraint
    pub fn get(&self, id: ConstraintId) -> Option<&Constraint> {
        self.constraints.get(&id)
    }

    /// All constraints in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.values()
    }

    /// Number of stored constraints
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Number of active constraints
    pub fn active_count(&self) -> usize {
        self.constraints.values().filter(|c| c.active).count()
    }

    /// Deactivate every constraint that references `object`
    pub fn deactivate_referencing(&mut self, object: ObjectId) -> usize {
        let mut count = 0;
        for constraint in self.constraints.values_mut() {
            if constraint.active && constraint.references(object) {
                constraint.active = false;
                count += 1;
            }
        }
        count
    }

    /// Deactivate every constraint whose bodies are no longer registered
    pub fn deactivate_missing(&mut self, registry: &ObjectRegistry) -> usize {
        let mut count = 0;
        for constraint in self.constraints.values_mut() {
            if constraint.active
                && !(registry.contains(constraint.object_a) && registry.contains(constraint.object_b))
            {
                log::debug!("Constraint {} lost a body, deactivating", constraint.id);
                constraint.active = false;
                count += 1;
            }
        }
        count
    }

    /// World-space axis of the first active hinge attached to `object`
    pub fn hinge_axis(&self, object: ObjectId, registry: &ObjectRegistry) -> Option<Vec3> {
        self.constraints
            .values()
            .filter(|c| c.active && c.kind == ConstraintKind::Hinge && c.references(object))
            .find_map(|c| registry.get(c.object_a).map(|a| c.world_axis(a)))
    }

    /// Apply one proportional correction pass
    pub fn resolve(&self, registry: &mut ObjectRegistry, gain: f32) {
        for constraint in self.constraints.values().filter(|c| c.active) {
            let (Some(a), Some(b)) = (registry.get(constraint.object_a), registry.get(constraint.object_b)) else {
                continue;
            };
            if !(a.active && b.active) {
                continue;
            }
            let mut fa = BodyFrame::of(a);
            let mut fb = BodyFrame::of(b);

            match constraint.kind {
                ConstraintKind::BallSocket => resolve_anchor(constraint, &mut fa, &mut fb, gain),
                ConstraintKind::Hinge => resolve_hinge(constraint, &mut fa, &mut fb, gain),
                ConstraintKind::Slider => resolve_slider(constraint, &mut fa, &mut fb, gain),
                ConstraintKind::Fixed => resolve_fixed(constraint, &fa, &mut fb, gain),
            }

            if let Some(object) = registry.get_mut(constraint.object_a) {
                fa.write(object);
            }
            if let Some(object) = registry.get_mut(constraint.object_b) {
                fb.write(object);
            }
        }
    }
}

/// Share of a correction each body takes, by inverse mass
fn weights(a: &BodyFrame, b: &BodyFrame) -> Option<(f32, f32)> {
    let total = a.inv_mass + b.inv_mass;
    (total > 0.0).then(|| (a.inv_mass / total, b.inv_mass / total))
}

/// Share of a rotational correction each body takes, by inverse inertia
fn angular_weights(a: &BodyFrame, b: &BodyFrame) -> Option<(f32, f32)> {
    let total = a.inv_inertia + b.inv_inertia;
    (total > 0.0).then(|| (a.inv_inertia / total, b.inv_inertia / total))
}

fn world_anchor(frame: &BodyFrame, local: Vec3) -> Vec3 {
    frame.position + frame.rotation * local
}

fn resolve_anchor(c: &Constraint, a: &mut BodyFrame, b: &mut BodyFrame, gain: f32) {
    let Some((wa, wb)) = weights(a, b) else {
        return;
    };
    let error = world_anchor(a, c.local_anchor_a) - world_anchor(b, c.local_anchor_b);
    a.position -= error * gain * wa;
    b.position += error * gain * wb;
}

fn resolve_hinge(c: &Constraint, a: &mut BodyFrame, b: &mut BodyFrame, gain: f32) {
    resolve_anchor(c, a, b, gain);
    let Some((wa, wb)) = weights(a, b) else {
        return;
    };
    let axis = a.rotation * c.local_axis;

    // Relative sliding along the hinge axis
    let axial = (b.linear_velocity - a.linear_velocity).dot(axis);
    a.linear_velocity += axis * axial * gain * wa;
    b.linear_velocity -= axis * axial * gain * wb;

    // Relative spin off the hinge axis
    let relative_spin = b.angular_velocity - a.angular_velocity;
    let off_axis = relative_spin - axis * relative_spin.dot(axis);
    a.angular_velocity += off_axis * gain * wa;
    b.angular_velocity -= off_axis * gain * wb;

    if let Some(limits) = c.limits {
        limit_hinge_angle(c, limits, axis, a, b, gain);
    }
}

/// Signed rotation of b about `axis` relative to its pose at creation
fn hinge_angle(c: &Constraint, axis: Vec3, a: &BodyFrame, b: &BodyFrame) -> f32 {
    let mut drift = b.rotation * (a.rotation * c.rest_rotation).inverse();
    if drift.w < 0.0 {
        drift = -drift;
    }
    2.0 * Vec3::new(drift.x, drift.y, drift.z).dot(axis).atan2(drift.w)
}

/// Turn both bodies back inside the angle range about the hinge anchor and
/// stop relative spin that drives further out
fn limit_hinge_angle(
    c: &Constraint,
    limits: ConstraintLimits,
    axis: Vec3,
    a: &mut BodyFrame,
    b: &mut BodyFrame,
    gain: f32,
) {
    let Some((wa, wb)) = angular_weights(a, b) else {
        return;
    };
    let angle = hinge_angle(c, axis, a, b);
    let excess = angle - limits.clamp(angle);
    if excess == 0.0 {
        return;
    }

    let pivot = world_anchor(a, c.local_anchor_a);
    let turn_a = Quat::from_axis_angle(axis, excess * gain * wa);
    let turn_b = Quat::from_axis_angle(axis, -excess * gain * wb);
    a.position = pivot + turn_a * (a.position - pivot);
    a.rotation = (turn_a * a.rotation).normalize();
    b.position = pivot + turn_b * (b.position - pivot);
    b.rotation = (turn_b * b.rotation).normalize();

    let axial_spin = (b.angular_velocity - a.angular_velocity).dot(axis);
    if axial_spin * excess > 0.0 {
        a.angular_velocity += axis * axial_spin * wa;
        b.angular_velocity -= axis * axial_spin * wb;
    }
}

fn resolve_slider(c: &Constraint, a: &mut BodyFrame, b: &mut BodyFrame, gain: f32) {
    let Some((wa, wb)) = weights(a, b) else {
        return;
    };
    let axis = a.rotation * c.local_axis;
    let origin = world_anchor(a, c.local_anchor_a);
    let relative = b.position - origin;
    let along = relative.dot(axis);
    let target_along = c.limits.map_or(along, |l| l.clamp(along));

    // Perpendicular offset is held at its rest value
    let rest = a.rotation * (c.rest_offset - c.local_anchor_a);
    let rest_perpendicular = rest - axis * rest.dot(axis);
    let target = axis * target_along + rest_perpendicular;

    let error = target - relative;
    a.position -= error * gain * wa;
    b.position += error * gain * wb;

    if let Some(limits) = c.limits {
        let axial = (b.linear_velocity - a.linear_velocity).dot(axis);
        let past_max = along >= limits.max && axial > 0.0;
        let past_min = along <= limits.min && axial < 0.0;
        if past_max || past_min {
            a.linear_velocity += axis * axial * wa;
            b.linear_velocity -= axis * axial * wb;
        }
    }
}

fn resolve_fixed(c: &Constraint, a: &BodyFrame, b: &mut BodyFrame, gain: f32) {
    if !b.dynamic {
        return;
    }
    let target_position = a.position + a.rotation * c.rest_offset;
    let target_rotation = (a.rotation * c.rest_rotation).normalize();
    b.position = b.position.lerp(target_position, gain);
    b.rotation = b.rotation.slerp(target_rotation, gain).normalize();
    b.linear_velocity = b.linear_velocity.lerp(a.linear_velocity, gain);
    b.angular_velocity = b.angular_velocity.lerp(a.angular_velocity, gain);
}
