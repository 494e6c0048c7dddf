//! Physics queries (raycasting, overlap tests)
//!
//! Queries answer against the same bounding spheres the detector uses.

use crate::body::{BodyKind, ObjectId, PhysicsObject};
use crate::layers::{CollisionGroups, LayerGating};
use crate::registry::ObjectRegistry;
use glam::Vec3;

/// Result of a raycast query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// The body that was hit
    pub object: ObjectId,
    /// Hit point in world space
    pub point: Vec3,
    /// Outward normal of the bounding sphere at the hit point
    pub normal: Vec3,
    /// Distance from ray origin
    pub distance: f32,
}

/// Filter applied to every query
#[derive(Debug, Clone)]
pub struct QueryFilter {
    /// Only bodies whose layer is in `groups.mask` are considered
    pub groups: CollisionGroups,
    /// Also report trigger volumes
    pub include_triggers: bool,
    /// Bodies to skip
    pub exclude: Vec<ObjectId>,
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self {
            groups: CollisionGroups::ALL,
            include_triggers: false,
            exclude: Vec::new(),
        }
    }
}

impl QueryFilter {
    /// Set collision filter
    pub fn with_groups(mut self, groups: CollisionGroups) -> Self {
        self.groups = groups;
        self
    }

    /// Set whether to hit triggers
    pub fn with_triggers(mut self, include: bool) -> Self {
        self.include_triggers = include;
        self
    }

    /// Add a body to exclude
    pub fn exclude(mut self, id: ObjectId) -> Self {
        self.exclude.push(id);
        self
    }

    fn accepts(&self, object: &PhysicsObject) -> bool {
        object.active
            && (self.include_triggers || object.kind != BodyKind::Trigger)
            && !self.exclude.contains(&object.id)
            && object.groups.can_collide(&self.groups, LayerGating::OneWay)
    }
}

/// Read-only query interface over a registry
pub struct SpatialQuery<'a> {
    pub(crate) registry: &'a ObjectRegistry,
}

impl<'a> SpatialQuery<'a> {
    /// Create a query view over `registry`
    pub fn new(registry: &'a ObjectRegistry) -> Self {
        Self { registry }
    }

    /// Cast a ray and get the first hit.
    ///
    /// A zero or non-finite direction never hits. A ray starting inside a
    /// body hits it at distance zero.
    pub fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: &QueryFilter,
    ) -> Option<RaycastHit> {
        self.raycast_all(origin, direction, max_distance, filter)
            .into_iter()
            .next()
    }

    /// Cast a ray and get all hits, nearest first
    pub fn raycast_all(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: &QueryFilter,
    ) -> Vec<RaycastHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO || !origin.is_finite() || max_distance.is_nan() || max_distance < 0.0 {
            return Vec::new();
        }

        let mut hits: Vec<RaycastHit> = self
            .registry
            .query_all()
            .filter(|o| filter.accepts(o))
            .filter_map(|o| ray_sphere(origin, dir, o.transform.position, o.effective_radius()).map(|t| (o, t)))
            .filter(|(_, t)| *t <= max_distance)
            .map(|(o, t)| {
                let point = origin + dir * t;
                let outward = (point - o.transform.position).normalize_or_zero();
                RaycastHit {
                    object: o.id,
                    point,
                    normal: if outward == Vec3::ZERO { -dir } else { outward },
                    distance: t,
                }
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.object.cmp(&b.object)));
        hits
    }

    /// Bodies whose bounding sphere intersects an axis-aligned box
    pub fn overlap_box(&self, center: Vec3, half_extents: Vec3, filter: &QueryFilter) -> Vec<ObjectId> {
        let half = half_extents.abs();
        self.registry
            .query_all()
            .filter(|o| filter.accepts(o))
            .filter(|o| {
                let p = o.transform.position;
                let closest = p.clamp(center - half, center + half);
                closest.distance_squared(p) <= o.effective_radius().powi(2)
            })
            .map(|o| o.id)
            .collect()
    }

    /// First body whose bounding sphere contains `point`
    pub fn point_inside(&self, point: Vec3, filter: &QueryFilter) -> Option<ObjectId> {
        self.registry
            .query_all()
            .filter(|o| filter.accepts(o))
            .find(|o| o.transform.position.distance(point) <= o.effective_radius())
            .map(|o| o.id)
    }

    /// Distance between the centres of two bodies
    pub fn distance(&self, a: ObjectId, b: ObjectId) -> Option<f32> {
        let a = self.registry.get(a)?;
        let b = self.registry.get(b)?;
        Some(a.transform.position.distance(b.transform.position))
    }
}

/// Entry distance of a normalized ray into a sphere
fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    if b > 0.0 {
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    Some((-b - discriminant.sqrt()).max(0.0))
}
