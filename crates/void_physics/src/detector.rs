//! Collision detection
//!
//! Broad phase is an all-pairs sweep over active bodies in id order.
//! Narrow phase compares bounding spheres scaled by each body's dominant
//! scale.

use crate::body::{BodyKind, Hand, ObjectId, PhysicsObject};
use crate::config::PhysicsConfig;
use crate::layers::LayerGating;
use crate::registry::ObjectRegistry;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Classification of a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionType {
    /// A hand proxy is touching the body
    Touch,
    /// A hand is holding the body
    Grab,
    /// A hand pushed the body away
    Push,
    /// A hand pulled the body in
    Pull,
    /// Two non-hand bodies overlap
    Collide,
}

/// Contact between two bodies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionResult {
    pub object_a: ObjectId,
    pub object_b: ObjectId,
    /// Midpoint between the two centres
    pub point: Vec3,
    /// Unit normal from a to b
    pub normal: Vec3,
    /// Overlap of the bounding spheres, never negative
    pub depth: f32,
    pub collision_type: CollisionType,
    /// Acting hand when one side is a controller proxy
    pub hand: Option<Hand>,
    /// Whether the pair passed gating and overlaps
    pub valid: bool,
}

impl CollisionResult {
    /// Whether `id` is one side of this contact
    pub fn involves(&self, id: ObjectId) -> bool {
        self.object_a == id || self.object_b == id
    }

    /// The other side of the contact
    pub fn other(&self, id: ObjectId) -> Option<ObjectId> {
        if self.object_a == id {
            Some(self.object_b)
        } else if self.object_b == id {
            Some(self.object_a)
        } else {
            None
        }
    }
}

/// Statistics of the last detection pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorStats {
    /// Pairs that reached `check`
    pub pair_tests: u64,
    /// Colliding pairs found, before truncation
    pub collisions_found: usize,
    /// Colliding pairs dropped because the list was full
    pub collisions_dropped: usize,
    /// Wall-clock duration of the pass
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

/// Broad and narrow phase over the registry
#[derive(Debug, Clone)]
pub struct CollisionDetector {
    max_collisions: usize,
    tolerance: f32,
    gating: LayerGating,
    active: Vec<CollisionResult>,
    stats: DetectorStats,
}

impl CollisionDetector {
    /// Create a detector using the limits from `config`
    pub fn new(config: &PhysicsConfig) -> Self {
        Self {
            max_collisions: config.max_collisions,
            tolerance: config.collision_tolerance,
            gating: config.layer_gating,
            active: Vec::new(),
            stats: DetectorStats::default(),
        }
    }

    /// Every active body whose bounding sphere overlaps the query sphere,
    /// nearest first
    pub fn detect(&self, registry: &ObjectRegistry, point: Vec3, radius: f32) -> Vec<ObjectId> {
        if !point.is_finite() || !radius.is_finite() {
            return Vec::new();
        }
        let radius = radius.max(0.0);
        let mut hits: Vec<(f32, ObjectId)> = registry
            .query_all()
            .filter(|o| o.active)
            .filter_map(|o| {
                let distance = o.transform.position.distance(point);
                (distance <= o.effective_radius() + radius + self.tolerance).then_some((distance, o.id))
            })
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        hits.into_iter().map(|(_, id)| id).collect()
    }

    /// Gate then overlap test between two bodies; unknown or inactive
    /// bodies never collide
    pub fn check(&self, registry: &ObjectRegistry, a: ObjectId, b: ObjectId) -> bool {
        if a == b {
            return false;
        }
        match (registry.get(a), registry.get(b)) {
            (Some(a), Some(b)) => self.check_objects(a, b),
            _ => false,
        }
    }

    /// Contact data for a pair; `None` for unknown ids.
    ///
    /// The result is computed even when the pair does not overlap, with
    /// `valid` set to false.
    pub fn result(&self, registry: &ObjectRegistry, a: ObjectId, b: ObjectId) -> Option<CollisionResult> {
        let (oa, ob) = (registry.get(a)?, registry.get(b)?);
        let valid = a != b && self.check_objects(oa, ob);
        Some(contact(oa, ob, valid))
    }

    /// Rebuild the active collision list from scratch
    pub fn update(&mut self, registry: &ObjectRegistry) -> &[CollisionResult] {
        let start = Instant::now();
        let bodies: Vec<&PhysicsObject> = registry.query_all().filter(|o| o.active).collect();

        self.active.clear();
        let mut stats = DetectorStats::default();

        for (i, a) in bodies.iter().enumerate() {
            for b in &bodies[i + 1..] {
                if a.kind == BodyKind::Static && b.kind == BodyKind::Static {
                    continue;
                }
                stats.pair_tests += 1;
                if !self.check_objects(a, b) {
                    continue;
                }
                stats.collisions_found += 1;
                if self.active.len() < self.max_collisions {
                    self.active.push(contact(a, b, true));
                } else {
                    stats.collisions_dropped += 1;
                }
            }
        }

        if stats.collisions_dropped > 0 {
            log::debug!(
                "Collision list full: kept {}, dropped {}",
                self.active.len(),
                stats.collisions_dropped
            );
        }

        stats.elapsed = start.elapsed();
        self.stats = stats;
        &self.active
    }

    /// Contacts found by the last pass
    pub fn active_collisions(&self) -> &[CollisionResult] {
        &self.active
    }

    /// Drop every contact involving `id`
    pub fn purge(&mut self, id: ObjectId) {
        self.active.retain(|c| !c.involves(id));
    }

    /// Statistics of the last pass
    pub fn stats(&self) -> DetectorStats {
        self.stats
    }

    /// Maximum length of the active list
    pub fn max_collisions(&self) -> usize {
        self.max_collisions
    }

    /// Change the cap; the current list is truncated immediately
    pub fn set_max_collisions(&mut self, max: usize) {
        self.max_collisions = max;
        self.active.truncate(max);
    }

    /// Gating direction in use
    pub fn gating(&self) -> LayerGating {
        self.gating
    }

    fn check_objects(&self, a: &PhysicsObject, b: &PhysicsObject) -> bool {
        if !a.active || !b.active {
            return false;
        }
        // Gating always wins over geometry
        if !a.groups.can_collide(&b.groups, self.gating) {
            return false;
        }
        let distance = a.transform.position.distance(b.transform.position);
        distance <= a.effective_radius() + b.effective_radius() + self.tolerance
    }
}

fn contact(a: &PhysicsObject, b: &PhysicsObject, valid: bool) -> CollisionResult {
    let delta = b.transform.position - a.transform.position;
    let distance = delta.length();
    let normal = if distance > f32::EPSILON && distance.is_finite() {
        delta / distance
    } else {
        Vec3::Y
    };
    let depth = (a.effective_radius() + b.effective_radius() - distance).max(0.0);

    let controller_hand = if a.is_controller() {
        Some(a.hand())
    } else if b.is_controller() {
        Some(b.hand())
    } else {
        None
    };

    CollisionResult {
        object_a: a.id,
        object_b: b.id,
        point: (a.transform.position + b.transform.position) * 0.5,
        normal,
        depth: if depth.is_finite() { depth } else { 0.0 },
        collision_type: if controller_hand.is_some() {
            CollisionType::Touch
        } else {
            CollisionType::Collide
        },
        hand: controller_hand.flatten(),
        valid,
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::try_from_secs_f64(secs).unwrap_or_default())
    }
}
