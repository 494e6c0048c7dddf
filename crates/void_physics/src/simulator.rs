//! Fixed-timestep rigid-body simulation

use crate::body::{BodyKind, PhysicsObject};
use crate::config::{GravityModel, PhysicsBackend, PhysicsConfig};
use crate::constraint::ConstraintTable;
use crate::detector::CollisionDetector;
use crate::registry::ObjectRegistry;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Slack when comparing the accumulator against the timestep, so that
/// summed f32 deltas do not lose a step to rounding
const ACCUMULATOR_EPSILON: f32 = 1e-5;

/// Per-body integration scheme
pub trait Integrator: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Advance one body by `dt`
    fn integrate(&self, object: &mut PhysicsObject, gravity: &GravityModel, dt: f32);
}

/// Explicit Euler: velocity first, then position and orientation
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinIntegrator;

impl Integrator for BuiltinIntegrator {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn integrate(&self, object: &mut PhysicsObject, gravity: &GravityModel, dt: f32) {
        match object.kind {
            BodyKind::Static | BodyKind::Trigger => return,
            BodyKind::Kinematic => {}
            BodyKind::Dynamic => {
                let mut acceleration = object.force * object.inverse_mass();
                if object.gravity_enabled {
                    acceleration += gravity.acceleration_at(object.transform.position) * object.gravity_scale;
                }
                object.linear_velocity += acceleration * dt;
                object.angular_velocity += object.torque * object.inverse_inertia() * dt;
            }
        }

        object.transform.position += object.linear_velocity * dt;

        let spin = object.angular_velocity * dt;
        if spin != Vec3::ZERO {
            object.transform.rotation = (Quat::from_scaled_axis(spin) * object.transform.rotation).normalize();
        }

        if object.kind.is_dynamic() {
            object.linear_velocity *= (1.0 - object.linear_damping * dt).max(0.0);
            object.angular_velocity *= (1.0 - object.angular_damping * dt).max(0.0);
        }
    }
}

/// Pick the integrator for a backend tag
///
/// Only the built-in integrator ships with the core.
pub fn integrator_for(backend: PhysicsBackend) -> Box<dyn Integrator> {
    match backend {
        PhysicsBackend::Builtin | PhysicsBackend::Auto => {}
        PhysicsBackend::Bullet | PhysicsBackend::Physx => {
            log::warn!("Physics backend '{}' is not available, using builtin", backend);
        }
    }
    Box::new(BuiltinIntegrator)
}

/// What one `advance` call did
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// Fixed steps performed
    pub steps: u32,
    /// Seconds discarded because the substep bound was reached
    pub dropped_time: f32,
}

/// Fixed-step driver over the registry, constraints and detector
pub struct Simulator {
    config: PhysicsConfig,
    integrator: Box<dyn Integrator>,
    accumulator: f32,
    total_steps: u64,
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("integrator", &self.integrator.name())
            .field("accumulator", &self.accumulator)
            .field("total_steps", &self.total_steps)
            .finish()
    }
}

impl Simulator {
    /// Create a simulator for `config`
    pub fn new(config: PhysicsConfig) -> Self {
        let integrator = integrator_for(config.backend);
        Self::with_integrator(config, integrator)
    }

    /// Create a simulator with a custom integrator
    pub fn with_integrator(config: PhysicsConfig, integrator: Box<dyn Integrator>) -> Self {
        Self {
            config,
            integrator,
            accumulator: 0.0,
            total_steps: 0,
        }
    }

    /// Name of the integrator in use
    pub fn integrator_name(&self) -> &'static str {
        self.integrator.name()
    }

    /// Time carried over to the next `advance`
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Steps performed since creation
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Configuration in use
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Replace the gravity model
    pub fn set_gravity(&mut self, gravity: GravityModel) {
        self.config.gravity = gravity;
    }

    /// Consume wall-clock `delta` in fixed steps.
    ///
    /// Negative or non-finite deltas are ignored. At most `max_substeps`
    /// steps run; whole steps beyond that are discarded so a stall cannot
    /// trigger an unbounded catch-up.
    pub fn advance(
        &mut self,
        delta: f32,
        registry: &mut ObjectRegistry,
        constraints: &mut ConstraintTable,
        detector: &mut CollisionDetector,
    ) -> StepReport {
        let mut report = StepReport::default();
        if !delta.is_finite() || delta < 0.0 {
            log::debug!("Ignoring invalid delta {}", delta);
            return report;
        }

        let dt = self.config.timestep;
        self.accumulator += delta;

        while self.accumulator + ACCUMULATOR_EPSILON >= dt && report.steps < self.config.max_substeps {
            self.step(registry, constraints, detector);
            self.accumulator -= dt;
            report.steps += 1;
        }

        if self.accumulator + ACCUMULATOR_EPSILON >= dt {
            let whole = ((self.accumulator + ACCUMULATOR_EPSILON) / dt).floor();
            report.dropped_time = whole * dt;
            self.accumulator = (self.accumulator - report.dropped_time).max(0.0);
            log::warn!(
                "Physics fell behind: dropped {:.4}s after {} substeps",
                report.dropped_time,
                report.steps
            );
        }

        report
    }

    /// Perform exactly one fixed step
    pub fn step(
        &mut self,
        registry: &mut ObjectRegistry,
        constraints: &mut ConstraintTable,
        detector: &mut CollisionDetector,
    ) {
        let dt = self.config.timestep;
        constraints.deactivate_missing(registry);

        for object in registry.iter_mut().filter(|o| o.active) {
            self.integrator.integrate(object, &self.config.gravity, dt);
            object.force = Vec3::ZERO;
            object.torque = Vec3::ZERO;
        }

        constraints.resolve(registry, self.config.constraint_gain);

        detector.update(registry);
        if self.config.collision_response {
            resolve_contacts(registry, detector, self.config.response_strength);
        }

        self.total_steps += 1;
    }
}

/// Push overlapping bodies apart and bounce approaching ones
fn resolve_contacts(registry: &mut ObjectRegistry, detector: &CollisionDetector, strength: f32) {
    for contact in detector.active_collisions() {
        let (Some(a), Some(b)) = (registry.get(contact.object_a), registry.get(contact.object_b)) else {
            continue;
        };
        if a.kind == BodyKind::Trigger || b.kind == BodyKind::Trigger {
            continue;
        }
        let (inv_a, inv_b) = (a.inverse_mass(), b.inverse_mass());
        let total = inv_a + inv_b;
        if total <= 0.0 {
            continue;
        }

        let n = contact.normal;
        let separation = n * contact.depth * strength;
        let relative = b.linear_velocity - a.linear_velocity;
        let approach = relative.dot(n);
        let surface = a.material.mix(&b.material);
        let normal_impulse = if approach < 0.0 {
            -(1.0 + surface.restitution) * approach / total
        } else {
            0.0
        };

        // Coulomb friction: tangential impulse capped by mu times the normal one
        let slip = relative - n * approach;
        let slip_speed = slip.length();
        let tangent_impulse = if slip_speed > 1e-6 {
            -slip / slip_speed * (slip_speed / total).min(surface.friction * normal_impulse)
        } else {
            Vec3::ZERO
        };
        let impulse = n * normal_impulse + tangent_impulse;

        if let Some(a) = registry.get_mut(contact.object_a) {
            a.transform.position -= separation * (inv_a / total);
            a.linear_velocity -= impulse * inv_a;
        }
        if let Some(b) = registry.get_mut(contact.object_b) {
            b.transform.position += separation * (inv_b / total);
            b.linear_velocity += impulse * inv_b;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::ObjectDesc;
    use crate::collider::CollisionShape;
    use crate::material::PhysicsMaterial;
    use approx::assert_relative_eq;

    struct Rig {
        sim: Simulator,
        registry: ObjectRegistry,
        constraints: ConstraintTable,
        detector: CollisionDetector,
    }

    impl Rig {
        fn new(config: PhysicsConfig) -> Self {
            Self {
                detector: CollisionDetector::new(&config),
                sim: Simulator::new(config),
                registry: ObjectRegistry::new(),
                constraints: ConstraintTable::new(),
            }
        }

        fn advance(&mut self, dt: f32) -> StepReport {
            self.sim
                .advance(dt, &mut self.registry, &mut self.constraints, &mut self.detector)
        }
    }

    #[test]
    fn test_accumulator_runs_whole_steps() {
        let mut rig = Rig::new(PhysicsConfig::default().with_max_substeps(100));
        assert_eq!(rig.advance(1.0).steps, 60);
        assert_eq!(rig.advance(0.01).steps, 0);
        assert_eq!(rig.advance(0.01).steps, 1);
    }

    #[test]
    fn test_substep_bound_drops_time() {
        let mut rig = Rig::new(PhysicsConfig::default().with_max_substeps(4));
        let report = rig.advance(1.0);
        assert_eq!(report.steps, 4);
        assert_relative_eq!(report.dropped_time, 56.0 / 60.0, epsilon = 1e-4);
        assert!(rig.sim.accumulator() < 1.0 / 60.0);
    }

    #[test]
    fn test_invalid_delta_ignored() {
        let mut rig = Rig::new(PhysicsConfig::default());
        assert_eq!(rig.advance(-1.0), StepReport::default());
        assert_eq!(rig.advance(f32::NAN), StepReport::default());
        assert_eq!(rig.sim.accumulator(), 0.0);
    }

    #[test]
    fn test_static_and_trigger_never_move() {
        let mut rig = Rig::new(PhysicsConfig::default());
        let wall = rig
            .registry
            .register(ObjectDesc::fixed(CollisionShape::sphere(1.0)).with_linear_velocity(Vec3::X))
            .unwrap();
        let zone = rig
            .registry
            .register(ObjectDesc::trigger(CollisionShape::sphere(1.0)).with_linear_velocity(Vec3::X))
            .unwrap();
        rig.advance(0.5);
        assert_eq!(rig.registry.get(wall).unwrap().transform.position, Vec3::ZERO);
        assert_eq!(rig.registry.get(zone).unwrap().transform.position, Vec3::ZERO);
    }

    #[test]
    fn test_kinematic_ignores_gravity() {
        let mut rig = Rig::new(PhysicsConfig::default());
        let hand = rig
            .registry
            .register(ObjectDesc::kinematic(CollisionShape::sphere(0.05)).with_linear_velocity(Vec3::X))
            .unwrap();
        rig.advance(1.0 / 60.0);
        let hand = rig.registry.get(hand).unwrap();
        assert_relative_eq!(hand.transform.position.x, 1.0 / 60.0);
        assert_eq!(hand.linear_velocity.y, 0.0);
    }

    #[test]
    fn test_damping_slows_body() {
        let mut rig = Rig::new(PhysicsConfig::default().with_gravity(GravityModel::None));
        let id = rig
            .registry
            .register(
                ObjectDesc::dynamic(CollisionShape::sphere(0.1))
                    .with_linear_velocity(Vec3::X)
                    .with_damping(6.0, 0.0),
            )
            .unwrap();
        rig.advance(1.0 / 60.0);
        assert_relative_eq!(rig.registry.get(id).unwrap().linear_velocity.x, 0.9, epsilon = 1e-6);
    }

    #[test]
    fn test_forces_consumed_by_step() {
        let mut rig = Rig::new(PhysicsConfig::default().with_gravity(GravityModel::None));
        let id = rig
            .registry
            .register(ObjectDesc::dynamic(CollisionShape::sphere(0.1)).with_mass(2.0))
            .unwrap();
        rig.registry.get_mut(id).unwrap().force = Vec3::new(120.0, 0.0, 0.0);
        rig.advance(1.0 / 60.0);

        let body = rig.registry.get(id).unwrap();
        assert_relative_eq!(body.linear_velocity.x, 1.0, epsilon = 1e-5);
        assert_eq!(body.force, Vec3::ZERO);
    }

    #[test]
    fn test_collision_response_separates() {
        let config = PhysicsConfig::default()
            .with_gravity(GravityModel::None)
            .with_collision_response(true);
        let mut rig = Rig::new(config);
        let a = rig
            .registry
            .register(ObjectDesc::dynamic(CollisionShape::sphere(0.5)).with_linear_velocity(Vec3::X))
            .unwrap();
        let b = rig
            .registry
            .register(
                ObjectDesc::dynamic(CollisionShape::sphere(0.5))
                    .with_position(Vec3::new(0.9, 0.0, 0.0))
                    .with_linear_velocity(-Vec3::X),
            )
            .unwrap();
        rig.advance(1.0 / 60.0);

        let va = rig.registry.get(a).unwrap().linear_velocity.x;
        let vb = rig.registry.get(b).unwrap().linear_velocity.x;
        assert!(va <= 0.0 && vb >= 0.0, "bodies should stop approaching: {} {}", va, vb);
    }

    fn slide_over_post(friction: f32) -> Vec3 {
        let config = PhysicsConfig::default()
            .with_gravity(GravityModel::None)
            .with_collision_response(true);
        let mut rig = Rig::new(config);
        let surface = PhysicsMaterial::new(friction, 0.0);
        rig.registry
            .register(ObjectDesc::fixed(CollisionShape::sphere(0.5)).with_material(surface))
            .unwrap();
        let puck = rig
            .registry
            .register(
                ObjectDesc::dynamic(CollisionShape::sphere(0.5))
                    .with_material(surface)
                    .with_position(Vec3::new(0.0, 0.9, 0.0))
                    .with_linear_velocity(Vec3::new(1.0, -1.0, 0.0)),
            )
            .unwrap();
        rig.advance(1.0 / 60.0);
        rig.registry.get(puck).unwrap().linear_velocity
    }

    #[test]
    fn test_friction_takes_sliding_speed() {
        let slick = slide_over_post(0.0);
        let rough = slide_over_post(1.0);

        assert!(slick.x > 0.95, "frictionless contact keeps its slide: {}", slick.x);
        assert!(rough.x < slick.x - 0.3, "friction should slow the slide: {}", rough.x);
        assert!(rough.x > 0.0);
        assert!(rough.y > -0.05);
    }

    #[test]
    fn test_unavailable_backend_falls_back() {
        assert_eq!(integrator_for(PhysicsBackend::Physx).name(), "builtin");
        assert_eq!(integrator_for(PhysicsBackend::Auto).name(), "builtin");
    }
}
