//! Physics world - main simulation container

use crate::body::{BodyKind, ObjectDesc, ObjectId, ObjectState, PhysicsObject, Transform};
use crate::config::{CapabilityFlags, GravityModel, PhysicsConfig};
use crate::constraint::{Constraint, ConstraintDesc, ConstraintId, ConstraintTable};
use crate::detector::{CollisionDetector, CollisionResult, DetectorStats};
use crate::error::{PhysicsError, Result};
use crate::query::SpatialQuery;
use crate::registry::ObjectRegistry;
use crate::simulator::{Integrator, Simulator, StepReport};
use glam::Vec3;

/// The main physics world containing all simulation state
#[derive(Debug)]
pub struct PhysicsWorld {
    /// Bodies
    registry: ObjectRegistry,

    /// Constraints between bodies
    constraints: ConstraintTable,

    /// Active collision list and narrow phase
    detector: CollisionDetector,

    /// Fixed-step driver
    simulator: Simulator,
}

impl PhysicsWorld {
    /// Create a new physics world
    pub fn new(config: PhysicsConfig) -> Result<Self> {
        config.validate()?;
        let simulator = Simulator::new(config);
        Ok(Self::assemble(simulator))
    }

    /// Create a world driven by a custom integrator
    pub fn with_integrator(config: PhysicsConfig, integrator: Box<dyn Integrator>) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(Simulator::with_integrator(config, integrator)))
    }

    fn assemble(simulator: Simulator) -> Self {
        let config = simulator.config();
        log::info!(
            "Physics world: {} integrator, step {:.4}s, {} substeps, {} collisions max",
            simulator.integrator_name(),
            config.timestep,
            config.max_substeps,
            config.max_collisions
        );
        Self {
            registry: ObjectRegistry::with_damping(config.linear_damping, config.angular_damping),
            constraints: ConstraintTable::new(),
            detector: CollisionDetector::new(config),
            simulator,
        }
    }

    /// Get the physics configuration
    pub fn config(&self) -> &PhysicsConfig {
        self.simulator.config()
    }

    /// Capability flags from the configuration
    pub fn capabilities(&self) -> CapabilityFlags {
        self.config().capabilities
    }

    /// Name of the integrator actually in use
    pub fn integrator_name(&self) -> &'static str {
        self.simulator.integrator_name()
    }

    /// Replace the gravity model
    pub fn set_gravity(&mut self, gravity: GravityModel) {
        log::info!("Gravity set to {:?}", gravity);
        self.simulator.set_gravity(gravity);
    }

    // ==================== Objects ====================

    /// Register a body
    pub fn create_object(&mut self, desc: ObjectDesc) -> Result<ObjectId> {
        self.registry.register(desc)
    }

    /// Remove a body, purge its contacts and deactivate its constraints
    pub fn destroy_object(&mut self, id: ObjectId) -> Result<()> {
        self.registry.remove(id)?;
        self.detector.purge(id);
        let dropped = self.constraints.deactivate_referencing(id);
        if dropped > 0 {
            log::debug!("Destroying {} deactivated {} constraints", id, dropped);
        }
        Ok(())
    }

    /// Get a body
    pub fn get_object(&self, id: ObjectId) -> Option<&PhysicsObject> {
        self.registry.get(id)
    }

    /// Overwrite transform and linear velocity
    pub fn update_object(&mut self, id: ObjectId, transform: Transform, linear_velocity: Vec3) -> Result<()> {
        self.registry.update(id, transform, linear_velocity)
    }

    /// Move a body, keeping its velocity
    pub fn set_transform(&mut self, id: ObjectId, transform: Transform) -> Result<()> {
        let velocity = self
            .registry
            .get(id)
            .map(|o| o.linear_velocity)
            .ok_or(PhysicsError::ObjectNotFound(id))?;
        self.registry.update(id, transform, velocity)
    }

    /// Current transform
    pub fn get_transform(&self, id: ObjectId) -> Option<Transform> {
        self.registry.get(id).map(|o| o.transform)
    }

    /// Snapshot of a body
    pub fn get_state(&self, id: ObjectId) -> Option<ObjectState> {
        self.registry.get(id).map(PhysicsObject::state)
    }

    /// Set linear velocity
    pub fn set_linear_velocity(&mut self, id: ObjectId, velocity: Vec3) -> Result<()> {
        if !velocity.is_finite() {
            return Err(PhysicsError::NonFinite("velocity"));
        }
        self.object_mut(id)?.linear_velocity = velocity;
        Ok(())
    }

    /// Set angular velocity
    pub fn set_angular_velocity(&mut self, id: ObjectId, velocity: Vec3) -> Result<()> {
        if !velocity.is_finite() {
            return Err(PhysicsError::NonFinite("velocity"));
        }
        self.object_mut(id)?.angular_velocity = velocity;
        Ok(())
    }

    /// Change how a body is simulated, returning the previous kind
    pub fn set_kind(&mut self, id: ObjectId, kind: BodyKind) -> Result<BodyKind> {
        let object = self.object_mut(id)?;
        let previous = object.kind;
        if kind.is_dynamic() && !(object.mass.is_finite() && object.mass > 0.0) {
            return Err(PhysicsError::InvalidMass(object.mass));
        }
        object.kind = kind;
        object.force = Vec3::ZERO;
        object.torque = Vec3::ZERO;
        Ok(previous)
    }

    /// Enable or disable a body for detection and simulation
    pub fn set_active(&mut self, id: ObjectId, active: bool) -> Result<()> {
        self.registry.set_active(id, active)?;
        if !active {
            self.detector.purge(id);
        }
        Ok(())
    }

    /// Enable or disable gravity for one body
    pub fn set_gravity_enabled(&mut self, id: ObjectId, enabled: bool) -> Result<()> {
        self.object_mut(id)?.gravity_enabled = enabled;
        Ok(())
    }

    fn object_mut(&mut self, id: ObjectId) -> Result<&mut PhysicsObject> {
        self.registry.get_mut(id).ok_or(PhysicsError::ObjectNotFound(id))
    }

    // ==================== Forces ====================

    /// Add a force for the next step; ignored for unknown or non-dynamic bodies
    pub fn apply_force(&mut self, id: ObjectId, force: Vec3) {
        if let Some(object) = self.dynamic_mut(id, force) {
            object.force += force;
        }
    }

    /// Change velocity immediately by `impulse / mass`
    pub fn apply_impulse(&mut self, id: ObjectId, impulse: Vec3) {
        if let Some(object) = self.dynamic_mut(id, impulse) {
            object.linear_velocity += impulse * object.inverse_mass();
        }
    }

    /// Linear impulse plus the spin it induces about the centre
    pub fn apply_impulse_at_point(&mut self, id: ObjectId, impulse: Vec3, point: Vec3) {
        if !point.is_finite() {
            return;
        }
        if let Some(object) = self.dynamic_mut(id, impulse) {
            let arm = point - object.transform.position;
            object.linear_velocity += impulse * object.inverse_mass();
            object.angular_velocity += arm.cross(impulse) * object.inverse_inertia();
        }
    }

    /// Add a torque for the next step
    pub fn apply_torque(&mut self, id: ObjectId, torque: Vec3) {
        if let Some(object) = self.dynamic_mut(id, torque) {
            object.torque += torque;
        }
    }

    /// Change angular velocity immediately
    pub fn apply_angular_impulse(&mut self, id: ObjectId, impulse: Vec3) {
        if let Some(object) = self.dynamic_mut(id, impulse) {
            object.angular_velocity += impulse * object.inverse_inertia();
        }
    }

    /// Discard accumulated force and torque
    pub fn clear_forces(&mut self, id: ObjectId) {
        if let Some(object) = self.registry.get_mut(id) {
            object.force = Vec3::ZERO;
            object.torque = Vec3::ZERO;
        }
    }

    /// Force accumulated for the next step
    pub fn accumulated_force(&self, id: ObjectId) -> Option<Vec3> {
        self.registry.get(id).map(|o| o.force)
    }

    fn dynamic_mut(&mut self, id: ObjectId, input: Vec3) -> Option<&mut PhysicsObject> {
        if !input.is_finite() {
            return None;
        }
        self.registry.get_mut(id).filter(|o| o.kind.is_dynamic())
    }

    // ==================== Constraints ====================

    /// Create a constraint between two existing bodies
    pub fn create_constraint(&mut self, desc: ConstraintDesc) -> Result<ConstraintId> {
        self.constraints.create(desc, &self.registry)
    }

    /// Remove a constraint
    pub fn remove_constraint(&mut self, id: ConstraintId) -> Result<()> {
        self.constraints.remove(id).map(|_| ())
    }

    /// Replace a constraint's limits
    pub fn set_constraint_limits(&mut self, id: ConstraintId, min: f32, max: f32) -> Result<()> {
        self.constraints.set_limits(id, min, max)
    }

    /// Get a constraint
    pub fn get_constraint(&self, id: ConstraintId) -> Option<&Constraint> {
        self.constraints.get(id)
    }

    /// World-space axis of the first active hinge attached to `object`
    pub fn hinge_axis(&self, object: ObjectId) -> Option<Vec3> {
        self.constraints.hinge_axis(object, &self.registry)
    }

    // ==================== Simulation ====================

    /// Consume wall-clock time in fixed steps
    pub fn advance(&mut self, delta_seconds: f32) -> StepReport {
        self.simulator.advance(
            delta_seconds,
            &mut self.registry,
            &mut self.constraints,
            &mut self.detector,
        )
    }

    /// Perform exactly one fixed step
    pub fn step(&mut self) {
        self.simulator
            .step(&mut self.registry, &mut self.constraints, &mut self.detector);
    }

    // ==================== Collisions ====================

    /// Bodies overlapping a sphere, nearest first
    pub fn detect(&self, point: Vec3, radius: f32) -> Vec<ObjectId> {
        self.detector.detect(&self.registry, point, radius)
    }

    /// Whether two bodies collide right now
    pub fn check(&self, a: ObjectId, b: ObjectId) -> bool {
        self.detector.check(&self.registry, a, b)
    }

    /// Contact data for a pair
    pub fn result(&self, a: ObjectId, b: ObjectId) -> Option<CollisionResult> {
        self.detector.result(&self.registry, a, b)
    }

    /// Re-run detection without stepping
    pub fn refresh_collisions(&mut self) -> &[CollisionResult] {
        self.detector.update(&self.registry)
    }

    /// Contacts found by the last detection pass
    pub fn active_collisions(&self) -> &[CollisionResult] {
        self.detector.active_collisions()
    }

    /// Statistics of the last detection pass
    pub fn detector_stats(&self) -> DetectorStats {
        self.detector.stats()
    }

    // ==================== Queries ====================

    /// Get a query interface
    pub fn query(&self) -> SpatialQuery<'_> {
        SpatialQuery::new(&self.registry)
    }

    /// Read-only access to the registry
    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    // ==================== Debug ====================

    /// Number of bodies
    pub fn object_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of active bodies
    pub fn active_object_count(&self) -> usize {
        self.registry.active_count()
    }

    /// Number of active constraints
    pub fn active_constraint_count(&self) -> usize {
        self.constraints.active_count()
    }

    /// Length of the active collision list
    pub fn active_collision_count(&self) -> usize {
        self.detector.active_collisions().len()
    }
}
