//! Interaction engine - hands, verbs and per-frame orchestration
//!
//! Owns one physics world and one feedback dispatcher. Hand controllers are
//! mirrored by kinematic sphere proxies; interaction verbs resolve against
//! those proxies and emit the feedback preset of the target's category.

use crate::error::{InteractionError, Result};
use crate::monitor::{FrameCounts, PerformanceMetrics, PerformanceMonitor};
use crate::profile::{ComfortProfile, InteractionCategory, InteractionProfile};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use void_feedback::{
    FeedbackDispatcher, FeedbackSink, HapticFeedback, NullSink, TickSummary, VisualFeedback,
};
use void_physics::{
    BodyKind, CollisionShape, ContactEvent, ContactTracker, Hand, ObjectDesc, ObjectId,
    PhysicsError, PhysicsWorld, Transform, VrRole,
};

/// What a hand does to an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionVerb {
    Touch,
    Grab,
    Release,
    Push,
    Pull,
    Rotate,
    Open,
    Close,
}

impl std::fmt::Display for InteractionVerb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Touch => "touch",
            Self::Grab => "grab",
            Self::Release => "release",
            Self::Push => "push",
            Self::Pull => "pull",
            Self::Rotate => "rotate",
            Self::Open => "open",
            Self::Close => "close",
        };
        f.write_str(name)
    }
}

/// Outcome of a successful interaction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interaction {
    pub object: ObjectId,
    pub hand: Hand,
    pub verb: InteractionVerb,
    pub category: InteractionCategory,
    /// Linear impulse handed to the object
    pub impulse: Vec3,
    /// Angular impulse handed to the object
    pub angular_impulse: Vec3,
    /// Whether the object was dynamic and actually received the impulses
    pub applied: bool,
}

/// Summary of one [`InteractionEngine::update`]
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    /// Fixed physics steps taken
    pub steps: u32,
    /// Simulation time discarded because the step bound was hit
    pub dropped_time: f32,
    /// Hand contact phase changes
    pub contacts: Vec<ContactEvent>,
    pub feedback: TickSummary,
    pub metrics: PerformanceMetrics,
}

#[derive(Debug, Clone, Copy)]
struct Grip {
    object: ObjectId,
    previous_kind: BodyKind,
    /// Object pose in the hand's frame
    local_position: Vec3,
    local_rotation: Quat,
}

#[derive(Debug, Clone, Copy)]
struct HandProxy {
    id: ObjectId,
    last_position: Vec3,
    velocity: Vec3,
    grip: Option<Grip>,
}

/// Hand-driven interaction engine
pub struct InteractionEngine {
    profile: InteractionProfile,
    world: PhysicsWorld,
    dispatcher: Arc<FeedbackDispatcher>,
    sink: Box<dyn FeedbackSink + Send>,
    hands: [Option<HandProxy>; 2],
    categories: BTreeMap<ObjectId, InteractionCategory>,
    contacts: ContactTracker,
    monitor: PerformanceMonitor,
}

impl std::fmt::Debug for InteractionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionEngine")
            .field("profile", &self.profile.name)
            .field("objects", &self.world.object_count())
            .field("hands", &self.hands)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

impl InteractionEngine {
    /// Create an engine from a validated profile
    pub fn new(profile: InteractionProfile) -> Result<Self> {
        profile.validate()?;
        let world = PhysicsWorld::new(profile.physics.clone())?;
        let dispatcher = Arc::new(FeedbackDispatcher::new(profile.feedback));

        log::info!(
            "Interaction engine '{}' ready (integrator: {})",
            profile.name,
            world.integrator_name()
        );

        Ok(Self {
            profile,
            world,
            dispatcher,
            sink: Box::new(NullSink),
            hands: [None, None],
            categories: BTreeMap::new(),
            contacts: ContactTracker::new(),
            monitor: PerformanceMonitor::default(),
        })
    }

    /// Engine with the built-in profile
    pub fn with_defaults() -> Result<Self> {
        Self::new(InteractionProfile::default())
    }

    // ==================== Accessors ====================

    /// The active profile
    pub fn profile(&self) -> &InteractionProfile {
        &self.profile
    }

    /// Replace comfort settings; applies to feedback emitted from now on.
    /// Invalid settings are rejected and the current ones kept.
    pub fn set_comfort(&mut self, comfort: ComfortProfile) -> Result<()> {
        comfort.validate()?;
        log::info!("Comfort settings changed: {:?}", comfort);
        self.profile.comfort = comfort;
        Ok(())
    }

    /// The physics world
    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    /// Mutable physics world, for scene setup beyond what the engine wraps
    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    /// Shared handle to the dispatcher, for producers on other threads
    pub fn dispatcher(&self) -> &Arc<FeedbackDispatcher> {
        &self.dispatcher
    }

    /// Install the sink that receives feedback on each update, returning the old one
    pub fn set_sink(&mut self, sink: Box<dyn FeedbackSink + Send>) -> Box<dyn FeedbackSink + Send> {
        std::mem::replace(&mut self.sink, sink)
    }

    /// Performance snapshot
    pub fn metrics(&self) -> PerformanceMetrics {
        self.monitor.metrics()
    }

    /// The performance monitor
    pub fn monitor_mut(&mut self) -> &mut PerformanceMonitor {
        &mut self.monitor
    }

    // ==================== Objects ====================

    /// Add an interactable object
    pub fn register_object(&mut self, desc: ObjectDesc, category: InteractionCategory) -> Result<ObjectId> {
        let id = self.world.create_object(desc)?;
        self.categories.insert(id, category);
        log::debug!("Registered {} object {}", category, id);
        Ok(id)
    }

    /// Remove an object, dropping any grip on it
    pub fn remove_object(&mut self, id: ObjectId) -> Result<()> {
        if self.hand_of_proxy(id).is_some() {
            return Err(InteractionError::HandProxy(id));
        }
        for proxy in self.hands.iter_mut().flatten() {
            if proxy.grip.map(|g| g.object) == Some(id) {
                proxy.grip = None;
            }
        }
        self.world.destroy_object(id)?;
        self.categories.remove(&id);
        self.dispatcher.clear_visual_feedback(id);
        Ok(())
    }

    /// Change an object's category
    pub fn set_category(&mut self, id: ObjectId, category: InteractionCategory) -> Result<()> {
        if self.world.get_object(id).is_none() {
            return Err(PhysicsError::ObjectNotFound(id).into());
        }
        self.categories.insert(id, category);
        Ok(())
    }

    /// Category of an object; unregistered objects are generic
    pub fn category(&self, id: ObjectId) -> InteractionCategory {
        self.categories.get(&id).copied().unwrap_or_default()
    }

    // ==================== Hands ====================

    /// Create the proxy for a hand, or move the existing one
    pub fn spawn_hand(&mut self, hand: Hand, pose: Transform) -> Result<ObjectId> {
        let slot = slot(hand)?;
        if let Some(proxy) = self.hands[slot] {
            self.world.set_transform(proxy.id, pose)?;
            return Ok(proxy.id);
        }

        let index = slot as u32;
        let id = self.world.create_object(
            ObjectDesc::kinematic(CollisionShape::sphere(self.profile.hands.radius))
                .with_transform(pose)
                .with_role(VrRole::Controller(index))
                .with_gravity(false),
        )?;
        self.hands[slot] = Some(HandProxy {
            id,
            last_position: pose.position,
            velocity: Vec3::ZERO,
            grip: None,
        });

        log::debug!("Spawned {:?} hand proxy {}", hand, id);
        Ok(id)
    }

    /// Remove a hand proxy, releasing whatever it holds
    pub fn despawn_hand(&mut self, hand: Hand) -> Result<()> {
        let slot = slot(hand)?;
        let proxy = self.hands[slot].ok_or(InteractionError::HandNotSpawned(hand))?;
        if let Some(grip) = proxy.grip {
            self.release_grip(slot, grip)?;
        }
        self.hands[slot] = None;
        self.world.destroy_object(proxy.id)?;
        self.dispatcher.clear_haptic_feedback(hand);
        Ok(())
    }

    /// Move a hand proxy to the tracked controller pose
    pub fn set_hand_pose(&mut self, hand: Hand, pose: Transform) -> Result<()> {
        let proxy = self.proxy(hand)?;
        self.world.set_transform(proxy.id, pose)?;
        Ok(())
    }

    /// Proxy body of a hand
    pub fn hand_proxy(&self, hand: Hand) -> Option<ObjectId> {
        slot(hand).ok().and_then(|s| self.hands[s]).map(|p| p.id)
    }

    /// Hand velocity estimated at the last update
    pub fn hand_velocity(&self, hand: Hand) -> Option<Vec3> {
        slot(hand).ok().and_then(|s| self.hands[s]).map(|p| p.velocity)
    }

    /// Object held by a hand
    pub fn held_object(&self, hand: Hand) -> Option<ObjectId> {
        slot(hand)
            .ok()
            .and_then(|s| self.hands[s])
            .and_then(|p| p.grip)
            .map(|g| g.object)
    }

    // ==================== Interactions ====================

    /// Perform a verb on an object with one hand
    pub fn interact(&mut self, object: ObjectId, hand: Hand, verb: InteractionVerb) -> Result<Interaction> {
        let slot = slot(hand)?;
        let proxy = self.proxy(hand)?;
        if self.hand_of_proxy(object).is_some() {
            return Err(InteractionError::HandProxy(object));
        }
        let (kind, pose) = self
            .world
            .get_object(object)
            .map(|o| (o.kind, o.transform))
            .ok_or(PhysicsError::ObjectNotFound(object))?;
        let hand_pose = self
            .world
            .get_transform(proxy.id)
            .ok_or(PhysicsError::ObjectNotFound(proxy.id))?;

        let category = self.category(object);
        let mut outcome = Interaction {
            object,
            hand,
            verb,
            category,
            impulse: Vec3::ZERO,
            angular_impulse: Vec3::ZERO,
            applied: kind.is_dynamic(),
        };

        match verb {
            InteractionVerb::Touch => {
                self.require_contact(proxy.id, object, hand)?;
            }
            InteractionVerb::Grab => {
                if let Some(grip) = proxy.grip {
                    return Err(InteractionError::HandOccupied { hand, held: grip.object });
                }
                if let Some(other) = self.holder_of(object) {
                    return Err(InteractionError::AlreadyHeld { object, hand: other });
                }
                if matches!(kind, BodyKind::Static | BodyKind::Trigger) {
                    return Err(InteractionError::NotGrabbable(object));
                }
                self.require_contact(proxy.id, object, hand)?;

                let previous_kind = self.world.set_kind(object, BodyKind::Kinematic)?;
                self.world.set_linear_velocity(object, Vec3::ZERO)?;
                self.world.set_angular_velocity(object, Vec3::ZERO)?;

                let inverse = hand_pose.rotation.inverse();
                self.set_grip(
                    slot,
                    Some(Grip {
                        object,
                        previous_kind,
                        local_position: inverse * (pose.position - hand_pose.position),
                        local_rotation: inverse * pose.rotation,
                    }),
                );
                outcome.applied = true;
            }
            InteractionVerb::Release => {
                let grip = proxy.grip.ok_or(InteractionError::NothingHeld(hand))?;
                if grip.object != object {
                    return Err(InteractionError::NotHolding { hand, object });
                }
                outcome.impulse = self.release_grip(slot, grip)?;
                outcome.applied = grip.previous_kind.is_dynamic();
                log::debug!("{:?} hand released {}", hand, object);
                return Ok(outcome);
            }
            InteractionVerb::Push | InteractionVerb::Pull => {
                self.require_contact(proxy.id, object, hand)?;
                let forward = hand_pose.rotation * Vec3::NEG_Z;
                let direction = (pose.position - hand_pose.position).normalize_or_zero();
                let direction = if direction == Vec3::ZERO { forward } else { direction };
                let sign = if verb == InteractionVerb::Push { 1.0 } else { -1.0 };

                outcome.impulse = direction * self.profile.hands.push_strength * sign;
                self.world.apply_impulse(object, outcome.impulse);
            }
            InteractionVerb::Rotate => {
                let up = hand_pose.rotation * Vec3::Y;
                outcome.angular_impulse = up * self.profile.hands.rotate_strength;
                self.world.apply_angular_impulse(object, outcome.angular_impulse);
            }
            InteractionVerb::Open | InteractionVerb::Close => {
                let axis = self.world.hinge_axis(object).unwrap_or(Vec3::Y);
                let sign = if verb == InteractionVerb::Open { 1.0 } else { -1.0 };

                outcome.angular_impulse = axis * self.profile.hands.rotate_strength * sign;
                self.world.apply_angular_impulse(object, outcome.angular_impulse);
            }
        }

        self.emit_feedback(object, hand, category, pose.position);
        log::debug!("{:?} hand: {} {} ({})", hand, verb, object, category);
        Ok(outcome)
    }

    // ==================== Frame ====================

    /// Run one VR frame
    ///
    /// Estimates hand velocities, moves held objects with their hands,
    /// advances the world, emits touch feedback for new hand contacts and
    /// forwards queued feedback into the installed sink.
    pub fn update(&mut self, dt: f32) -> FrameReport {
        let start = Instant::now();
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        self.track_hands(dt);
        self.follow_hands();

        let step = self.world.advance(dt);

        let proxies: Vec<ObjectId> = self.hands.iter().flatten().map(|p| p.id).collect();
        let contacts = self.contacts.update(self.world.active_collisions(), |c| {
            proxies.contains(&c.object_a) || proxies.contains(&c.object_b)
        });
        for event in contacts.iter().filter(|e| e.is_enter()) {
            self.touch_feedback(event);
        }

        let feedback = self.dispatcher.tick(dt, self.sink.as_mut());

        let collision_time = (step.steps > 0).then(|| self.world.detector_stats().elapsed);
        self.monitor.record(
            start.elapsed(),
            collision_time,
            FrameCounts {
                objects: self.world.active_object_count(),
                constraints: self.world.active_constraint_count(),
                collisions: self.world.active_collision_count(),
            },
        );

        FrameReport {
            steps: step.steps,
            dropped_time: step.dropped_time,
            contacts,
            feedback,
            metrics: self.monitor.metrics(),
        }
    }

    // ==================== Internals ====================

    fn proxy(&self, hand: Hand) -> Result<HandProxy> {
        self.hands[slot(hand)?].ok_or(InteractionError::HandNotSpawned(hand))
    }

    fn set_grip(&mut self, slot: usize, grip: Option<Grip>) {
        if let Some(proxy) = self.hands[slot].as_mut() {
            proxy.grip = grip;
        }
    }

    fn hand_of_proxy(&self, id: ObjectId) -> Option<Hand> {
        self.hands
            .iter()
            .enumerate()
            .find(|(_, p)| p.map(|p| p.id) == Some(id))
            .and_then(|(i, _)| Hand::from_controller_index(i as u32))
    }

    fn holder_of(&self, object: ObjectId) -> Option<Hand> {
        self.hands
            .iter()
            .enumerate()
            .find(|(_, p)| p.and_then(|p| p.grip).map(|g| g.object) == Some(object))
            .and_then(|(i, _)| Hand::from_controller_index(i as u32))
    }

    fn require_contact(&self, proxy: ObjectId, object: ObjectId, hand: Hand) -> Result<()> {
        if self.world.check(proxy, object) {
            Ok(())
        } else {
            Err(InteractionError::OutOfReach { object, hand })
        }
    }

    /// Restore the held object's kind and hand over the hand velocity
    fn release_grip(&mut self, slot: usize, grip: Grip) -> Result<Vec3> {
        self.set_grip(slot, None);
        let velocity = self.hands[slot].map(|p| p.velocity).unwrap_or(Vec3::ZERO);

        self.world.set_kind(grip.object, grip.previous_kind)?;
        if !grip.previous_kind.is_dynamic() {
            return Ok(Vec3::ZERO);
        }

        let throw = velocity * self.profile.hands.throw_scale;
        self.world.set_linear_velocity(grip.object, throw)?;
        let mass = self.world.get_object(grip.object).map(|o| o.mass).unwrap_or(0.0);
        Ok(throw * mass)
    }

    fn track_hands(&mut self, dt: f32) {
        for proxy in self.hands.iter_mut().flatten() {
            let Some(pose) = self.world.get_transform(proxy.id) else {
                continue;
            };
            if dt > 0.0 {
                proxy.velocity = (pose.position - proxy.last_position) / dt;
            }
            proxy.last_position = pose.position;
        }
    }

    fn follow_hands(&mut self) {
        for slot in 0..self.hands.len() {
            let Some(proxy) = self.hands[slot] else {
                continue;
            };
            let Some(grip) = proxy.grip else {
                continue;
            };
            let (Some(hand_pose), Some(held)) = (
                self.world.get_transform(proxy.id),
                self.world.get_transform(grip.object),
            ) else {
                log::warn!("Held object {} vanished, dropping grip", grip.object);
                self.set_grip(slot, None);
                continue;
            };

            let pose = Transform {
                position: hand_pose.position + hand_pose.rotation * grip.local_position,
                rotation: hand_pose.rotation * grip.local_rotation,
                scale: held.scale,
            };
            if let Err(e) = self.world.set_transform(grip.object, pose) {
                log::warn!("Could not move held object {}: {}", grip.object, e);
            }
        }
    }

    fn touch_feedback(&self, event: &ContactEvent) {
        let (proxy_hand, other) = match (self.hand_of_proxy(event.object_a), self.hand_of_proxy(event.object_b)) {
            (Some(hand), _) => (hand, event.object_b),
            (None, Some(hand)) => (hand, event.object_a),
            (None, None) => return,
        };
        if self.hand_of_proxy(other).is_some() || self.held_object(proxy_hand) == Some(other) {
            return;
        }
        self.emit_feedback(other, proxy_hand, self.category(other), event.point);
    }

    fn emit_feedback(&self, object: ObjectId, hand: Hand, category: InteractionCategory, position: Vec3) {
        let preset = self.profile.preset(category);
        let comfort = &self.profile.comfort;

        self.dispatcher.add_haptic_feedback(
            HapticFeedback::new(
                hand,
                preset.haptic,
                comfort.haptic_intensity(preset.intensity),
                preset.duration,
            )
            .at(position),
        );

        if let (Some(color), false) = (preset.highlight, comfort.performance_mode) {
            self.dispatcher.add_visual_feedback(VisualFeedback::new(
                object,
                color,
                comfort.visual_intensity(preset.highlight_intensity),
            ));
        }
    }
}

fn slot(hand: Hand) -> Result<usize> {
    hand.controller_index()
        .map(|i| i as usize)
        .ok_or(InteractionError::AmbiguousHand(hand))
}
