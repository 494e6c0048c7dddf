//! Scripted sandbox scene

use void_interaction::prelude::*;
use void_interaction::Result;

const FRAME: f32 = 1.0 / 90.0;

/// Ids of the scene objects
pub struct Room {
    pub door: ObjectId,
    pub cup: ObjectId,
    pub crate_box: ObjectId,
}

impl Room {
    /// Populate the engine with a floor, a hinged door, a cup and a crate
    pub fn build(engine: &mut InteractionEngine) -> Result<Self> {
        engine.register_object(
            ObjectDesc::fixed(CollisionShape::cuboid(5.0, 0.05, 5.0)).with_position(Vec3::new(0.0, -0.05, 0.0)),
            InteractionCategory::Environment,
        )?;

        let frame = engine.register_object(
            ObjectDesc::fixed(CollisionShape::cuboid(0.05, 1.0, 0.05)).with_position(Vec3::new(1.0, 1.0, -1.0)),
            InteractionCategory::Environment,
        )?;
        let door = engine.register_object(
            ObjectDesc::dynamic(CollisionShape::cuboid(0.4, 1.0, 0.02))
                .with_position(Vec3::new(1.45, 1.0, -1.0))
                .with_mass(8.0)
                .with_gravity(false),
            InteractionCategory::Door,
        )?;
        let hinge = engine.world_mut().create_constraint(ConstraintDesc::hinge(
            frame,
            door,
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::Y,
        ))?;
        engine.world_mut().set_constraint_limits(hinge, 0.0, std::f32::consts::FRAC_PI_2)?;

        let cup = engine.register_object(
            ObjectDesc::dynamic(CollisionShape::cylinder(0.05, 0.04))
                .with_position(Vec3::new(-0.3, 0.9, -0.4))
                .with_mass(0.3)
                .with_gravity(false),
            InteractionCategory::Inventory,
        )?;
        let crate_box = engine.register_object(
            ObjectDesc::dynamic(CollisionShape::cuboid(0.2, 0.2, 0.2))
                .with_position(Vec3::new(0.3, 0.2, -0.6))
                .with_mass(4.0),
            InteractionCategory::Generic,
        )?;

        engine.spawn_hand(Hand::Left, Transform::from_position(Vec3::new(-0.3, 1.1, -0.2)))?;
        engine.spawn_hand(Hand::Right, Transform::from_position(Vec3::new(0.3, 1.1, -0.2)))?;

        Ok(Self { door, cup, crate_box })
    }
}

/// What the script managed to do
#[derive(Debug, Default)]
pub struct Outcome {
    pub performed: usize,
    pub rejected: usize,
}

impl Outcome {
    fn attempt(&mut self, engine: &mut InteractionEngine, object: ObjectId, hand: Hand, verb: InteractionVerb) {
        match engine.interact(object, hand, verb) {
            Ok(done) => {
                log::info!("{:?} hand {} {} ({})", hand, verb, object, done.category);
                self.performed += 1;
            }
            Err(e) => {
                log::warn!("{:?} hand could not {} {}: {}", hand, verb, object, e);
                self.rejected += 1;
            }
        }
    }
}

/// Move a hand in a straight line over `frames` frames
fn sweep(engine: &mut InteractionEngine, hand: Hand, from: Vec3, to: Vec3, frames: u32) -> Result<()> {
    for i in 1..=frames {
        let t = i as f32 / frames as f32;
        engine.set_hand_pose(hand, Transform::from_position(from.lerp(to, t)))?;
        let report = engine.update(FRAME);
        for contact in report.contacts.iter().filter(|c| c.is_enter()) {
            log::debug!("Contact enter: {} / {}", contact.object_a, contact.object_b);
        }
    }
    Ok(())
}

fn idle(engine: &mut InteractionEngine, frames: u32) {
    for _ in 0..frames {
        engine.update(FRAME);
    }
}

/// Run the interaction script
pub fn play(engine: &mut InteractionEngine, room: &Room) -> Result<Outcome> {
    let mut outcome = Outcome::default();

    // Reach for the cup, pick it up and toss it
    let left_start = Vec3::new(-0.3, 1.1, -0.2);
    let at_cup = Vec3::new(-0.3, 0.95, -0.4);
    sweep(engine, Hand::Left, left_start, at_cup, 20)?;
    outcome.attempt(engine, room.cup, Hand::Left, InteractionVerb::Touch);
    outcome.attempt(engine, room.cup, Hand::Left, InteractionVerb::Grab);
    sweep(engine, Hand::Left, at_cup, Vec3::new(-0.1, 1.3, -0.6), 15)?;
    outcome.attempt(engine, room.cup, Hand::Left, InteractionVerb::Release);
    idle(engine, 30);

    // Shove the crate
    let right_start = Vec3::new(0.3, 1.1, -0.2);
    let at_crate = Vec3::new(0.3, 0.35, -0.4);
    sweep(engine, Hand::Right, right_start, at_crate, 25)?;
    outcome.attempt(engine, room.crate_box, Hand::Right, InteractionVerb::Push);
    idle(engine, 45);

    // Swing the door open and back
    outcome.attempt(engine, room.door, Hand::Right, InteractionVerb::Open);
    idle(engine, 60);
    outcome.attempt(engine, room.door, Hand::Right, InteractionVerb::Close);
    idle(engine, 60);

    // Out of reach on purpose
    outcome.attempt(engine, room.door, Hand::Left, InteractionVerb::Grab);

    Ok(outcome)
}
