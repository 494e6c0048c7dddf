//! Scenario tests for the interaction engine

use std::sync::Arc;
use std::thread;
use void_interaction::*;

const FRAME: f32 = 1.0 / 90.0;

fn floating_engine() -> InteractionEngine {
    let profile = InteractionProfile::default()
        .with_physics(PhysicsConfig::vr().with_gravity(GravityModel::None));
    InteractionEngine::new(profile).expect("valid profile")
}

/// INVARIANT: Open and close follow the object's hinge axis
#[test]
fn invariant_open_uses_hinge_axis() {
    let mut engine = floating_engine();
    engine.spawn_hand(Hand::Right, Transform::from_position(Vec3::new(0.8, 0.0, 0.0))).unwrap();

    let frame = engine
        .register_object(ObjectDesc::fixed(CollisionShape::cuboid(0.05, 0.05, 1.0)), InteractionCategory::Environment)
        .unwrap();
    let hatch = engine
        .register_object(
            ObjectDesc::dynamic(CollisionShape::cuboid(0.4, 0.02, 1.0)).with_position(Vec3::X * 0.45),
            InteractionCategory::Door,
        )
        .unwrap();
    engine
        .world_mut()
        .create_constraint(ConstraintDesc::hinge(frame, hatch, Vec3::ZERO, Vec3::Z))
        .unwrap();

    let open = engine.interact(hatch, Hand::Right, InteractionVerb::Open).unwrap();
    assert!(open.applied);
    assert!(open.angular_impulse.z > 0.0);
    assert!(engine.world().get_object(hatch).unwrap().angular_velocity.z > 0.0);

    for _ in 0..30 {
        engine.update(FRAME);
    }
    let swung = engine.world().get_transform(hatch).unwrap().rotation;
    assert!(swung.angle_between(Quat::IDENTITY) > 0.01);
}

/// INVARIANT: Touch feedback fires on contact enter only, not while staying
#[test]
fn invariant_touch_feedback_on_enter() {
    let mut engine = floating_engine();
    let (sink, receiver) = ChannelSink::unbounded();
    engine.set_sink(Box::new(sink));

    engine.spawn_hand(Hand::Left, Transform::from_position(Vec3::new(-1.0, 0.0, 0.0))).unwrap();
    engine
        .register_object(ObjectDesc::fixed(CollisionShape::sphere(0.1)), InteractionCategory::Npc)
        .unwrap();

    let report = engine.update(FRAME);
    assert!(report.contacts.is_empty());

    engine.set_hand_pose(Hand::Left, Transform::from_position(Vec3::new(0.1, 0.0, 0.0))).unwrap();
    let report = engine.update(FRAME);
    assert_eq!(report.contacts.len(), 1);
    assert!(report.contacts[0].is_enter());
    assert_eq!(report.feedback.visual_forwarded, 1);

    let report = engine.update(FRAME);
    assert_eq!(report.contacts[0].event_type, ContactEventType::Stay);
    assert_eq!(report.feedback.visual_forwarded, 0);

    engine.set_hand_pose(Hand::Left, Transform::from_position(Vec3::new(2.0, 0.0, 0.0))).unwrap();
    let report = engine.update(FRAME);
    assert!(report.contacts[0].is_exit());

    let visuals = receiver
        .try_iter()
        .filter(|e| matches!(e, FeedbackEvent::Visual(_)))
        .count();
    assert_eq!(visuals, 1);
}

/// INVARIANT: A released object inherits the hand's velocity
#[test]
fn invariant_release_throws() {
    let mut engine = floating_engine();
    engine.spawn_hand(Hand::Right, Transform::IDENTITY).unwrap();
    let ball = engine
        .register_object(
            ObjectDesc::dynamic(CollisionShape::sphere(0.04)).with_mass(0.5),
            InteractionCategory::Generic,
        )
        .unwrap();

    engine.interact(ball, Hand::Right, InteractionVerb::Grab).unwrap();
    for i in 1..=5 {
        let pose = Transform::from_position(Vec3::new(0.0, 0.0, -0.02 * i as f32));
        engine.set_hand_pose(Hand::Right, pose).unwrap();
        engine.update(FRAME);
    }

    let hand_velocity = engine.hand_velocity(Hand::Right).unwrap();
    assert!((hand_velocity.z - (-0.02 / FRAME)).abs() < 1e-2);

    let release = engine.interact(ball, Hand::Right, InteractionVerb::Release).unwrap();
    let object = engine.world().get_object(ball).unwrap();
    assert_eq!(object.kind, BodyKind::Dynamic);
    assert!((object.linear_velocity - hand_velocity).length() < 1e-4);
    assert!((release.impulse - hand_velocity * 0.5).length() < 1e-4);
}

/// INVARIANT: Destroying a held object drops the grip instead of failing later frames
#[test]
fn invariant_removed_object_releases_grip() {
    let mut engine = floating_engine();
    engine.spawn_hand(Hand::Left, Transform::IDENTITY).unwrap();
    let cup = engine
        .register_object(ObjectDesc::dynamic(CollisionShape::sphere(0.03)), InteractionCategory::Inventory)
        .unwrap();

    engine.interact(cup, Hand::Left, InteractionVerb::Grab).unwrap();
    engine.remove_object(cup).unwrap();
    assert!(engine.held_object(Hand::Left).is_none());

    engine.update(FRAME);
    assert!(matches!(
        engine.interact(cup, Hand::Left, InteractionVerb::Touch),
        Err(InteractionError::Physics(PhysicsError::ObjectNotFound(_)))
    ));
}

/// INVARIANT: Feedback queued from other threads reaches the sink on the next update
#[test]
fn invariant_cross_thread_feedback() {
    let mut engine = floating_engine();
    let (sink, receiver) = ChannelSink::unbounded();
    engine.set_sink(Box::new(sink));

    let dispatcher = Arc::clone(engine.dispatcher());
    thread::spawn(move || {
        for _ in 0..10 {
            dispatcher.add_haptic_feedback(HapticFeedback::preset(Hand::Right, HapticCategory::Heavy));
        }
    })
    .join()
    .unwrap();

    let report = engine.update(FRAME);
    assert_eq!(report.feedback.haptic_forwarded, 10);
    assert_eq!(receiver.try_iter().count(), 10);
}

/// INVARIANT: Profiles load from disk and drive the engine
#[test]
fn invariant_profile_from_file() {
    let path = std::env::temp_dir().join(format!("void_interaction_profile_{}.toml", std::process::id()));
    std::fs::write(
        &path,
        r#"
[profile]
name = "file-backed"

[physics]
preset = "fast"

[hands]
radius = 0.1
push_strength = 3.0
"#,
    )
    .unwrap();

    let profile = load_profile(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let mut engine = InteractionEngine::new(profile).unwrap();
    assert_eq!(engine.profile().name, "file-backed");
    let hand = engine.spawn_hand(Hand::Left, Transform::IDENTITY).unwrap();
    assert!((engine.world().get_object(hand).unwrap().effective_radius() - 0.1).abs() < 1e-6);

    let block = engine
        .register_object(
            ObjectDesc::dynamic(CollisionShape::sphere(0.05)).with_position(Vec3::Y * 0.1),
            InteractionCategory::Puzzle,
        )
        .unwrap();
    let push = engine.interact(block, Hand::Left, InteractionVerb::Push).unwrap();
    assert!((push.impulse - Vec3::Y * 3.0).length() < 1e-5);

    assert!(matches!(load_profile("/nonexistent/profile.toml"), Err(ProfileError::Io(_))));
}

/// INVARIANT: Metrics track every update and the active counts
#[test]
fn invariant_metrics_follow_frames() {
    let mut engine = floating_engine();
    engine.spawn_hand(Hand::Left, Transform::IDENTITY).unwrap();
    for i in 0..4 {
        engine
            .register_object(
                ObjectDesc::dynamic(CollisionShape::sphere(0.05)).with_position(Vec3::X * i as f32),
                InteractionCategory::Generic,
            )
            .unwrap();
    }

    for _ in 0..3 {
        engine.update(FRAME);
    }

    let metrics = engine.metrics();
    assert_eq!(metrics.frames, 3);
    assert_eq!(metrics.active_objects, 5);
    assert_eq!(metrics.active_collisions, 1);
    assert!(metrics.peak_tick_time >= metrics.tick_time);
}
