//! Simulation scenarios for void_physics

use approx::assert_abs_diff_eq;
use void_physics::*;

fn zero_gravity() -> PhysicsConfig {
    PhysicsConfig::default()
        .with_gravity(GravityModel::None)
        .with_max_substeps(120)
}

#[test]
fn test_free_fall_one_second() {
    // Default timestep and substep bound cover a full second
    let config = PhysicsConfig::default().with_gravity(GravityModel::Uniform {
        acceleration: Vec3::new(0.0, -9.81, 0.0),
    });
    let mut world = PhysicsWorld::new(config).unwrap();
    let ball = world
        .create_object(ObjectDesc::dynamic(CollisionShape::sphere(0.1)).with_mass(1.0))
        .unwrap();

    let report = world.advance(1.0);
    assert_eq!(report.steps, 60);
    assert_eq!(report.dropped_time, 0.0);

    let state = world.get_state(ball).unwrap();
    assert_abs_diff_eq!(state.linear_velocity.y, -9.81, epsilon = 1e-3);
    assert_abs_diff_eq!(state.transform.position.y, -4.9, epsilon = 0.15);
}

#[test]
fn test_small_steps_match_one_big_step() {
    fn scene() -> (PhysicsWorld, Vec<ObjectId>) {
        let mut world = PhysicsWorld::new(PhysicsConfig::default().with_max_substeps(120)).unwrap();
        let anchor = world
            .create_object(ObjectDesc::fixed(CollisionShape::sphere(0.1)).with_position(Vec3::Y * 2.0))
            .unwrap();
        let bob = world
            .create_object(
                ObjectDesc::dynamic(CollisionShape::sphere(0.2))
                    .with_position(Vec3::new(0.5, 2.0, 0.0))
                    .with_linear_velocity(Vec3::Z),
            )
            .unwrap();
        let spinner = world
            .create_object(ObjectDesc::dynamic(CollisionShape::cuboid(0.1, 0.1, 0.1)).with_gravity(false))
            .unwrap();
        world
            .create_constraint(ConstraintDesc::ball_socket(anchor, bob, Vec3::Y * 2.0))
            .unwrap();
        world.apply_angular_impulse(spinner, Vec3::new(0.0, 0.01, 0.0));
        (world, vec![anchor, bob, spinner])
    }

    let (mut once, ids) = scene();
    once.advance(1.0);

    for divisions in [60, 120] {
        let (mut many, _) = scene();
        for _ in 0..divisions {
            many.advance(1.0 / divisions as f32);
        }
        for id in &ids {
            let a = once.get_state(*id).unwrap();
            let b = many.get_state(*id).unwrap();
            assert!(
                a.transform.position.abs_diff_eq(b.transform.position, 1e-4),
                "{} diverged with {} divisions",
                id,
                divisions
            );
            assert!(a.linear_velocity.abs_diff_eq(b.linear_velocity, 1e-4));
            assert!(a.transform.rotation.abs_diff_eq(b.transform.rotation, 1e-4));
        }
    }
}

#[test]
fn test_slider_converges_inside_limits() {
    let mut world = PhysicsWorld::new(zero_gravity()).unwrap();
    let rail = world.create_object(ObjectDesc::fixed(CollisionShape::sphere(0.05))).unwrap();
    let carriage = world
        .create_object(ObjectDesc::dynamic(CollisionShape::sphere(0.05)).with_position(Vec3::new(0.5, 0.0, 0.0)))
        .unwrap();
    world
        .create_constraint(ConstraintDesc::slider(rail, carriage, Vec3::ZERO, Vec3::X).with_limits(0.0, 1.0))
        .unwrap();

    world.apply_impulse(carriage, Vec3::new(100.0, 0.0, 0.0));
    for _ in 0..5 {
        world.advance(1.0);
    }

    let position = world.get_transform(carriage).unwrap().position;
    assert!(position.x <= 1.0 + 0.05, "carriage escaped to {}", position.x);
    assert!(position.x >= 0.0);
    assert_abs_diff_eq!(position.y, 0.0, epsilon = 1e-4);
}

#[test]
fn test_slider_respects_lower_limit() {
    let mut world = PhysicsWorld::new(zero_gravity()).unwrap();
    let rail = world.create_object(ObjectDesc::fixed(CollisionShape::sphere(0.05))).unwrap();
    let carriage = world
        .create_object(ObjectDesc::dynamic(CollisionShape::sphere(0.05)).with_position(Vec3::new(0.5, 0.0, 0.0)))
        .unwrap();
    let slider = world
        .create_constraint(ConstraintDesc::slider(rail, carriage, Vec3::ZERO, Vec3::X))
        .unwrap();
    world.set_constraint_limits(slider, 0.25, 0.75).unwrap();

    world.apply_impulse(carriage, Vec3::new(-50.0, 0.0, 0.0));
    world.advance(1.0);
    let x = world.get_transform(carriage).unwrap().position.x;
    assert!(x >= 0.25 - 0.05, "carriage escaped to {}", x);
}

#[test]
fn test_hinge_keeps_door_on_its_pivot() {
    let mut world = PhysicsWorld::new(zero_gravity()).unwrap();
    let frame = world.create_object(ObjectDesc::fixed(CollisionShape::cuboid(0.05, 1.0, 0.05))).unwrap();
    let door = world
        .create_object(ObjectDesc::dynamic(CollisionShape::cuboid(0.4, 1.0, 0.02)).with_position(Vec3::X * 0.45))
        .unwrap();
    world
        .create_constraint(ConstraintDesc::hinge(frame, door, Vec3::ZERO, Vec3::Y))
        .unwrap();

    // Shove the door sideways and up along the hinge
    world.apply_impulse(door, Vec3::new(0.0, 2.0, 3.0));
    world.advance(2.0);

    let constraint_anchor_in_door = Vec3::new(-0.45, 0.0, 0.0);
    let transform = world.get_transform(door).unwrap();
    let pivot = transform.point_to_world(constraint_anchor_in_door);
    assert!(pivot.length() < 0.1, "door drifted off its pivot: {:?}", pivot);
}

#[test]
fn test_hinge_limit_stops_door_swing() {
    let mut world = PhysicsWorld::new(zero_gravity()).unwrap();
    let frame = world.create_object(ObjectDesc::fixed(CollisionShape::cuboid(0.05, 1.0, 0.05))).unwrap();
    let door = world
        .create_object(ObjectDesc::dynamic(CollisionShape::cuboid(0.4, 1.0, 0.02)).with_position(Vec3::X * 0.45))
        .unwrap();
    let hinge = world
        .create_constraint(ConstraintDesc::hinge(frame, door, Vec3::ZERO, Vec3::Y))
        .unwrap();
    world
        .set_constraint_limits(hinge, 0.0, std::f32::consts::FRAC_PI_2)
        .unwrap();

    // Hard enough to swing several turns unchecked
    world.apply_angular_impulse(door, Vec3::Y * 5.0);
    world.advance(2.0);

    let rotation = world.get_transform(door).unwrap().rotation;
    let swing = 2.0 * rotation.y.atan2(rotation.w);
    assert!(swing <= std::f32::consts::FRAC_PI_2 + 0.05, "door swung past its stop: {}", swing);
    assert!(swing > 1.0, "door should reach the stop: {}", swing);
    assert!(world.get_state(door).unwrap().angular_velocity.y < 0.05);
}

#[test]
fn test_fixed_constraint_carries_body() {
    let mut world = PhysicsWorld::new(zero_gravity()).unwrap();
    let handle = world
        .create_object(ObjectDesc::kinematic(CollisionShape::sphere(0.05)).with_linear_velocity(Vec3::X))
        .unwrap();
    let blade = world
        .create_object(ObjectDesc::dynamic(CollisionShape::sphere(0.05)).with_position(Vec3::Y * 0.3))
        .unwrap();
    world.create_constraint(ConstraintDesc::fixed(handle, blade)).unwrap();

    world.advance(1.0);
    let handle_pos = world.get_transform(handle).unwrap().position;
    let blade_pos = world.get_transform(blade).unwrap().position;
    assert!((blade_pos - handle_pos).abs_diff_eq(Vec3::Y * 0.3, 0.05));
}

#[test]
fn test_radial_gravity_pulls_inward() {
    let config = PhysicsConfig::default().with_gravity(GravityModel::Radial {
        center: Vec3::ZERO,
        strength: 5.0,
    });
    let mut world = PhysicsWorld::new(config).unwrap();
    let id = world
        .create_object(ObjectDesc::dynamic(CollisionShape::sphere(0.1)).with_position(Vec3::new(10.0, 0.0, 0.0)))
        .unwrap();
    world.advance(1.0 / 60.0);
    assert!(world.get_state(id).unwrap().linear_velocity.x < 0.0);
}

#[test]
fn test_stall_drops_time() {
    let mut world = PhysicsWorld::new(PhysicsConfig::default()).unwrap();
    let report = world.advance(3.0);
    assert_eq!(report.steps, world.config().max_substeps);
    assert_abs_diff_eq!(report.dropped_time, 2.0, epsilon = 1e-3);
}
