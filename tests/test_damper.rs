use approx::assert_relative_eq;
use ktree::*;
use nalgebra::{Point3, Vector6};

fn ball(radius: f64) -> Collision<f64> {
    Collision::new("ball", Isometry3::identity(), Geometry::Sphere { radius })
}

/// one prismatic joint along x carrying a ball
fn slider() -> Robot<f64> {
    let mut links = split_ets(&[Et3::joint_tx(), Et3::tx(0.0)]);
    links[0].collisions.push(ball(0.25));
    RobotBuilder::new().links(links).build().unwrap()
}

#[test]
fn test_no_rows_beyond_influence_distance() {
    let robot = slider();
    let config = DamperConfig::default();
    let far = Shape::sphere(0.25, Point3::new(3.0, 0.0, 0.0));
    assert!(robot
        .link_collision_damper(&far, &[0.0], &Scope::new(), &config)
        .unwrap()
        .is_none());
}

#[test]
fn test_influence_distance_is_exclusive() {
    let robot = slider();
    let config = DamperConfig {
        di: 1.0,
        ds: 0.5,
        xi: 1.0,
    };
    // surfaces exactly 1.0 apart
    let obstacle = Shape::sphere(0.25, Point3::new(1.5, 0.0, 0.0));
    assert!(robot
        .link_collision_damper(&obstacle, &[0.0], &Scope::new(), &config)
        .unwrap()
        .is_none());
}

#[test]
fn test_bound_at_minimum_distance_is_the_obstacle_speed() {
    let robot = slider();
    let config = DamperConfig {
        di: 1.0,
        ds: 0.5,
        xi: 1.0,
    };
    let obstacle = Shape::sphere(0.25, Point3::new(1.0, 0.0, 0.0))
        .with_velocity(Vector6::new(0.1, 0.0, 0.0, 0.0, 0.0, 0.0));
    let c = robot
        .link_collision_damper(&obstacle, &[0.0], &Scope::new(), &config)
        .unwrap()
        .unwrap();
    assert_eq!(c.len(), 1);
    assert_relative_eq!(c.a[(0, 0)], 1.0, epsilon = 1e-12);
    assert_relative_eq!(c.b[0], 0.1, epsilon = 1e-12);
}

#[test]
fn test_invalid_parameters() {
    let robot = slider();
    let config = DamperConfig {
        di: 0.1,
        ds: 0.1,
        xi: 1.0,
    };
    let obstacle = Shape::sphere(0.25, Point3::new(1.0, 0.0, 0.0));
    assert_eq!(
        robot
            .link_collision_damper(&obstacle, &[0.0], &Scope::new(), &config)
            .unwrap_err(),
        Error::InvalidDamperParameters
    );
}

#[test]
fn test_collision_override_list() {
    // x then y slider, no shapes of its own
    let robot = Robot::from_ets(&[Et3::joint_tx(), Et3::joint_ty(), Et3::tx(0.0)]).unwrap();
    let obstacle = Shape::sphere(0.1, Point3::new(0.0, 0.5, 0.0));
    let config = DamperConfig {
        di: 0.5,
        ds: 0.05,
        xi: 1.0,
    };
    assert!(robot
        .link_collision_damper(&obstacle, &[0.0, 0.0], &Scope::new(), &config)
        .unwrap()
        .is_none());

    let list = vec![vec![], vec![ball(0.1)]];
    let c = robot
        .link_collision_damper(
            &obstacle,
            &[0.0, 0.0],
            &Scope::new().collisions(&list),
            &config,
        )
        .unwrap()
        .unwrap();
    // the second joint and the fixed link after it share the entry
    assert_eq!(c.a.shape(), (2, 2));
    assert_relative_eq!(c.a[(0, 0)], 0.0, epsilon = 1e-12);
    assert_relative_eq!(c.a[(0, 1)], 1.0, epsilon = 1e-12);
    assert_relative_eq!(c.b[0], 0.25 / 0.45, epsilon = 1e-12);
}

#[test]
fn test_sub_path_rows() {
    let mut links = split_ets(&[Et3::joint_tx(), Et3::joint_tz(), Et3::tx(0.0)]);
    links[1].collisions.push(ball(0.1));
    let robot = RobotBuilder::new().links(links).build().unwrap();
    let obstacle = Shape::sphere(0.1, Point3::new(0.0, 0.0, 0.4));
    let scope = Scope::new().start("link1".into());
    let c = robot
        .link_collision_damper(&obstacle, &[0.0, 0.0], &scope, &DamperConfig::default())
        .unwrap()
        .unwrap();
    assert_eq!(c.a.shape(), (1, 1));
    assert_relative_eq!(c.a[(0, 0)], 1.0, epsilon = 1e-12);
    assert_relative_eq!(c.b[0], 0.15 / 0.25, epsilon = 1e-12);
}

/// one prismatic joint along z carrying a ball
fn lifter() -> Robot<f64> {
    let mut links = split_ets(&[Et3::joint_tz(), Et3::tx(0.0)]);
    links[0].collisions.push(ball(0.1));
    RobotBuilder::new().links(links).build().unwrap()
}

#[test]
fn test_line_of_sight_from_fixed_camera() {
    let robot = lifter();
    let camera = Camera::Pose(Isometry3::translation(-1.0, 0.0, 0.3));
    let target = Shape::sphere(0.05, Point3::new(1.0, 0.0, 0.3));
    let config = DamperConfig::default();
    let c = robot
        .vision_collision_damper(&target, &camera, &[0.0], &Scope::new(), &config)
        .unwrap()
        .unwrap();
    // the line of sight passes 0.3 above the ball center
    let d = 0.3 - 0.1 - 0.001;
    assert_eq!(c.a.shape(), (1, 1));
    assert_relative_eq!(c.a[(0, 0)], 1.0, epsilon = 1e-9);
    assert_relative_eq!(c.b[0], (d - 0.05) / 0.25, epsilon = 1e-9);

    let rising = target
        .clone()
        .with_velocity(Vector6::new(0.0, 0.0, 0.2, 0.0, 0.0, 0.0));
    let c = robot
        .vision_collision_damper(&rising, &camera, &[0.0], &Scope::new(), &config)
        .unwrap()
        .unwrap();
    // the closest point of the line of sight is half way to the target
    assert_relative_eq!(c.b[0], (d - 0.05) / 0.25 + 0.1, epsilon = 1e-5);

    let blind = Camera::Pose(Isometry3::translation(1.0, 0.0, 0.3));
    assert!(robot
        .vision_collision_damper(&target, &blind, &[0.0], &Scope::new(), &config)
        .unwrap()
        .is_none());
}

#[test]
fn test_line_of_sight_from_camera_robot() {
    let robot = lifter();
    // camera on its own vertical slider
    let head = Robot::from_ets(&[Et3::joint_tz(), Et3::tx(-1.0), Et3::tz(0.3)]).unwrap();
    let head_q = [0.0];
    let camera = Camera::Robot {
        robot: &head,
        q: &head_q,
        camera_n: 1,
    };
    let target = Shape::sphere(0.05, Point3::new(1.0, 0.0, 0.3));
    let c = robot
        .vision_collision_damper(
            &target,
            &camera,
            &[0.0],
            &Scope::new(),
            &DamperConfig::default(),
        )
        .unwrap()
        .unwrap();
    assert_eq!(c.a.shape(), (1, 2));
    assert_relative_eq!(c.a[(0, 0)], 1.0, epsilon = 1e-9);
    // lifting the camera lifts the middle of the line of sight at half speed
    assert_relative_eq!(c.a[(0, 1)], -0.5, epsilon = 1e-5);

    let too_many = Camera::Robot {
        robot: &head,
        q: &head_q,
        camera_n: 2,
    };
    assert!(matches!(
        robot.vision_collision_damper(
            &target,
            &too_many,
            &[0.0],
            &Scope::new(),
            &DamperConfig::default()
        ),
        Err(Error::SizeMismatch { .. })
    ));
}

#[test]
fn test_camera_robot_sharing_leading_joints() {
    let robot = lifter();
    // the first slider of the head is the slider of the robot
    let head = Robot::from_ets(&[
        Et3::joint_tz(),
        Et3::joint_tz(),
        Et3::tx(-1.0),
        Et3::tz(0.3),
    ])
    .unwrap();
    let head_q = [0.0, 0.0];
    let camera = Camera::Robot {
        robot: &head,
        q: &head_q,
        camera_n: 1,
    };
    let target = Shape::sphere(0.05, Point3::new(1.0, 0.0, 0.3));
    let c = robot
        .vision_collision_damper(
            &target,
            &camera,
            &[0.0],
            &Scope::new(),
            &DamperConfig::default(),
        )
        .unwrap()
        .unwrap();
    assert_eq!(c.a.shape(), (1, robot.n() + 1));
    // the shared joint lifts the ball and half of the line of sight
    assert_relative_eq!(c.a[(0, 0)], 0.5, epsilon = 1e-5);
    // the extra head joint only lifts the line of sight
    assert_relative_eq!(c.a[(0, robot.n())], -0.5, epsilon = 1e-5);

    let bigger = Robot::from_ets(&[
        Et3::joint_tz(),
        Et3::joint_tz(),
        Et3::joint_tz(),
        Et3::tx(-1.0),
    ])
    .unwrap();
    let bigger_q = [0.0; 3];
    let too_many_shared = Camera::Robot {
        robot: &bigger,
        q: &bigger_q,
        camera_n: 1,
    };
    assert_eq!(
        robot
            .vision_collision_damper(
                &target,
                &too_many_shared,
                &[0.0],
                &Scope::new(),
                &DamperConfig::default()
            )
            .unwrap_err(),
        Error::SizeMismatch {
            input: 2,
            required: 1
        }
    );
}

#[test]
fn test_link_centred_on_line_of_sight() {
    let robot = lifter();
    let camera = Camera::Pose(Isometry3::translation(-1.0, 0.0, 0.0));
    let target = Shape::sphere(0.05, Point3::new(1.0, 0.0, 0.0));
    let config = DamperConfig::default();
    let c = robot
        .vision_collision_damper(&target, &camera, &[0.0], &Scope::new(), &config)
        .unwrap()
        .unwrap();
    assert_eq!(c.len(), 1);
    assert_relative_eq!(c.a[(0, 0)].abs(), 1.0, epsilon = 1e-9);
    let d = -0.1 - 0.001;
    assert_relative_eq!(c.b[0], (d - 0.05) / 0.25, epsilon = 1e-9);
}
