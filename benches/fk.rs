//! Forward kinematics, path resolution and dynamics of a seven joint arm
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ktree::*;
use std::f64::consts::PI;

fn arm() -> Robot<f64> {
    let mut links = split_ets(&[
        Et3::joint_rz(),
        Et3::tz(0.3),
        Et3::joint_ry(),
        Et3::joint_rz(),
        Et3::tz(0.4),
        Et3::joint_ry(),
        Et3::joint_rz(),
        Et3::tz(0.4),
        Et3::joint_ry(),
        Et3::joint_rz(),
        Et3::tz(0.1),
    ]);
    for link in links.iter_mut().filter(|l| l.is_joint()) {
        link.limits = Some((-2.0..=2.0).into());
        link.inertial = Inertial::point_mass(1.0, Vector3::new(0.0, 0.0, 0.1));
    }
    RobotBuilder::new().links(links).build().unwrap()
}

fn generate_random_joint_angles_from_limits(robot: &Robot<f64>) -> Vec<f64> {
    robot
        .qlim()
        .column_iter()
        .map(|range| {
            if range[0].is_finite() && range[1].is_finite() && range[0] < range[1] {
                (range[1] - range[0]) * rand::random::<f64>() + range[0]
            } else {
                (rand::random::<f64>() - 0.5) * 2.0 * PI
            }
        })
        .collect()
}

fn bench_fkine(c: &mut Criterion) {
    let robot = arm();
    let q = generate_random_joint_angles_from_limits(&robot);
    c.bench_function("fkine", |b| {
        b.iter(|| robot.fkine(black_box(&q), None, None).unwrap())
    });
    c.bench_function("fkine_all", |b| {
        b.iter(|| {
            let poses = robot.fkine_all(black_box(&q)).unwrap();
            assert_eq!(poses.len(), 8);
        })
    });
    c.bench_function("jacobian", |b| {
        b.iter(|| {
            robot
                .jacobian(black_box(&q), None, None, Frame::World)
                .unwrap()
        })
    });
}

fn bench_resolve(c: &mut Criterion) {
    let robot = arm();
    c.bench_function("resolve_cached", |b| {
        b.iter(|| robot.resolve(None, black_box(Some("link7".into()))).unwrap())
    });
    c.bench_function("resolve_uncached", |b| {
        b.iter(|| {
            robot.clear_cache();
            robot.resolve(None, black_box(Some("link7".into()))).unwrap()
        })
    });
}

fn bench_rne(c: &mut Criterion) {
    let robot = arm();
    let q = generate_random_joint_angles_from_limits(&robot);
    let qd = generate_random_joint_angles_from_limits(&robot);
    let qdd = generate_random_joint_angles_from_limits(&robot);
    c.bench_function("rne", |b| {
        b.iter(|| robot.rne(black_box(&q), &qd, &qdd, None).unwrap())
    });
}

criterion_group!(benches, bench_fkine, bench_resolve, bench_rne);
criterion_main!(benches);
