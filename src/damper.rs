/*
  Copyright 2017 Takashi Ogura

  Licensed under the Apache License, Version 2.0 (the "License");
  you may not use this file except in compliance with the License.
  You may obtain a copy of the License at

      http://www.apache.org/licenses/LICENSE-2.0

  Unless required by applicable law or agreed to in writing, software
  distributed under the License is distributed on an "AS IS" BASIS,
  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
  See the License for the specific language governing permissions and
  limitations under the License.
*/
//! Velocity damper inequality constraints for collision and line of sight avoidance
//!
//! Each active pair of a link collision shape and a target produces one row
//! of `A * qd <= b`. A row bounds the speed of the closest point on the link
//! towards the target, and the bound shrinks to zero as the distance reaches
//! the minimum distance `ds`.
use na::{DMatrix, DVector, Isometry3, RealField};
use nalgebra as na;
use tracing::{debug, trace};

use crate::errors::*;
use crate::funcs::Frame;
use crate::path::Designator;
use crate::pose::Pose;
use crate::robot::Robot;
use crate::shape::{Collision, Proximity, Shape};

/// Gains of the velocity damper
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamperConfig<T> {
    /// Influence distance, the damper is active below it
    pub di: T,
    /// Minimum distance to keep
    pub ds: T,
    /// Gain
    pub xi: T,
}

impl<T> Default for DamperConfig<T>
where
    T: RealField + Copy,
{
    fn default() -> Self {
        Self {
            di: na::convert(0.3),
            ds: na::convert(0.05),
            xi: T::one(),
        }
    }
}

impl<T> DamperConfig<T>
where
    T: RealField + Copy,
{
    fn validate(&self) -> Result<()> {
        if self.di > self.ds {
            Ok(())
        } else {
            Err(Error::InvalidDamperParameters)
        }
    }
}

/// Stacked inequality rows `a * qd <= b`
#[derive(Debug, Clone, PartialEq)]
pub struct DamperConstraint<T: RealField> {
    pub a: DMatrix<T>,
    pub b: DVector<T>,
}

impl<T: RealField> DamperConstraint<T> {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.b.len()
    }
    pub fn is_empty(&self) -> bool {
        self.b.is_empty()
    }
}

/// Part of the robot to watch
///
/// `collisions` replaces the collision shapes of the links, one entry per
/// joint along the path. Links before the first joint have no shapes then.
#[derive(Debug, Clone)]
pub struct Scope<'a, T: RealField> {
    pub start: Option<Designator<'a>>,
    pub end: Option<Designator<'a>>,
    pub collisions: Option<&'a [Vec<Collision<T>>]>,
}

impl<'a, T: RealField> Default for Scope<'a, T> {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            collisions: None,
        }
    }
}

impl<'a, T: RealField> Scope<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn start(mut self, start: Designator<'a>) -> Self {
        self.start = Some(start);
        self
    }
    pub fn end(mut self, end: Designator<'a>) -> Self {
        self.end = Some(end);
        self
    }
    pub fn collisions(mut self, collisions: &'a [Vec<Collision<T>>]) -> Self {
        self.collisions = Some(collisions);
        self
    }
}

/// Origin of a line of sight
#[derive(Debug, Clone)]
pub enum Camera<'a, T: RealField> {
    /// Camera fixed in the world
    Pose(Isometry3<T>),
    /// Camera at the end of a robot
    ///
    /// The first joints of the camera robot are the first joints of the
    /// constrained robot, its last `camera_n` joints are extra columns.
    Robot {
        robot: &'a Robot<T>,
        q: &'a [T],
        camera_n: usize,
    },
}

impl<T> Robot<T, Isometry3<T>>
where
    T: RealField + Copy,
{
    /// Inequality rows keeping the links of `scope` away from `shape`
    ///
    /// Returns `None` if no collision shape is within the influence distance.
    /// Rows have one column per joint along the path.
    ///
    /// # Examples
    ///
    /// ```
    /// use ktree::*;
    /// use nalgebra::{Isometry3, Point3};
    ///
    /// let mut links = split_ets(&[Et3::<f64>::joint_tx(), Et3::tx(0.0)]);
    /// links[0].collisions.push(Collision::new("ball", Isometry3::identity(), Geometry::Sphere { radius: 0.1 }));
    /// let robot = RobotBuilder::new().links(links).build().unwrap();
    /// let obstacle = Shape::sphere(0.1, Point3::new(0.4, 0.0, 0.0));
    /// let config = DamperConfig { di: 0.3, ds: 0.05, xi: 1.0 };
    /// let c = robot
    ///     .link_collision_damper(&obstacle, &[0.0], &Scope::new(), &config)
    ///     .unwrap()
    ///     .unwrap();
    /// assert_eq!(c.a.shape(), (1, 1));
    /// assert!((c.a[(0, 0)] - 1.0).abs() < 1e-12);
    /// assert!((c.b[0] - 0.6).abs() < 1e-12);
    ///
    /// let far = Shape::sphere(0.1, Point3::new(2.0, 0.0, 0.0));
    /// assert!(robot.link_collision_damper(&far, &[0.0], &Scope::new(), &config).unwrap().is_none());
    /// ```
    pub fn link_collision_damper(
        &self,
        shape: &Shape<T>,
        q: &[T],
        scope: &Scope<'_, T>,
        config: &DamperConfig<T>,
    ) -> Result<Option<DamperConstraint<T>>> {
        let path = self.resolve(scope.start, scope.end)?;
        self.damper_rows(shape, q, scope, config, path.n, |p, _| {
            p.normal.dot(&shape.velocity.fixed_rows::<3>(0))
        })
    }

    /// Inequality rows keeping the links of `scope` out of the line of sight
    /// from `camera` to `target`
    ///
    /// The line of sight is a thin capsule rebuilt on every call. Rows have
    /// `n() + camera_n` columns.
    pub fn vision_collision_damper(
        &self,
        target: &Shape<T>,
        camera: &Camera<'_, T>,
        q: &[T],
        scope: &Scope<'_, T>,
        config: &DamperConfig<T>,
    ) -> Result<Option<DamperConstraint<T>>> {
        let (camera_position, camera_n, camera_jacobian) = match camera {
            Camera::Pose(pose) => (pose.position(), 0, None),
            Camera::Robot {
                robot,
                q: camera_q,
                camera_n,
            } => {
                let pose = robot.world_pose(camera_q, None)?;
                let jacobi = robot.jacobian(camera_q, None, None, Frame::World)?;
                let shared = jacobi
                    .ncols()
                    .checked_sub(*camera_n)
                    .ok_or(Error::SizeMismatch {
                        input: *camera_n,
                        required: jacobi.ncols(),
                    })?;
                if shared > self.n {
                    return Err(Error::SizeMismatch {
                        input: shared,
                        required: self.n,
                    });
                }
                (pose.position(), *camera_n, Some(jacobi))
            }
        };
        let target_position = target.pose.position();
        let length = (camera_position - target_position).norm();
        if length <= na::convert(1.0e-12) {
            debug!("camera and target coincide, no line of sight");
            return Ok(None);
        }
        let los = Shape::capsule_between(na::convert(0.001), camera_position, target_position);

        self.damper_rows(&los, q, scope, config, self.n + camera_n, |p, row| {
            if let Some(jacobi) = &camera_jacobian {
                let scale = (p.other_point - target_position).norm() / length;
                let dpc = jacobi.fixed_rows::<3>(0).tr_mul(&p.normal) * scale;
                let shared = dpc.len() - camera_n;
                for k in 0..shared {
                    row[k] -= dpc[k];
                }
                for k in 0..camera_n {
                    row[self.n + k] -= dpc[shared + k];
                }
            }
            p.normal.dot(&target.velocity.fixed_rows::<3>(0))
                * (p.other_point - camera_position).norm()
                / length
        })
    }

    /// Build a row for every link collision near `target`
    ///
    /// `correction` may alter the row and returns the velocity term of the bound.
    fn damper_rows<F>(
        &self,
        target: &Shape<T>,
        q: &[T],
        scope: &Scope<'_, T>,
        config: &DamperConfig<T>,
        width: usize,
        mut correction: F,
    ) -> Result<Option<DamperConstraint<T>>>
    where
        F: FnMut(&Proximity<T>, &mut DVector<T>) -> T,
    {
        config.validate()?;
        self.check_q(q)?;
        let path = self.resolve(scope.start, scope.end)?;
        let Some(first) = path.links.first() else {
            return Ok(None);
        };
        let poses = self.path_poses(q, self.world_prefix(q, *first), &path.links);

        let mut rows = Vec::new();
        let mut joints: usize = 0;
        for (k, (id, pose)) in path.links.iter().zip(&poses).enumerate() {
            let link = &self.links[id.0];
            if self.is_path_joint(*id) {
                joints += 1;
            }
            let collisions = match scope.collisions {
                None => link.collisions.as_slice(),
                Some(list) => joints
                    .checked_sub(1)
                    .and_then(|j| list.get(j))
                    .map_or(&[][..], |c| c.as_slice()),
            };
            for collision in collisions {
                let Some(p) = collision.to_shape(pose).closest_point(target, config.di) else {
                    continue;
                };
                if p.distance >= config.di {
                    continue;
                }
                let jacobi = self.point_jacobian(&path.links[..=k], &poses[..=k], &p.point);
                let lin = jacobi.fixed_rows::<3>(0).tr_mul(&p.normal);
                let mut row = DVector::zeros(width);
                row.rows_mut(0, lin.len()).copy_from(&lin);
                let speed = correction(&p, &mut row);
                let b = config.xi * (p.distance - config.ds) / (config.di - config.ds) + speed;
                trace!(
                    link = link.name.as_str(),
                    collision = collision.name.as_str(),
                    "damper row"
                );
                rows.push((row, b));
            }
        }
        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(DamperConstraint {
            a: DMatrix::from_fn(rows.len(), width, |r, c| rows[r].0[c]),
            b: DVector::from_iterator(rows.len(), rows.iter().map(|(_, b)| *b)),
        }))
    }
}
