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
//! Forward kinematics and Jacobians along resolved paths
use na::{DMatrix, Isometry3, RealField, Vector3};
use nalgebra as na;

use crate::errors::*;
use crate::iterator::Ancestors;
use crate::link::LinkId;
use crate::path::Designator;
use crate::pose::Pose;
use crate::robot::Robot;

/// Frame in which a Jacobian is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// World frame, the robot base transform included
    World,
    /// Frame of the end link (tool included)
    End,
}

impl<T, P> Robot<T, P>
where
    T: RealField + Copy,
    P: Pose<T>,
{
    pub(crate) fn check_q(&self, q: &[T]) -> Result<()> {
        if q.len() != self.n {
            return Err(Error::SizeMismatch {
                input: q.len(),
                required: self.n,
            });
        }
        Ok(())
    }

    /// Movable main link, one entry of `q`
    #[inline]
    pub(crate) fn is_path_joint(&self, id: LinkId) -> bool {
        self.is_main(id) && self.links[id.0].is_joint()
    }

    /// `q` must have passed `check_q`. Gripper joints are not part of `q` and stay at zero.
    #[inline]
    pub(crate) fn local_transform_at(&self, id: LinkId, q: &[T]) -> P {
        let link = &self.links[id.0];
        let position = match link.jindex {
            Some(j) if self.is_main(id) => q[j],
            _ => T::zero(),
        };
        link.local_transform(position)
    }

    /// World pose of the parent frame of `start`
    pub(crate) fn world_prefix(&self, q: &[T], start: LinkId) -> P {
        let mut ancestors = Ancestors::new(&self.links, self.links[start.0].parent).collect::<Vec<_>>();
        ancestors.reverse();
        ancestors.iter().fold(self.base, |pose, id| {
            pose * self.local_transform_at(*id, q)
        })
    }

    /// World poses of each link of `path`, starting from `prefix`
    pub(crate) fn path_poses(&self, q: &[T], prefix: P, path: &[LinkId]) -> Vec<P> {
        path.iter()
            .scan(prefix, |pose, id| {
                *pose = *pose * self.local_transform_at(*id, q);
                Some(*pose)
            })
            .collect()
    }

    /// World Jacobian of `point` for the joints of `path`, columns in path order
    pub(crate) fn point_jacobian(
        &self,
        path: &[LinkId],
        poses: &[P],
        point: &P::Point,
    ) -> DMatrix<T> {
        let columns = path
            .iter()
            .zip(poses)
            .filter(|(id, _)| self.is_path_joint(**id))
            .map(|(id, pose)| P::joint_twist(pose, &self.links[id.0].joint_type, point))
            .collect::<Vec<_>>();
        DMatrix::from_fn(P::DOF, columns.len(), |r, c| columns[c][r])
    }

    /// Pose of `end` relative to the parent frame of `start`
    ///
    /// The start link's own transform is included, followed by the gripper
    /// tool offset if `end` is a gripper.
    ///
    /// # Examples
    ///
    /// ```
    /// use ktree::*;
    ///
    /// let robot = Robot::from_ets(&[Et3::<f64>::joint_rz(), Et3::tx(1.0), Et3::joint_rz(), Et3::tx(1.0)]).unwrap();
    /// let pose = robot.fkine(&[0.0, std::f64::consts::FRAC_PI_2], None, None).unwrap();
    /// assert!((pose.translation.vector.x - 1.0).abs() < 1e-12);
    /// assert!((pose.translation.vector.y - 1.0).abs() < 1e-12);
    /// ```
    pub fn fkine(
        &self,
        q: &[T],
        start: Option<Designator<'_>>,
        end: Option<Designator<'_>>,
    ) -> Result<P> {
        self.check_q(q)?;
        let path = self.resolve(start, end)?;
        let pose = path.links.iter().fold(P::identity(), |pose, id| {
            pose * self.local_transform_at(*id, q)
        });
        Ok(pose * path.tool)
    }

    /// World pose of `end`, the robot base included
    pub fn world_pose(&self, q: &[T], end: Option<Designator<'_>>) -> Result<P> {
        Ok(self.base * self.fkine(q, None, end)?)
    }

    /// World poses of all main links, in depth-first order
    pub fn fkine_all(&self, q: &[T]) -> Result<Vec<P>> {
        self.check_q(q)?;
        let mut world = vec![self.base; self.links.len()];
        for id in &self.order {
            let link = &self.links[id.0];
            let parent = link.parent.map_or(self.base, |p| world[p.0]);
            world[id.0] = parent * self.local_transform_at(*id, q);
        }
        Ok(self.order.iter().map(|id| world[id.0]).collect())
    }

    /// Jacobian of the end point of a path
    ///
    /// The result has `P::DOF` rows (linear velocity first) and one column
    /// per joint along the path.
    ///
    /// # Examples
    ///
    /// ```
    /// use ktree::*;
    ///
    /// let robot = Robot2::from_ets(&[Et2::<f64>::joint_r(), Et2::tx(1.0)]).unwrap();
    /// let j = robot.jacobian(&[0.0], None, None, Frame::World).unwrap();
    /// assert_eq!(j.shape(), (3, 1));
    /// assert!((j[(1, 0)] - 1.0).abs() < 1e-12);
    /// assert!((j[(2, 0)] - 1.0).abs() < 1e-12);
    /// ```
    pub fn jacobian(
        &self,
        q: &[T],
        start: Option<Designator<'_>>,
        end: Option<Designator<'_>>,
        frame: Frame,
    ) -> Result<DMatrix<T>> {
        self.check_q(q)?;
        let path = self.resolve(start, end)?;
        let Some(first) = path.links.first() else {
            return Ok(DMatrix::zeros(P::DOF, 0));
        };
        let poses = self.path_poses(q, self.world_prefix(q, *first), &path.links);
        let end_pose = poses.last().copied().unwrap_or(self.base) * path.tool;
        let mut jacobi = self.point_jacobian(&path.links, &poses, &end_pose.position());
        if frame == Frame::End {
            for mut column in jacobi.column_iter_mut() {
                let local = end_pose.twist_to_local(&column.clone_owned());
                column.copy_from(&local);
            }
        }
        Ok(jacobi)
    }
}

impl<T> Robot<T, Isometry3<T>>
where
    T: RealField + Copy,
{
    /// Center of mass of the main links in the world frame
    ///
    /// Returns `None` if the total mass is zero.
    pub fn center_of_mass(&self, q: &[T]) -> Result<Option<Vector3<T>>> {
        let poses = self.fkine_all(q)?;
        let mut total_mass = T::zero();
        let mut com = Vector3::zeros();
        for (id, pose) in self.order.iter().zip(poses) {
            let inertial = &self.links[id.0].inertial;
            com += (pose * inertial.origin().translation).translation.vector * inertial.mass;
            total_mass += inertial.mass;
        }
        if total_mass == T::zero() {
            return Ok(None);
        }
        Ok(Some(com / total_mass))
    }
}

#[test]
fn test_center_of_mass() {
    use crate::link::{Inertial, LinkBuilder};
    use crate::robot::RobotBuilder;
    use approx::assert_relative_eq;
    use na::{Translation3, Vector3};

    let robot = RobotBuilder::new()
        .add_link(
            LinkBuilder::<f64>::new()
                .name("l0")
                .translation(Translation3::new(0.0, 1.0, 0.0))
                .inertial(Inertial::from_mass(1.0))
                .finalize(),
        )
        .add_link(
            LinkBuilder::<f64>::new()
                .name("l1")
                .translation(Translation3::new(0.0, 0.0, 1.0))
                .joint_type(crate::joint::JointType::Rotational {
                    axis: Vector3::y_axis(),
                })
                .inertial(Inertial::point_mass(4.0, Vector3::new(0.0, 0.0, 1.0)))
                .finalize(),
        )
        .build()
        .unwrap();
    let com1 = robot.center_of_mass(&[0.0]).unwrap().unwrap();
    assert_relative_eq!(com1, Vector3::new(0.0, 1.0, 1.6), epsilon = 1e-12);
    let com2 = robot.center_of_mass(&[0.5]).unwrap().unwrap();
    assert!((com2.x - 0.383540).abs() < 0.0001);
    assert_eq!(com2.y, 1.0);
    assert!((com2.z - 1.502066).abs() < 0.0001);
}
