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
//! Pose algebra shared by planar and spatial trees
use na::{
    DVector, Isometry2, Isometry3, Point2, Point3, RealField, Translation3, UnitQuaternion,
    Vector2, Vector3,
};
use nalgebra as na;
use std::fmt::Debug;
use std::ops::Mul;

use crate::joint::JointType;

/// Rigid transform of a link frame
///
/// `Robot` is generic over this trait. `Isometry3` is used for spatial
/// mechanisms and `Isometry2` for planar ones.
///
/// Twists are laid out linear part first: `[vx, vy, vz, wx, wy, wz]` in 3D
/// and `[vx, vy, wz]` in 2D.
pub trait Pose<T>: Copy + Debug + PartialEq + Mul<Output = Self>
where
    T: RealField + Copy,
{
    type Point: Copy + Debug + PartialEq;

    /// Dimension of a twist
    const DOF: usize;

    fn identity() -> Self;
    /// Origin of this frame
    fn position(&self) -> Self::Point;
    /// Transform generated by the joint variable
    fn joint_motion(joint_type: &JointType<T>, position: T) -> Self;
    /// Twist at `point` caused by a unit velocity of the joint whose axis frame is `joint_frame`
    fn joint_twist(
        joint_frame: &Self,
        joint_type: &JointType<T>,
        point: &Self::Point,
    ) -> DVector<T>;
    /// Rotate a twist expressed in the parent frame into this frame
    fn twist_to_local(&self, twist: &DVector<T>) -> DVector<T>;
}

impl<T> Pose<T> for Isometry3<T>
where
    T: RealField + Copy,
{
    type Point = Point3<T>;
    const DOF: usize = 6;

    #[inline]
    fn identity() -> Self {
        Isometry3::identity()
    }
    #[inline]
    fn position(&self) -> Point3<T> {
        Point3::from(self.translation.vector)
    }
    fn joint_motion(joint_type: &JointType<T>, position: T) -> Self {
        match joint_type {
            JointType::Fixed => Isometry3::identity(),
            JointType::Rotational { axis } => Isometry3::from_parts(
                Translation3::identity(),
                UnitQuaternion::from_axis_angle(axis, position),
            ),
            JointType::Linear { axis } => Isometry3::from_parts(
                Translation3::from(axis.into_inner() * position),
                UnitQuaternion::identity(),
            ),
        }
    }
    fn joint_twist(
        joint_frame: &Self,
        joint_type: &JointType<T>,
        point: &Point3<T>,
    ) -> DVector<T> {
        match joint_type {
            JointType::Fixed => DVector::zeros(6),
            JointType::Rotational { axis } => {
                // a_i x (p_n - p_i), a_i
                let a = joint_frame.rotation * axis.into_inner();
                let v = a.cross(&(point.coords - joint_frame.translation.vector));
                DVector::from_column_slice(&[v[0], v[1], v[2], a[0], a[1], a[2]])
            }
            JointType::Linear { axis } => {
                let a = joint_frame.rotation * axis.into_inner();
                DVector::from_column_slice(&[a[0], a[1], a[2], T::zero(), T::zero(), T::zero()])
            }
        }
    }
    fn twist_to_local(&self, twist: &DVector<T>) -> DVector<T> {
        let v = self
            .rotation
            .inverse_transform_vector(&Vector3::new(twist[0], twist[1], twist[2]));
        let w = self
            .rotation
            .inverse_transform_vector(&Vector3::new(twist[3], twist[4], twist[5]));
        DVector::from_column_slice(&[v[0], v[1], v[2], w[0], w[1], w[2]])
    }
}

/// Planar pose.
///
/// A rotational joint turns around the signed z component of its axis, a
/// linear joint moves along the x/y components of its axis.
impl<T> Pose<T> for Isometry2<T>
where
    T: RealField + Copy,
{
    type Point = Point2<T>;
    const DOF: usize = 3;

    #[inline]
    fn identity() -> Self {
        Isometry2::identity()
    }
    #[inline]
    fn position(&self) -> Point2<T> {
        Point2::from(self.translation.vector)
    }
    fn joint_motion(joint_type: &JointType<T>, position: T) -> Self {
        match joint_type {
            JointType::Fixed => Isometry2::identity(),
            JointType::Rotational { axis } => {
                Isometry2::new(Vector2::zeros(), planar_sign(axis[2]) * position)
            }
            JointType::Linear { axis } => {
                Isometry2::translation(axis[0] * position, axis[1] * position)
            }
        }
    }
    fn joint_twist(
        joint_frame: &Self,
        joint_type: &JointType<T>,
        point: &Point2<T>,
    ) -> DVector<T> {
        match joint_type {
            JointType::Fixed => DVector::zeros(3),
            JointType::Rotational { axis } => {
                let s = planar_sign(axis[2]);
                let r = point.coords - joint_frame.translation.vector;
                DVector::from_column_slice(&[-r[1] * s, r[0] * s, s])
            }
            JointType::Linear { axis } => {
                let d = joint_frame.rotation * Vector2::new(axis[0], axis[1]);
                DVector::from_column_slice(&[d[0], d[1], T::zero()])
            }
        }
    }
    fn twist_to_local(&self, twist: &DVector<T>) -> DVector<T> {
        let v = self
            .rotation
            .inverse_transform_vector(&Vector2::new(twist[0], twist[1]));
        DVector::from_column_slice(&[v[0], v[1], twist[2]])
    }
}

fn planar_sign<T: RealField + Copy>(z: T) -> T {
    if z < T::zero() {
        -T::one()
    } else {
        T::one()
    }
}
