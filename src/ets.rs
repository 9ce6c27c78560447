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
//! Elementary transform sequences
use na::{Isometry2, Isometry3, RealField, Vector2, Vector3};
use nalgebra as na;

use crate::joint::JointType;
use crate::link::{Link, LinkBuilder};
use crate::pose::Pose;

/// One elementary transform, constant or driven by a joint variable
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Et<T: RealField, P> {
    Const(P),
    Joint(JointType<T>),
}

/// Spatial elementary transform
pub type Et3<T> = Et<T, Isometry3<T>>;
/// Planar elementary transform
pub type Et2<T> = Et<T, Isometry2<T>>;

impl<T> Et<T, Isometry3<T>>
where
    T: RealField + Copy,
{
    pub fn tx(d: T) -> Self {
        Et::Const(Isometry3::translation(d, T::zero(), T::zero()))
    }
    pub fn ty(d: T) -> Self {
        Et::Const(Isometry3::translation(T::zero(), d, T::zero()))
    }
    pub fn tz(d: T) -> Self {
        Et::Const(Isometry3::translation(T::zero(), T::zero(), d))
    }
    pub fn rx(angle: T) -> Self {
        Et::Const(Isometry3::rotation(Vector3::x() * angle))
    }
    pub fn ry(angle: T) -> Self {
        Et::Const(Isometry3::rotation(Vector3::y() * angle))
    }
    pub fn rz(angle: T) -> Self {
        Et::Const(Isometry3::rotation(Vector3::z() * angle))
    }
    pub fn joint_rx() -> Self {
        Et::Joint(JointType::Rotational {
            axis: Vector3::x_axis(),
        })
    }
    pub fn joint_ry() -> Self {
        Et::Joint(JointType::Rotational {
            axis: Vector3::y_axis(),
        })
    }
    pub fn joint_rz() -> Self {
        Et::Joint(JointType::Rotational {
            axis: Vector3::z_axis(),
        })
    }
    pub fn joint_tx() -> Self {
        Et::Joint(JointType::Linear {
            axis: Vector3::x_axis(),
        })
    }
    pub fn joint_ty() -> Self {
        Et::Joint(JointType::Linear {
            axis: Vector3::y_axis(),
        })
    }
    pub fn joint_tz() -> Self {
        Et::Joint(JointType::Linear {
            axis: Vector3::z_axis(),
        })
    }
}

impl<T> Et<T, Isometry2<T>>
where
    T: RealField + Copy,
{
    pub fn tx(d: T) -> Self {
        Et::Const(Isometry2::translation(d, T::zero()))
    }
    pub fn ty(d: T) -> Self {
        Et::Const(Isometry2::translation(T::zero(), d))
    }
    pub fn r(angle: T) -> Self {
        Et::Const(Isometry2::new(Vector2::zeros(), angle))
    }
    pub fn joint_r() -> Self {
        Et::Joint(JointType::Rotational {
            axis: Vector3::z_axis(),
        })
    }
    pub fn joint_tx() -> Self {
        Et::Joint(JointType::Linear {
            axis: Vector3::x_axis(),
        })
    }
    pub fn joint_ty() -> Self {
        Et::Joint(JointType::Linear {
            axis: Vector3::y_axis(),
        })
    }
}

/// Chop the sequence into links, a new link frame after every joint variable
///
/// Constants before a joint become the origin of that link, trailing
/// constants become a last fixed link. Links are named `link0`, `link1`, ...
/// and carry automatic joint indices.
pub fn split_ets<T, P>(ets: &[Et<T, P>]) -> Vec<Link<T, P>>
where
    T: RealField + Copy,
    P: Pose<T>,
{
    let mut links = Vec::new();
    let mut origin = P::identity();
    let mut pending = false;
    let mut jindex = 0;
    for et in ets {
        match et {
            Et::Const(pose) => {
                origin = origin * *pose;
                pending = true;
            }
            Et::Joint(joint_type) => {
                let mut builder = LinkBuilder::new()
                    .name(&format!("link{}", links.len()))
                    .origin(origin)
                    .joint_type(*joint_type);
                if joint_type.is_movable() {
                    builder = builder.auto_joint_index(jindex);
                    jindex += 1;
                }
                links.push(builder.finalize());
                origin = P::identity();
                pending = false;
            }
        }
    }
    if pending || links.is_empty() {
        links.push(
            LinkBuilder::new()
                .name(&format!("link{}", links.len()))
                .origin(origin)
                .finalize(),
        );
    }
    links
}

#[test]
fn test_split_ets() {
    let ets = [
        Et3::<f64>::joint_rz(),
        Et3::joint_ry(),
        Et3::tz(1.0),
        Et3::joint_ry(),
        Et3::tz(1.0),
    ];
    let links = split_ets(&ets);
    let names = links.iter().map(|l| l.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, ["link0", "link1", "link2", "link3"]);
    assert_eq!(links[2].origin.translation.vector.z, 1.0);
    assert!(!links[3].is_joint());
    assert_eq!(
        links.iter().map(|l| l.jindex()).collect::<Vec<_>>(),
        [Some(0), Some(1), Some(2), None]
    );
    assert!(links.iter().all(|l| l.parent_ref().is_none()));
}
