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
//! # Branched kinematic trees using [nalgebra](http://nalgebra.org).
//!
//! `ktree` has below functionalities
//!
//! 1. Tree construction with joint indexing and gripper sub-trees
//! 1. Cached path resolution between links
//! 1. Forward kinematics and Jacobians (spatial and planar)
//! 1. Velocity damper constraints for collision and line of sight avoidance
//! 1. Recursive Newton-Euler inverse dynamics
//!
//! See `RobotBuilder` and `Robot` as the top level interface.
//!
mod damper;
mod dynamics;
mod errors;
mod ets;
mod funcs;
mod path;
mod robot;
use nalgebra as na;
pub mod iterator;
pub mod joint;
pub mod link;
pub mod pose;
pub mod shape;
pub mod spatial;

pub use self::damper::*;
pub use self::errors::*;
pub use self::ets::*;
pub use self::funcs::*;
pub use self::joint::{JointType, Range};
pub use self::link::{Inertial, Link, LinkBuilder, LinkId, ParentRef};
pub use self::path::*;
pub use self::pose::Pose;
pub use self::robot::*;
pub use self::shape::{Collision, Geometry, Proximity, Shape};

// re-export from nalgebra
pub use na::{Isometry2, Isometry3, RealField, Translation3, UnitQuaternion, Vector3};
pub use simba::scalar::{SubsetOf, SupersetOf};
