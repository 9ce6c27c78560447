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
use nalgebra::{RealField, Unit, Vector3, Vector6};
use std::fmt::{self, Display};

/// Type of the joint variable of a link, `Fixed`, `Rotational`, `Linear` is supported
#[derive(Copy, Debug, Clone, PartialEq)]
pub enum JointType<T: RealField> {
    /// Fixed link. It has no joint variable.
    Fixed,
    /// Rotational joint around axis. It has an position [rad].
    Rotational {
        /// axis of the joint
        axis: Unit<Vector3<T>>,
    },
    /// Linear joint. position is length
    Linear {
        /// axis of the joint
        axis: Unit<Vector3<T>>,
    },
}

impl<T> JointType<T>
where
    T: RealField + Copy,
{
    /// `false` for `Fixed`
    ///
    /// # Examples
    ///
    /// ```
    /// use ktree::JointType;
    /// use nalgebra::Vector3;
    ///
    /// assert!(!JointType::<f64>::Fixed.is_movable());
    /// assert!(JointType::Rotational { axis: Vector3::<f64>::z_axis() }.is_movable());
    /// ```
    #[inline]
    pub fn is_movable(&self) -> bool {
        !matches!(self, JointType::Fixed)
    }

    /// Motion subspace vector in `[angular; linear]` order, expressed in the joint frame
    pub fn motion_subspace(&self) -> Vector6<T> {
        match self {
            JointType::Fixed => Vector6::zeros(),
            JointType::Rotational { axis } => {
                Vector6::new(axis[0], axis[1], axis[2], T::zero(), T::zero(), T::zero())
            }
            JointType::Linear { axis } => {
                Vector6::new(T::zero(), T::zero(), T::zero(), axis[0], axis[1], axis[2])
            }
        }
    }
}

fn axis_to_string<T: RealField>(axis: &Unit<Vector3<T>>) -> &str {
    if *axis == Vector3::x_axis() {
        "+X"
    } else if *axis == Vector3::y_axis() {
        "+Y"
    } else if *axis == Vector3::z_axis() {
        "+Z"
    } else if *axis == -Vector3::x_axis() {
        "-X"
    } else if *axis == -Vector3::y_axis() {
        "-Y"
    } else if *axis == -Vector3::z_axis() {
        "-Z"
    } else {
        ""
    }
}

impl<T: RealField> Display for JointType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JointType::Fixed => write!(f, "[⚓]"),
            JointType::Rotational { axis } => write!(f, "[⚙{}]", axis_to_string(axis)),
            JointType::Linear { axis } => write!(f, "[↕{}]", axis_to_string(axis)),
        }
    }
}

#[test]
fn test_motion_subspace() {
    let rot = JointType::Rotational {
        axis: Vector3::<f64>::y_axis(),
    };
    assert_eq!(rot.motion_subspace(), Vector6::new(0.0, 1.0, 0.0, 0.0, 0.0, 0.0));
    let lin = JointType::Linear {
        axis: -Vector3::<f64>::x_axis(),
    };
    assert_eq!(lin.motion_subspace(), Vector6::new(0.0, 0.0, 0.0, -1.0, 0.0, 0.0));
    assert_eq!(format!("{}", lin), "[↕-X]");
}
