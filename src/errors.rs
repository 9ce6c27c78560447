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
use thiserror::Error;

/// The reason of the failure of tree construction, path resolution or evaluation
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("link name {name} is not unique")]
    DuplicateName { name: String },
    #[error("invalid link configuration, there is no base link")]
    NoBaseLink,
    #[error("multiple base links: {first} and {second}")]
    MultipleBaseLinks { first: String, second: String },
    #[error("parent link {parent} of {child} not found")]
    ParentNotFound { child: String, parent: String },
    #[error("parent index {index} of {child} is out of range")]
    ParentIndexOutOfRange { child: String, index: usize },
    #[error("links {names:?} are not reachable from the base link")]
    Disconnected { names: Vec<String> },
    #[error("all joints must have a joint index, or none have a joint index")]
    MixedJointIndex,
    #[error("joint index {index} of {name} was repeated or out of range")]
    InvalidJointIndex { name: String, index: usize },
    #[error("joints {indices:?} were not assigned")]
    UnassignedJointIndex { indices: Vec<usize> },
    #[error("fixed link {name} must not have a joint index")]
    JointIndexOnFixedLink { name: String },
    #[error("gripper root {name} not found")]
    GripperNotFound { name: String },
    #[error("gripper root {name} is the base link")]
    GripperRootIsBase { name: String },
    #[error("gripper {name} overlaps another gripper")]
    NestedGripper { name: String },
    #[error("cannot find path from {start} to {end}")]
    NoPath { start: String, end: String },
    #[error("link {name} not found")]
    LinkNotFound { name: String },
    #[error("link id {id} is invalid")]
    InvalidLinkId { id: usize },
    #[error("size mismatch input = {input}, required = {required}")]
    SizeMismatch { input: usize, required: usize },
    #[error("influence distance must be greater than the minimum distance")]
    InvalidDamperParameters,
}

impl Error {
    /// `true` if the error was raised while building the tree
    ///
    /// # Examples
    ///
    /// ```
    /// assert!(ktree::Error::NoBaseLink.is_configuration_error());
    /// assert!(!ktree::Error::SizeMismatch { input: 1, required: 2 }.is_configuration_error());
    /// ```
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Error::DuplicateName { .. }
                | Error::NoBaseLink
                | Error::MultipleBaseLinks { .. }
                | Error::ParentNotFound { .. }
                | Error::ParentIndexOutOfRange { .. }
                | Error::Disconnected { .. }
                | Error::MixedJointIndex
                | Error::InvalidJointIndex { .. }
                | Error::UnassignedJointIndex { .. }
                | Error::JointIndexOnFixedLink { .. }
                | Error::GripperNotFound { .. }
                | Error::GripperRootIsBase { .. }
                | Error::NestedGripper { .. }
        )
    }
}

pub type Result<T> = ::std::result::Result<T, Error>;
