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
//! Path resolution between two links, memoized per `(start, end)` name pair
use na::RealField;
use nalgebra as na;
use tracing::{debug, warn};

use crate::errors::*;
use crate::iterator::Ancestors;
use crate::link::LinkId;
use crate::pose::Pose;
use crate::robot::Robot;

/// Way to name one end of a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Designator<'a> {
    Link(LinkId),
    Name(&'a str),
    /// Gripper by its position in `Robot::grippers()`, only valid as an end
    Gripper(usize),
}

impl<'a> From<&'a str> for Designator<'a> {
    fn from(name: &'a str) -> Self {
        Designator::Name(name)
    }
}

impl<'a> From<LinkId> for Designator<'a> {
    fn from(id: LinkId) -> Self {
        Designator::Link(id)
    }
}

/// Ordered links from start to end, with the joint count and the tool offset
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPath<P> {
    pub(crate) links: Vec<LinkId>,
    pub(crate) n: usize,
    pub(crate) tool: P,
}

impl<P: Copy> ResolvedPath<P> {
    /// Links from start to end, both included
    pub fn links(&self) -> &[LinkId] {
        &self.links
    }
    /// Number of joints along the path
    pub fn n(&self) -> usize {
        self.n
    }
    /// Gripper tool offset, identity unless the end is a gripper
    pub fn tool(&self) -> P {
        self.tool
    }
}

impl<T, P> Robot<T, P>
where
    T: RealField + Copy,
    P: Pose<T>,
{
    /// Resolve the path between two links
    ///
    /// `start` defaults to the base link. `end` defaults to the only gripper,
    /// or the only end-effector link; if there are several the first one is
    /// used and a warning is logged.
    ///
    /// A path to a gripper ends at the gripper root and carries its tool
    /// offset. Gripper joints do not count in `n()`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ktree::*;
    ///
    /// let robot = Robot::from_ets(&[
    ///     Et3::<f64>::joint_rz(),
    ///     Et3::tz(1.0),
    ///     Et3::joint_ry(),
    ///     Et3::tz(1.0),
    /// ])
    /// .unwrap();
    /// let path = robot.resolve(None, Some("link2".into())).unwrap();
    /// assert_eq!(path.n(), 2);
    /// assert_eq!(path.links().len(), 3);
    /// assert!(robot.resolve(Some("link2".into()), Some("link0".into())).is_err());
    /// ```
    pub fn resolve(
        &self,
        start: Option<Designator<'_>>,
        end: Option<Designator<'_>>,
    ) -> Result<ResolvedPath<P>> {
        let start = match start {
            None => self.base_link,
            Some(d) => self.main_link(d)?,
        };
        let (end, end_key, tool) = self.resolve_end(end)?;
        let key = (self.links[start.0].name.clone(), end_key);
        if let Some(path) = self.path_cache.borrow().get(&key) {
            return Ok(path.clone());
        }

        self.path_walks.set(self.path_walks.get() + 1);
        let mut links = Vec::new();
        for id in Ancestors::new(&self.links, Some(end)) {
            links.push(id);
            if id == start {
                links.reverse();
                let n = links
                    .iter()
                    .filter(|id| self.is_path_joint(**id))
                    .count();
                let path = ResolvedPath { links, n, tool };
                debug!(start = key.0.as_str(), end = key.1.as_str(), n, "resolved path");
                self.path_cache.borrow_mut().insert(key, path.clone());
                return Ok(path);
            }
        }
        Err(Error::NoPath {
            start: key.0,
            end: key.1,
        })
    }

    /// Drop every cached path
    pub fn clear_cache(&self) {
        self.path_cache.borrow_mut().clear();
    }

    /// Number of resolutions which walked the tree instead of hitting the cache
    pub fn path_walk_count(&self) -> usize {
        self.path_walks.get()
    }

    fn main_link(&self, designator: Designator<'_>) -> Result<LinkId> {
        let id = match designator {
            Designator::Link(id) => {
                self.link(id)?;
                id
            }
            Designator::Name(name) => self.find(name).ok_or_else(|| Error::LinkNotFound {
                name: name.to_owned(),
            })?,
            Designator::Gripper(index) => {
                return Err(Error::LinkNotFound {
                    name: self
                        .grippers
                        .get(index)
                        .map_or_else(|| format!("#{}", index), |g| g.name().to_owned()),
                })
            }
        };
        if self.is_main(id) {
            Ok(id)
        } else {
            Err(Error::LinkNotFound {
                name: self.links[id.0].name.clone(),
            })
        }
    }

    /// End link, cache key and tool offset
    fn resolve_end(&self, end: Option<Designator<'_>>) -> Result<(LinkId, String, P)> {
        let gripper = match end {
            None => {
                if self.grippers.is_empty() {
                    if self.ee_links.len() > 1 {
                        warn!(
                            count = self.ee_links.len(),
                            "multiple end-effector links, using the first one"
                        );
                    }
                    let id = self.ee_links.first().copied().unwrap_or(self.base_link);
                    return Ok((id, self.links[id.0].name.clone(), P::identity()));
                }
                if self.grippers.len() > 1 {
                    warn!(
                        count = self.grippers.len(),
                        "multiple grippers, using the first one"
                    );
                }
                0
            }
            Some(Designator::Gripper(index)) => {
                if index >= self.grippers.len() {
                    return Err(Error::GripperNotFound {
                        name: format!("#{}", index),
                    });
                }
                index
            }
            Some(Designator::Name(name)) => {
                let id = self.find(name).ok_or_else(|| Error::LinkNotFound {
                    name: name.to_owned(),
                })?;
                match self.gripper_rooted_at(id)? {
                    Some(g) => g,
                    None => return Ok((id, name.to_owned(), P::identity())),
                }
            }
            Some(Designator::Link(id)) => {
                self.link(id)?;
                match self.gripper_rooted_at(id)? {
                    Some(g) => g,
                    None => return Ok((id, self.links[id.0].name.clone(), P::identity())),
                }
            }
        };
        let g = &self.grippers[gripper];
        Ok((g.root(), g.name().to_owned(), g.tool))
    }

    /// `None` for a main link, the gripper index for a gripper root
    fn gripper_rooted_at(&self, id: LinkId) -> Result<Option<usize>> {
        match self.gripper_of(id) {
            None => Ok(None),
            Some(g) if self.grippers[g].root() == id => Ok(Some(g)),
            Some(_) => Err(Error::LinkNotFound {
                name: self.links[id.0].name.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::LinkBuilder;
    use crate::robot::RobotBuilder;
    use na::Isometry3;

    fn branched() -> Robot<f64> {
        let rz = || {
            LinkBuilder::new().joint_type(crate::joint::JointType::Rotational {
                axis: na::Vector3::z_axis(),
            })
        };
        RobotBuilder::new()
            .add_link(rz().name("root").finalize())
            .add_link(rz().name("left").parent("root").finalize())
            .add_link(LinkBuilder::new().name("left_tip").parent("left").finalize())
            .add_link(rz().name("right").parent("root").finalize())
            .build()
            .unwrap()
    }

    #[test]
    fn default_end_is_the_first_leaf() {
        let robot = branched();
        let path = robot.resolve(None, None).unwrap();
        let names = path
            .links()
            .iter()
            .map(|id| robot.links()[id.index()].name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["root", "left", "left_tip"]);
        assert_eq!(path.n(), 2);
        assert_eq!(path.tool(), Isometry3::identity());
    }

    #[test]
    fn branches_have_no_path() {
        let robot = branched();
        assert_eq!(
            robot
                .resolve(Some("left".into()), Some("right".into()))
                .unwrap_err(),
            Error::NoPath {
                start: "left".into(),
                end: "right".into()
            }
        );
        assert!(matches!(
            robot.resolve(None, Some("nothing".into())),
            Err(Error::LinkNotFound { .. })
        ));
        assert!(matches!(
            robot.resolve(None, Some(Designator::Gripper(0))),
            Err(Error::GripperNotFound { .. })
        ));
    }

    #[test]
    fn cache_is_keyed_by_names() {
        let robot = branched();
        let right = robot.find("right").unwrap();
        let a = robot.resolve(None, Some("right".into())).unwrap();
        let b = robot
            .resolve(Some(robot.base_link().into()), Some(right.into()))
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(robot.path_walk_count(), 1);
        robot.clear_cache();
        robot.resolve(None, Some("right".into())).unwrap();
        assert_eq!(robot.path_walk_count(), 2);
    }
}
