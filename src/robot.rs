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
use na::{Isometry3, Matrix2xX, RealField, Vector3};
use nalgebra as na;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::{self, Display};
use tracing::debug;

use crate::errors::*;
use crate::ets::{split_ets, Et};
use crate::iterator::*;
use crate::link::*;
use crate::path::ResolvedPath;
use crate::pose::Pose;

/// Tool sub-tree at the end of a chain
///
/// Its links are removed from the robot and its joints do not count in `Robot::n()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Gripper<P> {
    name: String,
    root: LinkId,
    attachment: LinkId,
    links: Vec<LinkId>,
    n: usize,
    pub(crate) tool: P,
}

impl<P: Copy> Gripper<P> {
    /// Name of the root link
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn root(&self) -> LinkId {
        self.root
    }
    /// Link of the robot the gripper is mounted on
    pub fn attachment(&self) -> LinkId {
        self.attachment
    }
    /// Links of the gripper in depth-first order
    pub fn links(&self) -> &[LinkId] {
        &self.links
    }
    /// Number of joints inside the gripper
    pub fn n(&self) -> usize {
        self.n
    }
    /// Offset from the gripper root frame to the tool point
    pub fn tool(&self) -> P {
        self.tool
    }
}

/// Gripper designation handed to `RobotBuilder`
#[derive(Debug, Clone, PartialEq)]
pub struct GripperSpec<P> {
    pub root: String,
    pub tool: P,
}

/// Build a `Robot` from a collection of links
///
/// # Examples
///
/// ```
/// use ktree::*;
/// use nalgebra::{Translation3, Vector3};
///
/// let robot = RobotBuilder::<f64>::new()
///     .add_link(LinkBuilder::new()
///         .name("link1")
///         .joint_type(JointType::Rotational { axis: Vector3::z_axis() })
///         .finalize())
///     .add_link(LinkBuilder::<f64>::new()
///         .name("link2")
///         .parent("link1")
///         .translation(Translation3::new(1.0, 0.0, 0.0))
///         .joint_type(JointType::Rotational { axis: Vector3::z_axis() })
///         .finalize())
///     .add_link(LinkBuilder::<f64>::new()
///         .name("ee")
///         .parent("link2")
///         .translation(Translation3::new(1.0, 0.0, 0.0))
///         .finalize())
///     .build()
///     .unwrap();
/// assert_eq!(robot.n(), 2);
/// assert_eq!(robot.ee_links().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct RobotBuilder<T: RealField, P = Isometry3<T>> {
    name: String,
    links: Vec<Link<T, P>>,
    grippers: Vec<GripperSpec<P>>,
    check_joint_index: bool,
    base: P,
    gravity: Vector3<T>,
}

impl<T, P> Default for RobotBuilder<T, P>
where
    T: RealField + Copy,
    P: Pose<T>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, P> RobotBuilder<T, P>
where
    T: RealField + Copy,
    P: Pose<T>,
{
    pub fn new() -> Self {
        Self {
            name: String::new(),
            links: Vec::new(),
            grippers: Vec::new(),
            check_joint_index: true,
            base: P::identity(),
            gravity: Vector3::new(T::zero(), T::zero(), na::convert(-9.81)),
        }
    }
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_owned();
        self
    }
    pub fn add_link(mut self, link: Link<T, P>) -> Self {
        self.links.push(link);
        self
    }
    pub fn links<I>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = Link<T, P>>,
    {
        self.links.extend(links);
        self
    }
    /// Designate the sub-tree rooted at `root` as a gripper
    pub fn gripper(self, root: &str) -> Self {
        self.gripper_with_tool(root, P::identity())
    }
    /// Designate a gripper with a tool offset from its root link
    pub fn gripper_with_tool(mut self, root: &str, tool: P) -> Self {
        self.grippers.push(GripperSpec {
            root: root.to_owned(),
            tool,
        });
        self
    }
    /// Verify that explicit joint indices are exactly `0..n` (default `true`)
    pub fn check_joint_index(mut self, check: bool) -> Self {
        self.check_joint_index = check;
        self
    }
    /// Pose of the base in the world
    pub fn base(mut self, base: P) -> Self {
        self.base = base;
        self
    }
    pub fn gravity(mut self, gravity: Vector3<T>) -> Self {
        self.gravity = gravity;
        self
    }

    /// Validate the links and assemble the tree
    pub fn build(self) -> Result<Robot<T, P>> {
        let RobotBuilder {
            name,
            mut links,
            grippers,
            check_joint_index,
            base,
            gravity,
        } = self;

        let mut name_table = HashMap::new();
        for (k, link) in links.iter_mut().enumerate() {
            if link.name.is_empty() {
                link.name = format!("link-{}", k);
            }
            if name_table.insert(link.name.clone(), LinkId(k)).is_some() {
                return Err(Error::DuplicateName {
                    name: link.name.clone(),
                });
            }
            if !link.is_joint() {
                if link.jindex.is_some() && !link.auto_jindex {
                    return Err(Error::JointIndexOnFixedLink {
                        name: link.name.clone(),
                    });
                }
                link.jindex = None;
            }
            link.parent = None;
            link.children.clear();
        }

        resolve_parents(&mut links, &name_table)?;

        let base_link = {
            let mut roots = links.iter().enumerate().filter(|(_, l)| l.parent.is_none());
            let (first, first_link) = roots.next().ok_or(Error::NoBaseLink)?;
            if let Some((_, second)) = roots.next() {
                return Err(Error::MultipleBaseLinks {
                    first: first_link.name.clone(),
                    second: second.name.clone(),
                });
            }
            LinkId(first)
        };

        for k in 0..links.len() {
            if let Some(parent) = links[k].parent {
                links[parent.0].children.push(LinkId(k));
            }
        }

        let reachable = Descendants::new(&links, base_link).collect::<HashSet<_>>();
        if reachable.len() != links.len() {
            return Err(Error::Disconnected {
                names: links
                    .iter()
                    .enumerate()
                    .filter(|(k, _)| !reachable.contains(&LinkId(*k)))
                    .map(|(_, l)| l.name.clone())
                    .collect(),
            });
        }

        let mut owner = vec![None; links.len()];
        let mut gripper_list = Vec::with_capacity(grippers.len());
        for spec in grippers {
            let root = *name_table
                .get(&spec.root)
                .ok_or_else(|| Error::GripperNotFound {
                    name: spec.root.clone(),
                })?;
            let attachment = links[root.0]
                .parent
                .ok_or_else(|| Error::GripperRootIsBase {
                    name: spec.root.clone(),
                })?;
            let g_links = Descendants::new(&links, root).collect::<Vec<_>>();
            if owner[attachment.0].is_some() || g_links.iter().any(|id| owner[id.0].is_some()) {
                return Err(Error::NestedGripper { name: spec.root });
            }
            for id in &g_links {
                owner[id.0] = Some(gripper_list.len());
            }
            let g_joints = joints_of(&links, &g_links);
            assign_gripper_indices(&mut links, &g_joints);
            gripper_list.push(Gripper {
                name: spec.root,
                root,
                attachment,
                links: g_links,
                n: g_joints.len(),
                tool: spec.tool,
            });
        }

        let order = Descendants::new(&links, base_link)
            .filter(|id| owner[id.0].is_none())
            .collect::<Vec<_>>();
        let joints = joints_of(&links, &order);
        let n = joints.len();
        assign_joint_indices(&mut links, &joints, check_joint_index)?;

        let ee_links = if gripper_list.is_empty() {
            order
                .iter()
                .copied()
                .filter(|id| links[id.0].children.is_empty())
                .collect()
        } else {
            gripper_list.iter().map(|g| g.attachment).collect()
        };

        // every main index is below n here
        let mut qlim = Matrix2xX::zeros(n);
        let mut valid_qlim = false;
        for id in &joints {
            let link = &links[id.0];
            if let (Some(j), Some(range)) = (link.jindex, link.limits) {
                qlim[(0, j)] = range.min;
                qlim[(1, j)] = range.max;
                valid_qlim |=
                    range.is_finite() && (range.min != T::zero() || range.max != T::zero());
            }
        }

        debug!(
            name = name.as_str(),
            n,
            links = order.len(),
            grippers = gripper_list.len(),
            "built kinematic tree"
        );
        Ok(Robot {
            name,
            links,
            name_table,
            owner,
            order,
            base_link,
            ee_links,
            grippers: gripper_list,
            n,
            qlim,
            valid_qlim,
            check_joint_index,
            base,
            gravity,
            path_cache: RefCell::new(HashMap::new()),
            path_walks: Cell::new(0),
        })
    }
}

fn resolve_parents<T, P>(links: &mut [Link<T, P>], name_table: &HashMap<String, LinkId>) -> Result<()>
where
    T: RealField,
{
    // no parents at all means a sequential chain
    if links.iter().all(|l| l.parent_ref.is_none()) {
        for k in 1..links.len() {
            links[k].parent = Some(LinkId(k - 1));
        }
        return Ok(());
    }
    for k in 0..links.len() {
        let parent = match &links[k].parent_ref {
            None => None,
            Some(ParentRef::Name(parent)) => Some(*name_table.get(parent).ok_or_else(|| {
                Error::ParentNotFound {
                    child: links[k].name.clone(),
                    parent: parent.clone(),
                }
            })?),
            Some(ParentRef::Index(index)) => {
                if *index >= links.len() {
                    return Err(Error::ParentIndexOutOfRange {
                        child: links[k].name.clone(),
                        index: *index,
                    });
                }
                Some(LinkId(*index))
            }
        };
        links[k].parent = parent;
    }
    Ok(())
}

fn joints_of<T, P>(links: &[Link<T, P>], ids: &[LinkId]) -> Vec<LinkId>
where
    T: RealField + Copy,
    P: Pose<T>,
{
    ids.iter()
        .copied()
        .filter(|id| links[id.0].is_joint())
        .collect()
}

/// Number the joints in the given (depth-first) order, or validate explicit indices
///
/// Without `check` explicit indices may repeat, but each must still address `q`.
fn assign_joint_indices<T, P>(links: &mut [Link<T, P>], joints: &[LinkId], check: bool) -> Result<()>
where
    T: RealField,
{
    if joints
        .iter()
        .all(|id| links[id.0].jindex.is_none() || links[id.0].auto_jindex)
    {
        for (j, id) in joints.iter().enumerate() {
            links[id.0].jindex = Some(j);
            links[id.0].auto_jindex = true;
        }
        Ok(())
    } else if joints.iter().all(|id| links[id.0].jindex.is_some()) {
        if check {
            let mut unassigned = (0..joints.len()).collect::<BTreeSet<_>>();
            for id in joints {
                let link = &links[id.0];
                if let Some(index) = link.jindex {
                    if !unassigned.remove(&index) {
                        return Err(Error::InvalidJointIndex {
                            name: link.name.clone(),
                            index,
                        });
                    }
                }
            }
            if !unassigned.is_empty() {
                return Err(Error::UnassignedJointIndex {
                    indices: unassigned.into_iter().collect(),
                });
            }
        } else if let Some((name, index)) = joints.iter().find_map(|id| {
            let link = &links[id.0];
            link.jindex
                .filter(|j| *j >= joints.len())
                .map(|j| (link.name.clone(), j))
        }) {
            return Err(Error::InvalidJointIndex { name, index });
        }
        Ok(())
    } else {
        Err(Error::MixedJointIndex)
    }
}

/// Gripper joints keep explicit indices as given, the others are numbered
/// by their position inside the gripper
fn assign_gripper_indices<T, P>(links: &mut [Link<T, P>], joints: &[LinkId])
where
    T: RealField,
{
    for (j, id) in joints.iter().enumerate() {
        let link = &mut links[id.0];
        if link.jindex.is_none() || link.auto_jindex {
            link.jindex = Some(j);
            link.auto_jindex = true;
        }
    }
}

/// Branched kinematic tree of links
///
/// Links live in an arena and refer to each other by `LinkId`. The main
/// links are kept in depth-first order; gripper links stay in the arena but
/// are not part of that order.
///
/// # Examples
///
/// ```
/// use ktree::*;
///
/// // link1 -> link2 -> link3 -> ee, chained in order
/// let robot = Robot::from_ets(&[
///     Et3::<f64>::joint_rz(),
///     Et3::joint_ry(),
///     Et3::tz(1.0),
///     Et3::joint_ry(),
///     Et3::tz(1.0),
/// ])
/// .unwrap();
/// assert_eq!(robot.n(), 3);
/// assert_eq!(robot.iter().count(), 4);
/// ```
#[derive(Debug)]
pub struct Robot<T: RealField, P = Isometry3<T>> {
    pub(crate) name: String,
    pub(crate) links: Vec<Link<T, P>>,
    pub(crate) name_table: HashMap<String, LinkId>,
    /// gripper index of each link
    pub(crate) owner: Vec<Option<usize>>,
    pub(crate) order: Vec<LinkId>,
    pub(crate) base_link: LinkId,
    pub(crate) ee_links: Vec<LinkId>,
    pub(crate) grippers: Vec<Gripper<P>>,
    pub(crate) n: usize,
    pub(crate) qlim: Matrix2xX<T>,
    pub(crate) valid_qlim: bool,
    pub(crate) check_joint_index: bool,
    pub(crate) base: P,
    pub(crate) gravity: Vector3<T>,
    /// (start name, end name) -> path. Single writer, never evicted except by `clear_cache`.
    pub(crate) path_cache: RefCell<HashMap<(String, String), ResolvedPath<P>>>,
    pub(crate) path_walks: Cell<usize>,
}

/// Spatial robot
pub type Robot3<T> = Robot<T, Isometry3<T>>;
/// Planar robot
pub type Robot2<T> = Robot<T, na::Isometry2<T>>;

impl<T, P> Robot<T, P>
where
    T: RealField + Copy,
    P: Pose<T>,
{
    /// Create a serial robot from an elementary transform sequence
    pub fn from_ets(ets: &[Et<T, P>]) -> Result<Self> {
        RobotBuilder::new().links(split_ets(ets)).build()
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Number of joints, excluding gripper joints
    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }
    /// All links including gripper links, indexed by `LinkId::index()`
    pub fn links(&self) -> &[Link<T, P>] {
        &self.links
    }
    pub fn link(&self, id: LinkId) -> Result<&Link<T, P>> {
        self.links.get(id.0).ok_or(Error::InvalidLinkId { id: id.0 })
    }
    /// Find a link (gripper links included) by name
    pub fn find(&self, name: &str) -> Option<LinkId> {
        self.name_table.get(name).copied()
    }
    /// Iterate for the main links
    ///
    /// The order is from parent to children (depth-first).
    pub fn iter(&self) -> impl Iterator<Item = &Link<T, P>> {
        self.order.iter().map(move |id| &self.links[id.0])
    }
    /// Ids of the main links in depth-first order
    pub fn order(&self) -> &[LinkId] {
        &self.order
    }
    /// Iterate for the main joint links in depth-first order
    pub fn iter_joints(&self) -> impl Iterator<Item = &Link<T, P>> {
        self.iter().filter(|link| link.is_joint())
    }
    pub fn base_link(&self) -> LinkId {
        self.base_link
    }
    pub fn ee_links(&self) -> &[LinkId] {
        &self.ee_links
    }
    pub fn grippers(&self) -> &[Gripper<P>] {
        &self.grippers
    }
    /// `true` if the link belongs to the robot and not to a gripper
    pub fn is_main(&self, id: LinkId) -> bool {
        matches!(self.owner.get(id.0), Some(None))
    }
    pub(crate) fn gripper_of(&self, id: LinkId) -> Option<usize> {
        self.owner.get(id.0).copied().flatten()
    }
    /// Joint limits, column `j` holds `[min, max]` of joint `j`
    pub fn qlim(&self) -> &Matrix2xX<T> {
        &self.qlim
    }
    /// `false` if no joint has a finite, non-zero limit
    pub fn is_qlim_valid(&self) -> bool {
        self.valid_qlim
    }
    /// Check `q` against the limits of the main joints, unlimited joints always pass
    pub fn is_within_limits(&self, q: &[T]) -> Result<bool> {
        self.check_q(q)?;
        Ok(self.iter_joints().all(|link| {
            match (link.jindex, link.limits) {
                (Some(j), Some(range)) => range.is_valid(q[j]),
                _ => true,
            }
        }))
    }
    /// Number of leaf links
    pub fn nbranches(&self) -> usize {
        self.iter()
            .filter(|link| link.children.iter().all(|c| !self.is_main(*c)))
            .count()
    }
    /// Links under `start` (itself included) in depth-first order
    pub fn dfs_links(&self, start: LinkId) -> Result<Vec<LinkId>> {
        self.link(start)?;
        Ok(Descendants::new(&self.links, start).collect())
    }
    /// `start` and its ancestors up to the base link
    pub fn ancestors(&self, start: LinkId) -> Result<Vec<LinkId>> {
        self.link(start)?;
        Ok(Ancestors::new(&self.links, Some(start)).collect())
    }
    pub fn base(&self) -> P {
        self.base
    }
    pub fn set_base(&mut self, base: P) {
        self.base = base;
    }
    pub fn gravity(&self) -> Vector3<T> {
        self.gravity
    }
    pub fn set_gravity(&mut self, gravity: Vector3<T>) {
        self.gravity = gravity;
    }
    /// Set the tool offset of a gripper, this drops the cached paths
    pub fn set_gripper_tool(&mut self, gripper: usize, tool: P) -> Result<()> {
        let g = self
            .grippers
            .get_mut(gripper)
            .ok_or_else(|| Error::GripperNotFound {
                name: format!("#{}", gripper),
            })?;
        g.tool = tool;
        self.clear_cache();
        Ok(())
    }
    /// Export the tree as plain links with parent names
    ///
    /// Building the returned builder reproduces this robot.
    pub fn description(&self) -> RobotBuilder<T, P> {
        let links = self
            .links
            .iter()
            .map(|link| {
                let mut link = link.clone();
                link.parent_ref = link
                    .parent
                    .map(|p| ParentRef::Name(self.links[p.0].name.clone()));
                link.parent = None;
                link.children.clear();
                link
            })
            .collect();
        RobotBuilder {
            name: self.name.clone(),
            links,
            grippers: self
                .grippers
                .iter()
                .map(|g| GripperSpec {
                    root: g.name.clone(),
                    tool: g.tool,
                })
                .collect(),
            check_joint_index: self.check_joint_index,
            base: self.base,
            gravity: self.gravity,
        }
    }

    fn fmt_with_indent_level(
        &self,
        id: LinkId,
        level: usize,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let link = &self.links[id.0];
        match self.gripper_of(id) {
            Some(g) if self.grippers[g].root == id => {
                writeln!(f, "{}{} (gripper)", "    ".repeat(level), link)?
            }
            _ => writeln!(f, "{}{}", "    ".repeat(level), link)?,
        }
        for c in &link.children {
            self.fmt_with_indent_level(*c, level + 1, f)?;
        }
        Ok(())
    }
}

impl<T, P> Clone for Robot<T, P>
where
    T: RealField + Copy,
    P: Pose<T>,
{
    /// Rebuild through `RobotBuilder`, the path cache starts empty
    fn clone(&self) -> Self {
        self.description()
            .build()
            .expect("a built robot always rebuilds from its description")
    }
}

impl<T, P> Display for Robot<T, P>
where
    T: RealField + Copy,
    P: Pose<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_with_indent_level(self.base_link, 0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::JointType;
    use na::Translation3;

    fn rz(name: &str) -> LinkBuilder<f64> {
        LinkBuilder::new().name(name).joint_type(JointType::Rotational {
            axis: Vector3::z_axis(),
        })
    }

    #[test]
    fn sequential_chain() {
        let robot = RobotBuilder::new()
            .add_link(rz("link1").finalize())
            .add_link(rz("link2").finalize())
            .add_link(rz("link3").finalize())
            .add_link(LinkBuilder::new().name("ee").finalize())
            .build()
            .unwrap();
        assert_eq!(robot.n(), 3);
        assert_eq!(robot.base_link(), LinkId(0));
        assert_eq!(robot.ee_links(), &[LinkId(3)]);
        assert_eq!(robot.links()[3].parent(), Some(LinkId(2)));
        assert_eq!(
            robot.iter().map(|l| l.jindex()).collect::<Vec<_>>(),
            [Some(0), Some(1), Some(2), None]
        );
        assert!(!robot.is_qlim_valid());
    }

    #[test]
    fn auto_index_follows_depth_first_order() {
        // link1 has two branches, declared in an order different from the visit order
        let robot = RobotBuilder::new()
            .add_link(rz("link1").finalize())
            .add_link(rz("b2").parent("b1").finalize())
            .add_link(rz("b1").parent("link1").finalize())
            .add_link(rz("c1").parent("link1").finalize())
            .build()
            .unwrap();
        let order = robot
            .iter()
            .map(|l| (l.name.as_str(), l.jindex()))
            .collect::<Vec<_>>();
        assert_eq!(
            order,
            [
                ("link1", Some(0)),
                ("b1", Some(1)),
                ("b2", Some(2)),
                ("c1", Some(3))
            ]
        );
        assert_eq!(robot.nbranches(), 2);
        assert_eq!(robot.ee_links().len(), 2);
    }

    #[test]
    fn unnamed_links_get_names() {
        let robot = RobotBuilder::<f64>::new()
            .add_link(rz("").finalize())
            .add_link(rz("").finalize())
            .build()
            .unwrap();
        assert_eq!(robot.links()[0].name, "link-0");
        assert_eq!(robot.find("link-1"), Some(LinkId(1)));
    }

    #[test]
    fn configuration_errors() {
        let dup = RobotBuilder::<f64>::new()
            .add_link(rz("a").finalize())
            .add_link(rz("a").finalize())
            .build();
        assert_eq!(dup.unwrap_err(), Error::DuplicateName { name: "a".into() });

        let two_bases = RobotBuilder::<f64>::new()
            .add_link(rz("a").finalize())
            .add_link(rz("b").finalize())
            .add_link(rz("c").parent("a").finalize())
            .build();
        assert_eq!(
            two_bases.unwrap_err(),
            Error::MultipleBaseLinks {
                first: "a".into(),
                second: "b".into()
            }
        );

        let missing = RobotBuilder::<f64>::new()
            .add_link(rz("a").finalize())
            .add_link(rz("b").parent("x").finalize())
            .build();
        assert!(matches!(missing, Err(Error::ParentNotFound { .. })));

        let cycle = RobotBuilder::<f64>::new()
            .add_link(rz("a").finalize())
            .add_link(rz("b").parent("c").finalize())
            .add_link(rz("c").parent("b").finalize())
            .build();
        assert_eq!(
            cycle.unwrap_err(),
            Error::Disconnected {
                names: vec!["b".into(), "c".into()]
            }
        );

        let no_base = RobotBuilder::<f64>::new()
            .add_link(rz("a").parent_index(0).finalize())
            .build();
        assert_eq!(no_base.unwrap_err(), Error::NoBaseLink);

        let empty = RobotBuilder::<f64>::new().build();
        assert!(empty.unwrap_err().is_configuration_error());
    }

    #[test]
    fn gripper_is_removed_from_the_robot() {
        let robot = RobotBuilder::new()
            .add_link(rz("link1").finalize())
            .add_link(rz("link2").finalize())
            .add_link(LinkBuilder::new().name("hand").finalize())
            .add_link(
                LinkBuilder::new()
                    .name("finger")
                    .joint_type(JointType::Linear {
                        axis: Vector3::y_axis(),
                    })
                    .finalize(),
            )
            .gripper_with_tool("hand", Isometry3::translation(0.0, 0.0, 0.1))
            .build()
            .unwrap();
        assert_eq!(robot.n(), 2);
        assert_eq!(robot.iter().count(), 2);
        let gripper = &robot.grippers()[0];
        assert_eq!(gripper.name(), "hand");
        assert_eq!(gripper.n(), 1);
        assert_eq!(gripper.links(), &[LinkId(2), LinkId(3)]);
        assert_eq!(gripper.attachment(), LinkId(1));
        assert_eq!(robot.ee_links(), &[LinkId(1)]);
        assert_eq!(robot.links()[3].jindex(), Some(0));
        assert!(!robot.is_main(LinkId(3)));
        assert_eq!(robot.nbranches(), 1);
    }

    #[test]
    fn gripper_errors() {
        let base = RobotBuilder::<f64>::new()
            .add_link(rz("a").finalize())
            .gripper("a")
            .build();
        assert_eq!(base.unwrap_err(), Error::GripperRootIsBase { name: "a".into() });

        let missing = RobotBuilder::<f64>::new()
            .add_link(rz("a").finalize())
            .gripper("z")
            .build();
        assert_eq!(missing.unwrap_err(), Error::GripperNotFound { name: "z".into() });

        let nested = RobotBuilder::<f64>::new()
            .add_link(rz("a").finalize())
            .add_link(rz("b").finalize())
            .add_link(rz("c").finalize())
            .gripper("b")
            .gripper("c")
            .build();
        assert_eq!(nested.unwrap_err(), Error::NestedGripper { name: "c".into() });
    }

    #[test]
    fn explicit_joint_index() {
        let build = |indices: &[usize], check: bool| {
            let mut builder = RobotBuilder::<f64>::new().check_joint_index(check);
            for (k, j) in indices.iter().enumerate() {
                builder = builder.add_link(rz(&format!("l{}", k)).joint_index(*j).finalize());
            }
            builder.build()
        };
        let robot = build(&[2, 0, 1], true).unwrap();
        assert_eq!(
            robot.iter().map(|l| l.jindex()).collect::<Vec<_>>(),
            [Some(2), Some(0), Some(1)]
        );
        assert_eq!(
            build(&[0, 1, 1], true).unwrap_err(),
            Error::InvalidJointIndex {
                name: "l2".into(),
                index: 1
            }
        );
        assert_eq!(
            build(&[0, 1, 5], true).unwrap_err(),
            Error::InvalidJointIndex {
                name: "l2".into(),
                index: 5
            }
        );
        // unchecked indices may repeat but must stay inside q
        assert!(build(&[0, 1, 1], false).is_ok());
        assert_eq!(
            build(&[0, 5], false).unwrap_err(),
            Error::InvalidJointIndex {
                name: "l1".into(),
                index: 5
            }
        );

        let mixed = RobotBuilder::<f64>::new()
            .add_link(rz("a").joint_index(0).finalize())
            .add_link(rz("b").finalize())
            .build();
        assert_eq!(mixed.unwrap_err(), Error::MixedJointIndex);

        let fixed = RobotBuilder::<f64>::new()
            .add_link(LinkBuilder::new().name("a").joint_index(0).finalize())
            .build();
        assert_eq!(
            fixed.unwrap_err(),
            Error::JointIndexOnFixedLink { name: "a".into() }
        );
    }

    #[test]
    fn gripper_keeps_global_joint_index() {
        let robot = RobotBuilder::<f64>::new()
            .add_link(rz("a").joint_index(0).finalize())
            .add_link(rz("b").joint_index(1).finalize())
            .add_link(rz("g").joint_index(2).finalize())
            .add_link(rz("finger").finalize())
            .gripper("g")
            .build()
            .unwrap();
        assert_eq!(robot.n(), 2);
        let index = |name| robot.link(robot.find(name).unwrap()).unwrap().jindex();
        assert_eq!(index("g"), Some(2));
        assert_eq!(index("finger"), Some(1));
    }

    #[test]
    fn joint_limit_table() {
        let robot = RobotBuilder::new()
            .add_link(rz("a").limits(Some((-1.0..=1.0).into())).finalize())
            .add_link(rz("b").finalize())
            .build()
            .unwrap();
        assert_eq!(robot.qlim()[(0, 0)], -1.0);
        assert_eq!(robot.qlim()[(1, 0)], 1.0);
        assert_eq!(robot.qlim()[(1, 1)], 0.0);
        assert!(robot.is_qlim_valid());
        assert!(robot.is_within_limits(&[0.5, 10.0]).unwrap());
        assert!(!robot.is_within_limits(&[1.5, 0.0]).unwrap());
        assert!(robot.is_within_limits(&[0.0]).is_err());

        let robot = RobotBuilder::new()
            .add_link(
                rz("a")
                    .limits(Some(crate::joint::Range::new(f64::NAN, 1.0)))
                    .finalize(),
            )
            .build()
            .unwrap();
        assert!(!robot.is_qlim_valid());
    }

    #[test]
    fn clone_rebuilds_the_tree() {
        let robot = RobotBuilder::new()
            .name("arm")
            .add_link(rz("link1").finalize())
            .add_link(
                rz("link2")
                    .translation(Translation3::new(1.0, 0.0, 0.0))
                    .finalize(),
            )
            .add_link(LinkBuilder::new().name("hand").finalize())
            .gripper_with_tool("hand", Isometry3::translation(0.0, 0.0, 0.2))
            .build()
            .unwrap();
        let copy = robot.clone();
        assert_eq!(copy.name(), "arm");
        assert_eq!(copy.n(), robot.n());
        assert_eq!(copy.order(), robot.order());
        assert_eq!(copy.grippers(), robot.grippers());
        assert_eq!(copy.links()[1].origin, robot.links()[1].origin);
        assert_eq!(format!("{}", copy), format!("{}", robot));
    }
}
