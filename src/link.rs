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
//! Rigid link segment of a kinematic tree
use na::{Isometry3, Matrix3, RealField, Translation3, UnitQuaternion, Vector3};
use nalgebra as na;
use std::fmt::{self, Display};

use crate::joint::*;
use crate::pose::Pose;
use crate::shape::Collision;

/// Stable handle of a link inside a `Robot`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(pub(crate) usize);

impl LinkId {
    /// Handle of the link at `index` in `Robot::links()`, checked when used
    #[inline]
    pub fn from_index(index: usize) -> Self {
        LinkId(index)
    }
    /// Position in `Robot::links()`
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a link names its parent before the tree is built
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentRef {
    /// Name of the parent link
    Name(String),
    /// Position of the parent in the collection handed to the builder
    Index(usize),
}

/// Mass properties of a link
///
/// `origin` is the center of mass frame relative to the link frame, `inertia`
/// is the rotational inertia about the center of mass in that frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Inertial<T: RealField> {
    origin: Isometry3<T>,
    pub mass: T,
    pub inertia: Matrix3<T>,
}

impl<T> Inertial<T>
where
    T: RealField + Copy,
{
    pub fn new(origin: Isometry3<T>, mass: T, inertia: Matrix3<T>) -> Self {
        Self {
            origin,
            mass,
            inertia,
        }
    }
    /// Point mass at the link frame origin
    pub fn from_mass(mass: T) -> Self {
        Self::new(Isometry3::identity(), mass, Matrix3::zeros())
    }
    /// Point mass at `com`
    ///
    /// # Examples
    ///
    /// ```
    /// use nalgebra::Vector3;
    /// let inertial = ktree::Inertial::point_mass(2.0, Vector3::new(0.5, 0.0, 0.0));
    /// assert_eq!(inertial.com(), Vector3::new(0.5, 0.0, 0.0));
    /// ```
    pub fn point_mass(mass: T, com: Vector3<T>) -> Self {
        Self::new(
            Isometry3::from_parts(Translation3::from(com), UnitQuaternion::identity()),
            mass,
            Matrix3::zeros(),
        )
    }
    #[inline]
    pub fn origin(&self) -> &Isometry3<T> {
        &self.origin
    }
    #[inline]
    pub fn set_origin(&mut self, origin: Isometry3<T>) {
        self.origin = origin;
    }
    /// Center of mass in the link frame
    #[inline]
    pub fn com(&self) -> Vector3<T> {
        self.origin.translation.vector
    }
    /// Inertia about the center of mass, with the axes of the link frame
    pub fn inertia_in_link_frame(&self) -> Matrix3<T> {
        let r = self.origin.rotation.to_rotation_matrix();
        r.matrix() * self.inertia * r.matrix().transpose()
    }
}

impl<T> Default for Inertial<T>
where
    T: RealField + Copy,
{
    fn default() -> Self {
        Self::from_mass(T::zero())
    }
}

/// One rigid segment of the mechanism, joint or fixed
///
/// The local transform of a link is `origin * joint_motion(q)`, so the link
/// frame sits after its joint.
#[derive(Debug, Clone)]
pub struct Link<T: RealField, P = Isometry3<T>> {
    /// Name of this link, unique within a tree
    pub name: String,
    /// Type of the joint variable of this link
    pub joint_type: JointType<T>,
    /// Constant transform from the parent frame to the joint axis
    pub origin: P,
    /// Joint limits (`qlim`)
    pub limits: Option<Range<T>>,
    pub inertial: Inertial<T>,
    pub collisions: Vec<Collision<T>>,
    pub(crate) jindex: Option<usize>,
    pub(crate) auto_jindex: bool,
    pub(crate) parent_ref: Option<ParentRef>,
    pub(crate) parent: Option<LinkId>,
    pub(crate) children: Vec<LinkId>,
}

impl<T, P> Link<T, P>
where
    T: RealField + Copy,
    P: Pose<T>,
{
    /// Create new Link with name and type
    ///
    /// # Examples
    ///
    /// ```
    /// use nalgebra::{Isometry3, Vector3};
    ///
    /// let fixed = ktree::Link::<f32, Isometry3<f32>>::new("f0", ktree::JointType::Fixed);
    /// assert!(!fixed.is_joint());
    /// let rot = ktree::Link::<f64, Isometry3<f64>>::new(
    ///     "r0",
    ///     ktree::JointType::Rotational { axis: Vector3::y_axis() },
    /// );
    /// assert!(rot.is_joint());
    /// assert!(rot.jindex().is_none());
    /// ```
    pub fn new(name: &str, joint_type: JointType<T>) -> Self {
        Link {
            name: name.to_owned(),
            joint_type,
            origin: P::identity(),
            limits: None,
            inertial: Inertial::default(),
            collisions: Vec::new(),
            jindex: None,
            auto_jindex: false,
            parent_ref: None,
            parent: None,
            children: Vec::new(),
        }
    }
    #[inline]
    pub fn is_joint(&self) -> bool {
        self.joint_type.is_movable()
    }
    /// Position of the joint variable in the configuration vector
    #[inline]
    pub fn jindex(&self) -> Option<usize> {
        self.jindex
    }
    #[inline]
    pub fn parent(&self) -> Option<LinkId> {
        self.parent
    }
    #[inline]
    pub fn children(&self) -> &[LinkId] {
        &self.children
    }
    #[inline]
    pub fn parent_ref(&self) -> Option<&ParentRef> {
        self.parent_ref.as_ref()
    }
    /// Calculate the transform from the parent frame to this link frame
    ///
    /// `position` is ignored for fixed links.
    ///
    /// # Examples
    ///
    /// ```
    /// use nalgebra::{Isometry3, Vector3};
    ///
    /// let lin = ktree::LinkBuilder::<f64>::new()
    ///     .joint_type(ktree::JointType::Linear { axis: Vector3::x_axis() })
    ///     .finalize();
    /// assert_eq!(lin.local_transform(-1.0).translation.vector.x, -1.0);
    /// ```
    pub fn local_transform(&self, position: T) -> P {
        match self.joint_type {
            JointType::Fixed => self.origin,
            _ => self.origin * P::joint_motion(&self.joint_type, position),
        }
    }
}

impl<T: RealField, P> Display for Link<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.joint_type)?;
        if let Some(j) = self.jindex {
            write!(f, " q{}", j)?;
        }
        Ok(())
    }
}

/// Build a `Link<T, P>`
///
/// # Examples
///
/// ```
/// use ktree::*;
/// use nalgebra::{Translation3, Vector3};
///
/// let l0 = LinkBuilder::<f64>::new()
///     .name("link_pitch")
///     .parent("base")
///     .translation(Translation3::new(0.0, 0.1, 0.0))
///     .joint_type(JointType::Rotational { axis: Vector3::y_axis() })
///     .finalize();
/// println!("{:?}", l0);
/// ```
#[derive(Debug, Clone)]
pub struct LinkBuilder<T: RealField, P = Isometry3<T>> {
    link: Link<T, P>,
}

impl<T, P> Default for LinkBuilder<T, P>
where
    T: RealField + Copy,
    P: Pose<T>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, P> LinkBuilder<T, P>
where
    T: RealField + Copy,
    P: Pose<T>,
{
    pub fn new() -> Self {
        Self {
            link: Link::new("", JointType::Fixed),
        }
    }
    /// Set the name of the `Link`. An empty name is replaced at build time.
    pub fn name(mut self, name: &str) -> Self {
        self.link.name = name.to_owned();
        self
    }
    /// Set the parent by name
    pub fn parent(mut self, parent_name: &str) -> Self {
        self.link.parent_ref = Some(ParentRef::Name(parent_name.to_owned()));
        self
    }
    /// Set the parent by its position in the input collection
    pub fn parent_index(mut self, index: usize) -> Self {
        self.link.parent_ref = Some(ParentRef::Index(index));
        self
    }
    pub fn joint_type(mut self, joint_type: JointType<T>) -> Self {
        self.link.joint_type = joint_type;
        self
    }
    /// Set the origin transform of this link
    pub fn origin(mut self, origin: P) -> Self {
        self.link.origin = origin;
        self
    }
    /// Set joint limits
    pub fn limits(mut self, limits: Option<Range<T>>) -> Self {
        self.link.limits = limits;
        self
    }
    /// Set an explicit joint index
    pub fn joint_index(mut self, jindex: usize) -> Self {
        self.link.jindex = Some(jindex);
        self.link.auto_jindex = false;
        self
    }
    pub(crate) fn auto_joint_index(mut self, jindex: usize) -> Self {
        self.link.jindex = Some(jindex);
        self.link.auto_jindex = true;
        self
    }
    pub fn inertial(mut self, inertial: Inertial<T>) -> Self {
        self.link.inertial = inertial;
        self
    }
    pub fn add_collision(mut self, collision: Collision<T>) -> Self {
        self.link.collisions.push(collision);
        self
    }
    /// Create `Link` instance
    pub fn finalize(self) -> Link<T, P> {
        self.link
    }
}

impl<T> LinkBuilder<T, Isometry3<T>>
where
    T: RealField + Copy,
{
    /// Set the translation of the origin transform
    pub fn translation(mut self, translation: Translation3<T>) -> Self {
        self.link.origin.translation = translation;
        self
    }
    /// Set the rotation of the origin transform
    pub fn rotation(mut self, rotation: UnitQuaternion<T>) -> Self {
        self.link.origin.rotation = rotation;
        self
    }
}

#[test]
fn test_inertia_in_link_frame() {
    use approx::assert_relative_eq;

    let mut inertial = Inertial::new(
        Isometry3::identity(),
        1.0,
        Matrix3::from_diagonal(&Vector3::new(1.0, 2.0, 3.0)),
    );
    inertial.set_origin(Isometry3::from_parts(
        Translation3::new(0.0, 0.0, 1.0),
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2),
    ));
    assert_eq!(inertial.com(), Vector3::new(0.0, 0.0, 1.0));
    assert_relative_eq!(
        inertial.inertia_in_link_frame(),
        Matrix3::from_diagonal(&Vector3::new(2.0, 1.0, 3.0)),
        epsilon = 1e-12
    );
}
