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
//! Recursive Newton-Euler inverse dynamics
use na::{DVector, Isometry3, Matrix6, Point3, RealField, Vector3, Vector6};
use nalgebra as na;
use tracing::trace;

use crate::errors::*;
use crate::link::LinkId;
use crate::pose::Pose;
use crate::robot::Robot;
use crate::spatial::*;

/// One moving body of the recursion
#[derive(Debug, Clone)]
struct Body<T: RealField> {
    link: LinkId,
    jindex: Option<usize>,
    parent: Option<usize>,
    /// joint frame seen from the parent body frame, before the joint motion
    xtree: Isometry3<T>,
    inertia: Matrix6<T>,
    s: Vector6<T>,
}

impl<T> Robot<T, Isometry3<T>>
where
    T: RealField + Copy,
{
    /// Bodies in depth-first order, fixed links folded into their nearest joint ancestor
    fn bodies(&self) -> Vec<Body<T>> {
        let mut bodies: Vec<Body<T>> = Vec::with_capacity(self.n);
        // (body index, offset from that body frame) for each link frame
        let mut frames = vec![(None, Isometry3::identity()); self.links.len()];
        for id in &self.order {
            let link = &self.links[id.0];
            let (owner, offset) = link.parent.map_or((None, Isometry3::identity()), |p| frames[p.0]);
            if link.is_joint() {
                let inertial = &link.inertial;
                frames[id.0] = (Some(bodies.len()), Isometry3::identity());
                bodies.push(Body {
                    link: *id,
                    jindex: link.jindex,
                    parent: owner,
                    xtree: offset * link.origin,
                    inertia: spatial_inertia(
                        inertial.mass,
                        &inertial.com(),
                        &inertial.inertia_in_link_frame(),
                    ),
                    s: link.joint_type.motion_subspace(),
                });
            } else {
                let offset = offset * link.origin;
                frames[id.0] = (owner, offset);
                // links rigidly attached to the base carry no joint load
                if let Some(owner) = owner {
                    let inertial = &link.inertial;
                    let com = offset.transform_point(&Point3::from(inertial.com()));
                    let r = offset.rotation.to_rotation_matrix();
                    let inertia = r.matrix() * inertial.inertia_in_link_frame() * r.matrix().transpose();
                    bodies[owner].inertia += spatial_inertia(inertial.mass, &com.coords, &inertia);
                }
            }
        }
        bodies
    }

    /// Joint forces/torques needed to realize the motion `(q, qd, qdd)`
    ///
    /// `gravity` overrides the gravity of the robot, it is given in the world
    /// frame. The output is indexed by joint index.
    ///
    /// # Examples
    ///
    /// ```
    /// use ktree::*;
    /// use nalgebra::Vector3;
    ///
    /// // a unit point mass at 1m from a horizontal axis
    /// let robot = RobotBuilder::new()
    ///     .add_link(LinkBuilder::<f64>::new()
    ///         .name("arm")
    ///         .joint_type(JointType::Rotational { axis: Vector3::z_axis() })
    ///         .inertial(Inertial::point_mass(1.0, Vector3::new(1.0, 0.0, 0.0)))
    ///         .finalize())
    ///     .gravity(Vector3::new(0.0, -9.81, 0.0))
    ///     .build()
    ///     .unwrap();
    /// let tau = robot.rne(&[0.0], &[0.0], &[0.0], None).unwrap();
    /// assert!((tau[0] - 9.81).abs() < 1e-12);
    /// ```
    pub fn rne(
        &self,
        q: &[T],
        qd: &[T],
        qdd: &[T],
        gravity: Option<Vector3<T>>,
    ) -> Result<DVector<T>> {
        self.check_q(q)?;
        self.check_q(qd)?;
        self.check_q(qdd)?;
        let bodies = self.bodies();
        let gravity = gravity.unwrap_or(self.gravity);
        let g = self.base.rotation.inverse_transform_vector(&gravity);
        let a_base = Vector6::new(T::zero(), T::zero(), T::zero(), -g[0], -g[1], -g[2]);
        let at = |x: &[T], j: Option<usize>| j.and_then(|j| x.get(j).copied()).unwrap_or_else(T::zero);

        let mut xup = Vec::with_capacity(bodies.len());
        let mut v: Vec<Vector6<T>> = Vec::with_capacity(bodies.len());
        let mut a: Vec<Vector6<T>> = Vec::with_capacity(bodies.len());
        let mut f: Vec<Vector6<T>> = Vec::with_capacity(bodies.len());
        for body in &bodies {
            let joint_type = &self.links[body.link.0].joint_type;
            let x = SpatialTransform::from_isometry(
                &(body.xtree
                    * <Isometry3<T> as Pose<T>>::joint_motion(joint_type, at(q, body.jindex))),
            );
            let vj = body.s * at(qd, body.jindex);
            let (vi, ai) = match body.parent {
                Some(p) => (
                    x.apply_motion(&v[p]) + vj,
                    x.apply_motion(&a[p]) + body.s * at(qdd, body.jindex),
                ),
                None => (vj, x.apply_motion(&a_base) + body.s * at(qdd, body.jindex)),
            };
            let ai = ai + crm(&vi, &vj);
            f.push(body.inertia * ai + crf(&vi, &(body.inertia * vi)));
            xup.push(x);
            v.push(vi);
            a.push(ai);
        }

        let mut tau = DVector::zeros(self.n);
        for (k, body) in bodies.iter().enumerate().rev() {
            if let Some(j) = body.jindex.filter(|j| *j < self.n) {
                tau[j] = body.s.dot(&f[k]);
            }
            if let Some(p) = body.parent {
                let fp = xup[k].inv_apply_force(&f[k]);
                f[p] += fp;
            }
        }
        trace!(n = self.n, "rne");
        Ok(tau)
    }

    /// Joint torques holding the robot still at `q` against gravity
    pub fn gravity_load(&self, q: &[T], gravity: Option<Vector3<T>>) -> Result<DVector<T>> {
        let zeros = vec![T::zero(); self.n];
        self.rne(q, &zeros, &zeros, gravity)
    }
}
