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
//! Spatial vector algebra
//!
//! Motion and force vectors are `Vector6` laid out angular part first,
//! `[w; v]` and `[n; f]`.
use na::{Isometry3, Matrix3, Matrix6, RealField, Vector3, Vector6};
use nalgebra as na;

#[inline]
fn split<T: RealField + Copy>(x: &Vector6<T>) -> (Vector3<T>, Vector3<T>) {
    (
        x.fixed_rows::<3>(0).into_owned(),
        x.fixed_rows::<3>(3).into_owned(),
    )
}

#[inline]
fn join<T: RealField + Copy>(a: &Vector3<T>, b: &Vector3<T>) -> Vector6<T> {
    Vector6::new(a[0], a[1], a[2], b[0], b[1], b[2])
}

/// Coordinate transform of spatial vectors from a parent frame to a child frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialTransform<T: RealField> {
    /// rotation from parent coordinates to child coordinates
    e: Matrix3<T>,
    /// child origin in parent coordinates
    r: Vector3<T>,
}

impl<T> SpatialTransform<T>
where
    T: RealField + Copy,
{
    /// `pose` is the child frame seen from the parent frame
    pub fn from_isometry(pose: &Isometry3<T>) -> Self {
        Self {
            e: pose.rotation.to_rotation_matrix().matrix().transpose(),
            r: pose.translation.vector,
        }
    }
    /// Parent motion vector in child coordinates
    pub fn apply_motion(&self, m: &Vector6<T>) -> Vector6<T> {
        let (w, v) = split(m);
        join(&(self.e * w), &(self.e * (v - self.r.cross(&w))))
    }
    /// Child force vector in parent coordinates
    pub fn inv_apply_force(&self, f: &Vector6<T>) -> Vector6<T> {
        let (n, f) = split(f);
        let et = self.e.transpose();
        let fp = et * f;
        join(&(et * n + self.r.cross(&fp)), &fp)
    }
}

/// Spatial cross product for motion vectors, `v x m`
pub fn crm<T: RealField + Copy>(v: &Vector6<T>, m: &Vector6<T>) -> Vector6<T> {
    let (w, vl) = split(v);
    let (mw, mv) = split(m);
    join(&w.cross(&mw), &(w.cross(&mv) + vl.cross(&mw)))
}

/// Spatial cross product for force vectors, `v x* f`
pub fn crf<T: RealField + Copy>(v: &Vector6<T>, f: &Vector6<T>) -> Vector6<T> {
    let (w, vl) = split(v);
    let (n, f) = split(f);
    join(&(w.cross(&n) + vl.cross(&f)), &w.cross(&f))
}

/// Spatial inertia of a body with `mass` at `com`, `inertia` about the center of mass
pub fn spatial_inertia<T: RealField + Copy>(
    mass: T,
    com: &Vector3<T>,
    inertia: &Matrix3<T>,
) -> Matrix6<T> {
    let cx = com.cross_matrix();
    let mut i = Matrix6::zeros();
    i.fixed_view_mut::<3, 3>(0, 0)
        .copy_from(&(inertia + cx * cx.transpose() * mass));
    i.fixed_view_mut::<3, 3>(0, 3).copy_from(&(cx * mass));
    i.fixed_view_mut::<3, 3>(3, 0).copy_from(&(cx.transpose() * mass));
    i.fixed_view_mut::<3, 3>(3, 3)
        .copy_from(&(Matrix3::identity() * mass));
    i
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use na::{Translation3, UnitQuaternion};

    #[test]
    fn force_transform_is_dual_to_motion_transform() {
        let pose = Isometry3::from_parts(
            Translation3::new(0.3, -0.2, 1.0),
            UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3),
        );
        let x = SpatialTransform::from_isometry(&pose);
        let m = Vector6::new(0.1, 0.2, 0.3, 0.4, 0.5, 0.6);
        let f = Vector6::new(-1.0, 0.5, 2.0, 0.0, 1.0, -0.5);
        // power is invariant: (X m) . f_child == m . (X* f_child)
        assert_relative_eq!(
            x.apply_motion(&m).dot(&f),
            m.dot(&x.inv_apply_force(&f)),
            epsilon = 1e-12
        );
    }

    #[test]
    fn point_mass_inertia() {
        let i = spatial_inertia(2.0, &Vector3::new(1.0, 0.0, 0.0), &Matrix3::zeros());
        // pure rotation about z at unit speed
        let h = i * Vector6::new(0.0, 0.0, 1.0, 0.0, 0.0, 0.0);
        assert_relative_eq!(h, Vector6::new(0.0, 0.0, 2.0, 0.0, 2.0, 0.0));
    }

    #[test]
    fn cross_products() {
        let v = Vector6::new(0.0, 0.0, 1.0, 1.0, 0.0, 0.0);
        let m = Vector6::new(0.0, 0.0, 0.0, 0.0, 1.0, 0.0);
        assert_relative_eq!(crm(&v, &m), Vector6::new(0.0, 0.0, 0.0, -1.0, 0.0, 0.0));
        // crf(v) = -crm(v)^T
        let f = Vector6::new(0.5, -1.0, 2.0, 1.0, 3.0, -2.0);
        assert_relative_eq!(crf(&v, &f).dot(&m), -f.dot(&crm(&v, &m)), epsilon = 1e-12);
    }
}
