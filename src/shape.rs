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
//! Collision shapes and closest point queries
use na::{Isometry3, Point3, RealField, Translation3, UnitQuaternion, Vector3, Vector6};
use nalgebra as na;
use tracing::debug;

/// Primitive geometry of a collision shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry<T: RealField> {
    Sphere {
        radius: T,
    },
    /// Segment along the local z axis, centered at the origin, swept by `radius`
    Capsule {
        radius: T,
        length: T,
    },
}

impl<T> Geometry<T>
where
    T: RealField + Copy,
{
    /// Core segment and radius in the frame given by `pose`
    fn segment(&self, pose: &Isometry3<T>) -> (Point3<T>, Point3<T>, T) {
        match *self {
            Geometry::Sphere { radius } => {
                let c = Point3::from(pose.translation.vector);
                (c, c, radius)
            }
            Geometry::Capsule { radius, length } => {
                let half = length * na::convert(0.5);
                let a = pose.transform_point(&Point3::new(T::zero(), T::zero(), -half));
                let b = pose.transform_point(&Point3::new(T::zero(), T::zero(), half));
                (a, b, radius)
            }
        }
    }
}

/// Collision shape attached to a link
#[derive(Debug, Clone, PartialEq)]
pub struct Collision<T: RealField> {
    pub name: String,
    /// Pose of the shape relative to the link frame
    pub origin: Isometry3<T>,
    pub geometry: Geometry<T>,
}

impl<T> Collision<T>
where
    T: RealField + Copy,
{
    pub fn new(name: &str, origin: Isometry3<T>, geometry: Geometry<T>) -> Self {
        Self {
            name: name.to_owned(),
            origin,
            geometry,
        }
    }
    /// Place this collision in the world, `link_pose` is the world pose of its link
    pub fn to_shape(&self, link_pose: &Isometry3<T>) -> Shape<T> {
        Shape::new(self.geometry, link_pose * self.origin)
    }
}

/// Result of a closest point query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proximity<T: RealField> {
    /// Signed surface distance, negative if penetrating
    pub distance: T,
    /// Closest point on the queried shape
    pub point: Point3<T>,
    /// Closest point on the other shape
    pub other_point: Point3<T>,
    /// Unit vector from `point` towards `other_point`
    pub normal: Vector3<T>,
}

/// Shape placed in the world with its own velocity
#[derive(Debug, Clone, PartialEq)]
pub struct Shape<T: RealField> {
    pub geometry: Geometry<T>,
    /// World pose
    pub pose: Isometry3<T>,
    /// Twist of the shape, `[v; w]`
    pub velocity: Vector6<T>,
}

impl<T> Shape<T>
where
    T: RealField + Copy,
{
    /// Static shape
    pub fn new(geometry: Geometry<T>, pose: Isometry3<T>) -> Self {
        Self {
            geometry,
            pose,
            velocity: Vector6::zeros(),
        }
    }
    pub fn with_velocity(mut self, velocity: Vector6<T>) -> Self {
        self.velocity = velocity;
        self
    }
    /// Sphere at `center`
    pub fn sphere(radius: T, center: Point3<T>) -> Self {
        Self::new(
            Geometry::Sphere { radius },
            Isometry3::from_parts(Translation3::from(center.coords), UnitQuaternion::identity()),
        )
    }
    /// Capsule whose core segment spans `a` to `b`
    ///
    /// # Examples
    ///
    /// ```
    /// use nalgebra::Point3;
    /// let c = ktree::Shape::capsule_between(0.1, Point3::new(0.0, 0.0, 1.0), Point3::new(0.0, 0.0, 3.0));
    /// assert_eq!(c.pose.translation.vector.z, 2.0);
    /// ```
    pub fn capsule_between(radius: T, a: Point3<T>, b: Point3<T>) -> Self {
        let axis = b - a;
        let length = axis.norm();
        let mid = na::center(&a, &b);
        let rotation = UnitQuaternion::rotation_between(&Vector3::z(), &axis).unwrap_or_else(|| {
            if length > T::zero() {
                // antiparallel to z
                UnitQuaternion::from_axis_angle(&Vector3::x_axis(), T::pi())
            } else {
                UnitQuaternion::identity()
            }
        });
        Self::new(
            Geometry::Capsule { radius, length },
            Isometry3::from_parts(Translation3::from(mid.coords), rotation),
        )
    }
    /// Closest points between this shape and `other`
    ///
    /// Returns `None` if the shapes are farther apart than `influence_distance`.
    /// If the core segments touch, the normal is taken perpendicular to the
    /// first non-degenerate core.
    ///
    /// # Examples
    ///
    /// ```
    /// use nalgebra::Point3;
    /// let a = ktree::Shape::sphere(0.5, Point3::origin());
    /// let b = ktree::Shape::sphere(0.5, Point3::new(2.0, 0.0, 0.0));
    /// let p = a.closest_point(&b, 2.0).unwrap();
    /// assert_eq!(p.distance, 1.0);
    /// assert_eq!(p.point, Point3::new(0.5, 0.0, 0.0));
    /// assert!(a.closest_point(&b, 0.5).is_none());
    /// ```
    pub fn closest_point(&self, other: &Shape<T>, influence_distance: T) -> Option<Proximity<T>> {
        let (a0, a1, ra) = self.geometry.segment(&self.pose);
        let (b0, b1, rb) = other.geometry.segment(&other.pose);
        let (ca, cb) = closest_points_on_segments(&a0, &a1, &b0, &b1);
        let between = cb - ca;
        let center_distance = between.norm();
        let distance = center_distance - ra - rb;
        if distance > influence_distance {
            return None;
        }
        let normal = if center_distance > na::convert(1.0e-12) {
            between / center_distance
        } else {
            debug!("shape cores touch, using a fallback normal");
            fallback_normal(&(a1 - a0), &(b1 - b0))
        };
        Some(Proximity {
            distance,
            point: ca + normal * ra,
            other_point: cb - normal * rb,
            normal,
        })
    }
}

fn clamp01<T: RealField + Copy>(v: T) -> T {
    if v < T::zero() {
        T::zero()
    } else if v > T::one() {
        T::one()
    } else {
        v
    }
}

/// Unit vector perpendicular to the first of `d1`, `d2` with a length
fn fallback_normal<T: RealField + Copy>(d1: &Vector3<T>, d2: &Vector3<T>) -> Vector3<T> {
    let eps: T = na::convert(1.0e-24);
    let Some(d) = [d1, d2].into_iter().find(|d| d.norm_squared() > eps) else {
        return Vector3::x();
    };
    let (x, y, z) = (d.x * d.x, d.y * d.y, d.z * d.z);
    let axis = if x <= y && x <= z {
        Vector3::x()
    } else if y <= z {
        Vector3::y()
    } else {
        Vector3::z()
    };
    d.cross(&axis).normalize()
}

/// Closest points of segments `p1-q1` and `p2-q2`
fn closest_points_on_segments<T>(
    p1: &Point3<T>,
    q1: &Point3<T>,
    p2: &Point3<T>,
    q2: &Point3<T>,
) -> (Point3<T>, Point3<T>)
where
    T: RealField + Copy,
{
    let eps: T = na::convert(1.0e-12);
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.norm_squared();
    let e = d2.norm_squared();
    let f = d2.dot(&r);

    let (s, t) = if a <= eps && e <= eps {
        (T::zero(), T::zero())
    } else if a <= eps {
        (T::zero(), clamp01(f / e))
    } else {
        let c = d1.dot(&r);
        if e <= eps {
            (clamp01(-c / a), T::zero())
        } else {
            let b = d1.dot(&d2);
            let denom = a * e - b * b;
            let s = if denom > eps {
                clamp01((b * f - c * e) / denom)
            } else {
                T::zero()
            };
            let t = (b * s + f) / e;
            if t < T::zero() {
                (clamp01(-c / a), T::zero())
            } else if t > T::one() {
                (clamp01((b - c) / a), T::one())
            } else {
                (s, t)
            }
        }
    };
    (p1 + d1 * s, p2 + d2 * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn crossing_capsules() {
        let a = Shape::capsule_between(0.1, Point3::new(-1.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0));
        let b = Shape::capsule_between(0.1, Point3::new(0.0, -1.0, 1.0), Point3::new(0.0, 1.0, 1.0));
        let p = a.closest_point(&b, 10.0).unwrap();
        assert_relative_eq!(p.distance, 0.8, epsilon = 1e-12);
        assert_relative_eq!(p.point, Point3::new(0.0, 0.0, 0.1), epsilon = 1e-12);
        assert_relative_eq!(p.other_point, Point3::new(0.0, 0.0, 0.9), epsilon = 1e-12);
        assert_relative_eq!(p.normal, Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn sphere_beyond_segment_end() {
        let a = Shape::capsule_between(0.0, Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 1.0));
        let b = Shape::sphere(0.5, Point3::new(0.0, 0.0, 3.0));
        let p = a.closest_point(&b, 10.0).unwrap();
        assert_relative_eq!(p.distance, 1.5, epsilon = 1e-12);
        assert_relative_eq!(p.point, Point3::new(0.0, 0.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn penetration_is_negative() {
        let a = Shape::sphere(1.0, Point3::origin());
        let b = Shape::sphere(1.0, Point3::new(1.5, 0.0, 0.0));
        let p = a.closest_point(&b, 0.1).unwrap();
        assert_relative_eq!(p.distance, -0.5);
        assert_relative_eq!(p.normal, Vector3::x());
    }

    #[test]
    fn touching_cores_still_give_a_proximity() {
        let ball = Shape::sphere(0.1, Point3::origin());
        let line = Shape::capsule_between(0.05, Point3::new(-1.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0));
        let p = ball.closest_point(&line, 0.3).unwrap();
        assert_relative_eq!(p.distance, -0.15, epsilon = 1e-12);
        assert_relative_eq!(p.normal, Vector3::z(), epsilon = 1e-12);
        assert_relative_eq!(p.point, Point3::new(0.0, 0.0, 0.1), epsilon = 1e-12);

        let p = ball.closest_point(&Shape::sphere(0.2, Point3::origin()), 0.0).unwrap();
        assert_relative_eq!(p.distance, -0.3, epsilon = 1e-12);
        assert_relative_eq!(p.normal, Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn collision_to_shape() {
        let col = Collision::new(
            "c",
            Isometry3::translation(0.0, 0.0, 0.5),
            Geometry::Sphere { radius: 0.1 },
        );
        let shape = col.to_shape(&Isometry3::translation(1.0, 0.0, 0.0));
        assert_relative_eq!(shape.pose.translation.vector, Vector3::new(1.0, 0.0, 0.5));
    }
}
