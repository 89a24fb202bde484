// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bounding volumes used to short-circuit ray tests.

use crate::ray::PickRay;
use nalgebra::{Point3, Vector3};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    /// Calculate bounds over flat `[x, y, z, ...]` positions.
    ///
    /// NaN coordinates are ignored; returns `None` when nothing remains.
    pub fn from_positions(positions: &[f32]) -> Option<Self> {
        let mut min = Point3::new(f32::MAX, f32::MAX, f32::MAX);
        let mut max = Point3::new(f32::MIN, f32::MIN, f32::MIN);
        let mut any = false;

        positions.chunks_exact(3).for_each(|chunk| {
            let (x, y, z) = (chunk[0], chunk[1], chunk[2]);
            if x.is_nan() || y.is_nan() || z.is_nan() {
                return;
            }
            any = true;
            min.x = min.x.min(x);
            min.y = min.y.min(y);
            min.z = min.z.min(z);
            max.x = max.x.max(x);
            max.y = max.y.max(y);
            max.z = max.z.max(z);
        });

        any.then_some(Self { min, max })
    }

    #[inline]
    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    #[inline]
    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Slab test. Returns the entry distance along the ray (0 when the origin
    /// is inside the box).
    pub fn intersect_ray(&self, ray: &PickRay) -> Option<f64> {
        let mut t_min = 0.0f64;
        let mut t_max = f64::INFINITY;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let dir = ray.direction[axis];
            let lo = f64::from(self.min[axis]);
            let hi = f64::from(self.max[axis]);

            if dir.abs() < f64::EPSILON {
                // Parallel to the slab: must already be inside it
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / dir;
            let mut t0 = (lo - origin) * inv;
            let mut t1 = (hi - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }

        Some(t_min)
    }
}

/// Bounding sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Point3<f32>,
    pub radius: f32,
}

impl BoundingSphere {
    /// Sphere centred on the box centre, enclosing every position
    pub fn from_positions(positions: &[f32], aabb: &Aabb) -> Self {
        let center = aabb.center();
        let radius_sq = positions
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .filter(|p| !(p.x.is_nan() || p.y.is_nan() || p.z.is_nan()))
            .map(|p| nalgebra::distance_squared(&center, &p))
            .fold(0.0f32, f32::max);

        Self {
            center,
            radius: radius_sq.sqrt(),
        }
    }

    /// Check whether the ray passes through the sphere in front of its origin
    pub fn intersects_ray(&self, ray: &PickRay) -> bool {
        let center = self.center.cast::<f64>();
        let radius = f64::from(self.radius);
        let to_center = center - ray.origin;
        let along = to_center.dot(&ray.direction);
        let dist_sq = to_center.norm_squared() - along * along;

        if dist_sq > radius * radius {
            return false;
        }
        // Sphere entirely behind the origin
        along >= 0.0 || to_center.norm_squared() <= radius * radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_cube() -> Vec<f32> {
        vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]
    }

    fn ray(origin: [f64; 3], dir: [f64; 3]) -> PickRay {
        PickRay::new(
            Point3::new(origin[0], origin[1], origin[2]),
            Vector3::new(dir[0], dir[1], dir[2]),
        )
        .unwrap()
    }

    #[test]
    fn test_aabb_from_positions() {
        let aabb = Aabb::from_positions(&[1.0, 2.0, 3.0, -1.0, 5.0, f32::NAN, -2.0, 0.0, 0.5])
            .unwrap();
        assert_eq!(aabb.min, Point3::new(-2.0, 0.0, 0.5));
        assert_eq!(aabb.max, Point3::new(1.0, 2.0, 3.0));
        assert!(Aabb::from_positions(&[]).is_none());
    }

    #[test]
    fn test_aabb_ray() {
        let aabb = Aabb::from_positions(&unit_cube()).unwrap();
        let hit = aabb.intersect_ray(&ray([0.5, 0.5, 5.0], [0.0, 0.0, -1.0]));
        assert_relative_eq!(hit.unwrap(), 4.0);
        assert!(aabb.intersect_ray(&ray([2.5, 0.5, 5.0], [0.0, 0.0, -1.0])).is_none());
        assert!(aabb.intersect_ray(&ray([0.5, 0.5, 5.0], [0.0, 0.0, 1.0])).is_none());
        assert_eq!(aabb.intersect_ray(&ray([0.5, 0.5, 0.5], [1.0, 0.0, 0.0])), Some(0.0));
    }

    #[test]
    fn test_sphere_ray() {
        let positions = unit_cube();
        let aabb = Aabb::from_positions(&positions).unwrap();
        let sphere = BoundingSphere::from_positions(&positions, &aabb);
        assert_relative_eq!(sphere.radius, 0.75f32.sqrt(), epsilon = 1e-6);

        assert!(sphere.intersects_ray(&ray([0.5, 0.5, 5.0], [0.0, 0.0, -1.0])));
        assert!(!sphere.intersects_ray(&ray([3.0, 0.5, 5.0], [0.0, 0.0, -1.0])));
        assert!(!sphere.intersects_ray(&ray([0.5, 0.5, 5.0], [0.0, 0.0, 1.0])));
    }
}
