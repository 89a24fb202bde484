// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pick rays, cameras and viewport conversion
//!
//! A pointer event becomes a [`PickRay`] in two steps: [`Viewport::to_ndc`]
//! maps pixel coordinates to normalized device coordinates, and
//! [`PickRay::from_camera`] unprojects them through the camera.

use nalgebra::{Matrix4, Orthographic3, Perspective3, Point2, Point3, Vector3};

/// World-space ray with a normalized direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickRay {
    pub origin: Point3<f64>,
    pub direction: Vector3<f64>,
}

impl PickRay {
    /// Create a ray; `None` if the direction has zero length or is not finite
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Option<Self> {
        let norm = direction.norm();
        if !norm.is_finite() || norm < f64::EPSILON {
            return None;
        }
        Some(Self {
            origin,
            direction: direction / norm,
        })
    }

    /// Point at distance `t` along the ray
    #[inline]
    pub fn at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction * t
    }

    /// Unproject normalized device coordinates through a camera.
    ///
    /// The ray points from the near plane towards the far plane. Perspective
    /// rays start at the eye, so geometry between the eye and the near plane
    /// is still pickable; orthographic rays start on the near plane.
    /// Returns `None` if the camera matrices are not invertible.
    pub fn from_camera(camera: &Camera, ndc: Point2<f64>) -> Option<Self> {
        let inverse = (camera.projection * camera.view).try_inverse()?;
        let near = inverse.transform_point(&Point3::new(ndc.x, ndc.y, -1.0));
        let far = inverse.transform_point(&Point3::new(ndc.x, ndc.y, 1.0));
        let origin = if camera.is_perspective() {
            camera.view.try_inverse()?.transform_point(&Point3::origin())
        } else {
            near
        };
        Self::new(origin, far - near)
    }
}

/// View and projection matrices of the rendering camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub view: Matrix4<f64>,
    pub projection: Matrix4<f64>,
}

impl Camera {
    pub fn new(view: Matrix4<f64>, projection: Matrix4<f64>) -> Self {
        Self { view, projection }
    }

    /// Perspective projections have no constant w term
    #[inline]
    pub fn is_perspective(&self) -> bool {
        self.projection[(3, 3)] == 0.0
    }

    /// Right-handed perspective camera looking from `eye` at `target`.
    ///
    /// `fov_y` is the vertical field of view in degrees.
    pub fn perspective(
        eye: Point3<f64>,
        target: Point3<f64>,
        up: Vector3<f64>,
        fov_y: f64,
        aspect: f64,
        near: f64,
        far: f64,
    ) -> Self {
        Self {
            view: Matrix4::look_at_rh(&eye, &target, &up),
            projection: Perspective3::new(aspect, fov_y.to_radians(), near, far).to_homogeneous(),
        }
    }

    /// Right-handed orthographic camera with a symmetric view volume of
    /// `half_height` and the given aspect ratio
    pub fn orthographic(
        eye: Point3<f64>,
        target: Point3<f64>,
        up: Vector3<f64>,
        half_height: f64,
        aspect: f64,
        near: f64,
        far: f64,
    ) -> Self {
        let half_width = half_height * aspect;
        Self {
            view: Matrix4::look_at_rh(&eye, &target, &up),
            projection: Orthographic3::new(-half_width, half_width, -half_height, half_height, near, far)
                .to_homogeneous(),
        }
    }
}

/// Screen rectangle of the rendering canvas, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Convert pointer coordinates to normalized device coordinates
    /// (x right, y up, both in `[-1, 1]` inside the viewport)
    pub fn to_ndc(&self, client_x: f64, client_y: f64) -> Option<Point2<f64>> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        Some(Point2::new(
            ((client_x - self.left) / self.width) * 2.0 - 1.0,
            -((client_y - self.top) / self.height) * 2.0 + 1.0,
        ))
    }
}
