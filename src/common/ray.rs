use cgmath::{InnerSpace, Matrix4, Point3, Vector3};

use super::EPSILON;
use crate::camera::Camera;

/// A ray in 3D space, defined by an origin point and a direction vector.
#[derive(Debug, Copy, Clone)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>, // Should be normalized
}

impl Ray {
    /// Creates a new ray with the given origin and direction.
    /// The direction will be normalized automatically.
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Creates a ray through a screen-space pixel coordinate.
    ///
    /// The ray originates on the camera's near plane and points through the
    /// matching point on the far plane. Returns `None` if the camera's
    /// view-projection matrix is not invertible.
    pub fn from_screen_point(
        screen_x: f32,
        screen_y: f32,
        screen_width: u32,
        screen_height: u32,
        camera: &Camera,
    ) -> Option<Self> {
        let near =
            camera.unproject_point_screen(screen_x, screen_y, 0.0, screen_width, screen_height)?;
        let far =
            camera.unproject_point_screen(screen_x, screen_y, 1.0, screen_width, screen_height)?;
        Some(Self::new(near, far - near))
    }

    /// Returns a point along the ray at parameter t.
    /// The point is calculated as: origin + t * direction
    pub fn point_at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }

    /// Transforms the ray by the given 4x4 transformation matrix.
    pub fn transform(&self, matrix: &Matrix4<f32>) -> Self {
        // Transform origin as a point (with w=1)
        let origin_homogeneous = matrix * self.origin.to_homogeneous();
        let new_origin = Point3::from_homogeneous(origin_homogeneous);

        // Transform direction as a vector (with w=0)
        let direction_vec4 = matrix * self.direction.extend(0.0);
        let new_direction = Vector3::new(direction_vec4.x, direction_vec4.y, direction_vec4.z);

        Self {
            origin: new_origin,
            direction: new_direction.normalize(),
        }
    }

    /// Tests if a ray intersects a triangle using the Möller-Trumbore algorithm.
    ///
    /// Returns Some((t, u, v)) if the ray hits the triangle, where:
    /// - t: distance along the ray
    /// - u, v: barycentric coordinates (w = 1 - u - v)
    ///
    /// Returns None if there's no intersection or if the intersection is behind the ray origin.
    pub fn intersect_triangle(
        &self,
        v0: Point3<f32>,
        v1: Point3<f32>,
        v2: Point3<f32>,
    ) -> Option<(f32, f32, f32)> {
        // Compute edges from v0
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        // Begin calculating determinant - also used to calculate u parameter
        let h = self.direction.cross(edge2);
        let det = edge1.dot(h);

        // If determinant is near zero, ray lies in plane of triangle or is parallel.
        // Intersection is double-sided, so only the magnitude matters.
        if det > -EPSILON && det < EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;

        // Calculate distance from v0 to ray origin
        let s = self.origin - v0;

        // Calculate u parameter and test bounds
        let u = inv_det * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        // Prepare to test v parameter
        let q = s.cross(edge1);

        // Calculate v parameter and test bounds
        let v = inv_det * self.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        // At this stage we can compute t to find out where the intersection point is on the line
        let t = inv_det * edge2.dot(q);

        // Ray intersection
        if t > EPSILON {
            Some((t, u, v))
        } else {
            // Line intersection but not a ray intersection (behind ray origin)
            None
        }
    }
}
