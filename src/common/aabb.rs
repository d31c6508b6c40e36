use cgmath::{Matrix4, Point3};

use super::{ray::Ray, EPSILON};

/// An axis-aligned bounding box (AABB) in 3D space.
#[derive(Debug, Copy, Clone)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    /// Creates a new AABB from min and max points.
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    /// Creates an AABB that encompasses all the given points.
    /// Returns None if the points slice is empty.
    pub fn from_points(points: &[Point3<f32>]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let mut min = points[0];
        let mut max = points[0];

        for point in points.iter().skip(1) {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            min.z = min.z.min(point.z);

            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
            max.z = max.z.max(point.z);
        }

        Some(Self { min, max })
    }

    /// Returns the 8 corner points of the AABB.
    pub fn corners(&self) -> [Point3<f32>; 8] {
        [
            Point3::new(self.min.x, self.min.y, self.min.z),
            Point3::new(self.max.x, self.min.y, self.min.z),
            Point3::new(self.min.x, self.max.y, self.min.z),
            Point3::new(self.max.x, self.max.y, self.min.z),
            Point3::new(self.min.x, self.min.y, self.max.z),
            Point3::new(self.max.x, self.min.y, self.max.z),
            Point3::new(self.min.x, self.max.y, self.max.z),
            Point3::new(self.max.x, self.max.y, self.max.z),
        ]
    }

    /// Transforms the AABB by the given 4x4 transformation matrix.
    /// This handles rotation/scaling/shearing by transforming all 8 corners
    /// and computing a new axis-aligned bounding box.
    pub fn transform(&self, matrix: &Matrix4<f32>) -> Self {
        let corners = self.corners();

        let transformed_corners: Vec<Point3<f32>> = corners
            .iter()
            .map(|corner| {
                let homogeneous = matrix * corner.to_homogeneous();
                Point3::from_homogeneous(homogeneous)
            })
            .collect();

        // Unwrap is safe because we know we have 8 corners
        Self::from_points(&transformed_corners).unwrap()
    }

    /// Returns the smallest AABB containing both this box and the other.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min: Point3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    /// Tests if a ray intersects this AABB using the slab method.
    /// Returns the t parameter of the intersection point if it hits, None otherwise.
    /// If the ray originates inside the box, returns Some(0.0).
    pub fn intersects_ray(&self, ray: &Ray) -> Option<f32> {
        #[derive(Copy, Clone)]
        enum Axis {
            X,
            Y,
            Z,
        }

        let mut tmin = f32::NEG_INFINITY;
        let mut tmax = f32::INFINITY;

        // Test intersection with each pair of parallel planes
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            let (origin_component, dir_component, min_component, max_component) = match axis {
                Axis::X => (ray.origin.x, ray.direction.x, self.min.x, self.max.x),
                Axis::Y => (ray.origin.y, ray.direction.y, self.min.y, self.max.y),
                Axis::Z => (ray.origin.z, ray.direction.z, self.min.z, self.max.z),
            };

            if dir_component.abs() < EPSILON {
                // Ray is parallel to the slab
                if origin_component < min_component || origin_component > max_component {
                    return None;
                }
            } else {
                let inv_dir = 1.0 / dir_component;
                let mut t1 = (min_component - origin_component) * inv_dir;
                let mut t2 = (max_component - origin_component) * inv_dir;

                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                }

                tmin = tmin.max(t1);
                tmax = tmax.min(t2);

                if tmin > tmax {
                    return None;
                }
            }
        }

        // Box is entirely behind the ray origin
        if tmax < 0.0 {
            return None;
        }

        Some(tmin.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    fn unit_box() -> Aabb {
        Aabb::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_from_points() {
        let points = [
            Point3::new(1.0, 5.0, -2.0),
            Point3::new(-3.0, 0.0, 4.0),
            Point3::new(2.0, -1.0, 0.0),
        ];

        let aabb = Aabb::from_points(&points).unwrap();
        assert_eq!(aabb.min, Point3::new(-3.0, -1.0, -2.0));
        assert_eq!(aabb.max, Point3::new(2.0, 5.0, 4.0));
    }

    #[test]
    fn test_from_points_empty() {
        assert!(Aabb::from_points(&[]).is_none());
    }

    #[test]
    fn test_merge() {
        let a = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let b = Aabb::new(Point3::new(-1.0, 0.5, 0.0), Point3::new(0.5, 2.0, 3.0));

        let merged = a.merge(&b);
        assert_eq!(merged.min, Point3::new(-1.0, 0.0, 0.0));
        assert_eq!(merged.max, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_transform_translation() {
        let aabb = unit_box();
        let translated = aabb.transform(&Matrix4::from_translation(Vector3::new(5.0, 0.0, 0.0)));

        assert!((translated.min.x - 4.0).abs() < EPSILON);
        assert!((translated.max.x - 6.0).abs() < EPSILON);
        assert!((translated.min.y - -1.0).abs() < EPSILON);
    }

    #[test]
    fn test_ray_hits_box() {
        let aabb = unit_box();
        let ray = Ray::new(Point3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));

        let t = aabb.intersects_ray(&ray);
        assert!(t.is_some());
        assert!((t.unwrap() - 4.0).abs() < 0.001);
    }

    #[test]
    fn test_ray_misses_box() {
        let aabb = unit_box();
        let ray = Ray::new(Point3::new(5.0, 5.0, -5.0), Vector3::new(0.0, 0.0, 1.0));

        assert!(aabb.intersects_ray(&ray).is_none());
    }

    #[test]
    fn test_ray_behind_box() {
        let aabb = unit_box();
        let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, 1.0));

        assert!(aabb.intersects_ray(&ray).is_none());
    }

    #[test]
    fn test_ray_origin_inside_box() {
        let aabb = unit_box();
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 1.0));

        assert_eq!(aabb.intersects_ray(&ray), Some(0.0));
    }

    #[test]
    fn test_ray_parallel_to_slab_outside() {
        let aabb = unit_box();
        let ray = Ray::new(Point3::new(0.0, 2.0, -5.0), Vector3::new(0.0, 0.0, 1.0));

        assert!(aabb.intersects_ray(&ray).is_none());
    }
}
