//! Damped orbit camera rig.
//!
//! Drag and wheel input adjust *desired* spherical coordinates around a fixed
//! target; every render tick the current coordinates ease toward the desired
//! ones, giving the camera its smoothed glide.

use cgmath::{MetricSpace, Point3};

use crate::camera::Camera;

/// Minimum camera distance from the target.
pub const MIN_RADIUS: f32 = 8.0;

/// Maximum camera distance from the target.
pub const MAX_RADIUS: f32 = 30.0;

/// Fraction of the remaining distance covered per tick.
pub const DAMPING_FACTOR: f32 = 0.05;

/// Distance units per wheel unit.
const ZOOM_SENSITIVITY: f32 = 0.5;

// Keeps the camera above the ground plane and away from the pole.
const MIN_ELEVATION: f32 = std::f32::consts::FRAC_PI_2 - std::f32::consts::PI / 2.2;
const MAX_ELEVATION: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Orbit state: current spherical coordinates plus the damped-approach targets.
pub struct OrbitRig {
    /// Point the camera orbits and looks at.
    target: Point3<f32>,

    // Current coordinates (what the camera shows this frame)
    azimuth: f32,
    elevation: f32,
    radius: f32,

    // Desired coordinates (where input wants the camera)
    desired_azimuth: f32,
    desired_elevation: f32,
    desired_radius: f32,
}

impl OrbitRig {
    /// Initializes the rig from the camera's current placement.
    pub fn from_camera(camera: &Camera) -> Self {
        let direction = camera.eye - camera.target;

        let radius = camera.eye.distance(camera.target);
        let azimuth = direction.x.atan2(direction.z);
        let horizontal = (direction.x * direction.x + direction.z * direction.z).sqrt();
        let elevation = direction.y.atan2(horizontal);

        Self {
            target: camera.target,
            azimuth,
            elevation,
            radius,
            desired_azimuth: azimuth,
            desired_elevation: elevation,
            desired_radius: radius,
        }
    }

    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Applies a drag delta (in radians) to the desired orbit angles.
    pub fn rotate(&mut self, d_azimuth: f32, d_elevation: f32) {
        self.desired_azimuth -= d_azimuth;
        self.desired_elevation =
            (self.desired_elevation + d_elevation).clamp(MIN_ELEVATION, MAX_ELEVATION);
    }

    /// Applies a wheel delta to the desired distance.
    /// Positive delta = zoom in (decrease radius).
    pub fn zoom(&mut self, delta: f32) {
        self.desired_radius =
            (self.desired_radius - delta * ZOOM_SENSITIVITY).clamp(MIN_RADIUS, MAX_RADIUS);
    }

    /// Integrates one damping step and repositions the camera.
    ///
    /// Each tick moves the current coordinates a fixed fraction of the way
    /// toward the desired ones, then places the camera on the orbit sphere
    /// looking at the target.
    pub fn update(&mut self, camera: &mut Camera) {
        self.azimuth += (self.desired_azimuth - self.azimuth) * DAMPING_FACTOR;
        self.elevation += (self.desired_elevation - self.elevation) * DAMPING_FACTOR;
        self.radius += (self.desired_radius - self.radius) * DAMPING_FACTOR;

        self.apply(camera);
    }

    /// Places the camera from the current spherical coordinates.
    fn apply(&self, camera: &mut Camera) {
        let x = self.target.x + self.radius * self.elevation.cos() * self.azimuth.sin();
        let y = self.target.y + self.radius * self.elevation.sin();
        let z = self.target.z + self.radius * self.elevation.cos() * self.azimuth.cos();

        camera.eye = cgmath::point3(x, y, z);
        camera.target = self.target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    fn scene_camera() -> Camera {
        Camera {
            eye: cgmath::point3(8.0, 6.0, 12.0),
            target: cgmath::point3(0.0, 5.0, 0.0),
            up: Vector3::unit_y(),
            aspect: 16.0 / 9.0,
            fovy: 75.0,
            znear: 0.1,
            zfar: 1000.0,
        }
    }

    #[test]
    fn test_from_camera_round_trips() {
        let mut camera = scene_camera();
        let original_eye = camera.eye;

        let rig = OrbitRig::from_camera(&camera);
        rig.apply(&mut camera);

        // Reconstructing the eye from spherical coordinates is lossless
        assert!((camera.eye.x - original_eye.x).abs() < 1e-4);
        assert!((camera.eye.y - original_eye.y).abs() < 1e-4);
        assert!((camera.eye.z - original_eye.z).abs() < 1e-4);
    }

    #[test]
    fn test_update_without_input_is_stable() {
        let mut camera = scene_camera();
        let mut rig = OrbitRig::from_camera(&camera);
        let eye_before = camera.eye;

        for _ in 0..100 {
            rig.update(&mut camera);
        }

        assert!((camera.eye.x - eye_before.x).abs() < 1e-3);
        assert!((camera.eye.y - eye_before.y).abs() < 1e-3);
        assert!((camera.eye.z - eye_before.z).abs() < 1e-3);
    }

    #[test]
    fn test_rotate_converges_with_damping() {
        let mut camera = scene_camera();
        let mut rig = OrbitRig::from_camera(&camera);
        let radius_before = rig.radius();

        rig.rotate(1.0, 0.0);

        // One step covers only a fraction of the turn
        rig.update(&mut camera);
        let after_one = camera.eye;

        // Many steps settle at the rotated position
        for _ in 0..400 {
            rig.update(&mut camera);
        }
        let settled = camera.eye;

        let one_step = (after_one.x - settled.x).abs() + (after_one.z - settled.z).abs();
        assert!(one_step > 0.01, "damping should spread the turn over ticks");

        // Radius unchanged by a pure rotation
        assert!((rig.radius() - radius_before).abs() < 1e-3);

        // Target stays fixed
        assert_eq!(rig.target(), cgmath::point3(0.0, 5.0, 0.0));
    }

    #[test]
    fn test_zoom_clamps_radius() {
        let mut camera = scene_camera();
        let mut rig = OrbitRig::from_camera(&camera);

        // Zoom far out
        for _ in 0..500 {
            rig.zoom(-10.0);
        }
        for _ in 0..500 {
            rig.update(&mut camera);
        }
        assert!(rig.radius() <= MAX_RADIUS + 1e-2);

        // Zoom far in
        for _ in 0..500 {
            rig.zoom(10.0);
        }
        for _ in 0..500 {
            rig.update(&mut camera);
        }
        assert!(rig.radius() >= MIN_RADIUS - 1e-2);
    }

    #[test]
    fn test_elevation_clamped_above_ground() {
        let mut camera = scene_camera();
        let mut rig = OrbitRig::from_camera(&camera);

        // Try to drag the camera far below the horizon
        rig.rotate(0.0, -100.0);
        for _ in 0..500 {
            rig.update(&mut camera);
        }

        // Camera stays above the target plane minus the clamp margin
        assert!(camera.eye.y > rig.target().y);
    }
}
