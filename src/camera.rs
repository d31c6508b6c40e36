#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Converts a screen-space pixel coordinate to normalized device coordinates.
///
/// Screen space is [0, width] x [0, height] with Y down; NDC is [-1, 1]^2
/// with Y up: `(2x/W - 1, 1 - 2y/H)`.
pub fn ndc_from_screen(screen_x: f32, screen_y: f32, width: u32, height: u32) -> (f32, f32) {
    (
        (screen_x / width as f32) * 2.0 - 1.0,
        1.0 - (screen_y / height as f32) * 2.0,
    )
}

pub struct Camera {
    pub eye: cgmath::Point3<f32>,
    pub target: cgmath::Point3<f32>,
    pub up: cgmath::Vector3<f32>,
    pub aspect: f32,
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    pub fn build_view_projection_matrix(&self) -> cgmath::Matrix4<f32> {
        let view = cgmath::Matrix4::look_at_rh(self.eye, self.target, self.up);
        let proj = cgmath::perspective(cgmath::Deg(self.fovy), self.aspect, self.znear, self.zfar);

        OPENGL_TO_WGPU_MATRIX * proj * view
    }

    /// Returns the camera's forward vector
    pub fn forward(&self) -> cgmath::Vector3<f32> {
        use cgmath::InnerSpace;
        (self.target - self.eye).normalize()
    }

    /// Returns length of the camera's look vector
    /// (the distance from the camera eye to the target)
    pub fn length(&self) -> f32 {
        use cgmath::MetricSpace;
        self.eye.distance(self.target)
    }

    /// Updates the aspect ratio for a new viewport size.
    ///
    /// Zero-sized viewports are ignored so a minimized window never produces
    /// a degenerate projection.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn to_uniform(&self) -> CameraUniform {
        let mut ret = CameraUniform::new();
        ret.update_view_proj(self);
        ret
    }

    /// Projects a 3D world-space point to normalized device coordinates (NDC).
    ///
    /// X and Y of the result are in [-1, 1]; Z is in [0, 1] (WGPU depth convention).
    pub fn project_point_ndc(&self, world_point: cgmath::Point3<f32>) -> cgmath::Point3<f32> {
        let vp = self.build_view_projection_matrix();
        let homogeneous = vp * world_point.to_homogeneous();

        // Perform perspective division
        cgmath::Point3::from_homogeneous(homogeneous)
    }

    /// Unprojects a point from normalized device coordinates (NDC) to world space.
    ///
    /// Returns None if the view-projection matrix is not invertible.
    pub fn unproject_point_ndc(
        &self,
        ndc_point: cgmath::Point3<f32>,
    ) -> Option<cgmath::Point3<f32>> {
        use cgmath::SquareMatrix;

        let viewproj = self.build_view_projection_matrix();
        let inv_vp = viewproj.invert()?;

        let homogeneous = inv_vp * ndc_point.to_homogeneous();
        Some(cgmath::Point3::from_homogeneous(homogeneous))
    }

    /// Projects a 3D world-space point to screen-space pixel coordinates.
    ///
    /// X is in [0, screen_width] left to right, Y in [0, screen_height] top
    /// to bottom, Z is the depth value in [0, 1].
    pub fn project_point_screen(
        &self,
        world_point: cgmath::Point3<f32>,
        screen_width: u32,
        screen_height: u32,
    ) -> cgmath::Point3<f32> {
        let ndc = self.project_point_ndc(world_point);

        let screen_x = (ndc.x + 1.0) * 0.5 * screen_width as f32;
        let screen_y = (1.0 - ndc.y) * 0.5 * screen_height as f32; // Flip Y
        let screen_z = ndc.z;

        cgmath::Point3::new(screen_x, screen_y, screen_z)
    }

    /// Unprojects a screen-space pixel coordinate to a point in world space.
    ///
    /// `depth` is in [0, 1] (0 = near plane, 1 = far plane). Returns None if
    /// the view-projection matrix is not invertible.
    pub fn unproject_point_screen(
        &self,
        screen_x: f32,
        screen_y: f32,
        depth: f32,
        screen_width: u32,
        screen_height: u32,
    ) -> Option<cgmath::Point3<f32>> {
        let (ndc_x, ndc_y) = ndc_from_screen(screen_x, screen_y, screen_width, screen_height);
        let ndc_point = cgmath::Point3::new(ndc_x, ndc_y, depth);
        self.unproject_point_ndc(ndc_point)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_proj: cgmath::Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera) {
        self.view_proj = camera.build_view_projection_matrix().into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::EPSILON;
    use cgmath::{InnerSpace, Matrix4, Point3, SquareMatrix, Vector3};

    // Helper function to create a basic test camera
    fn create_test_camera() -> Camera {
        Camera {
            eye: Point3::new(0.0, 0.0, 5.0),
            target: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            aspect: 16.0 / 9.0,
            fovy: 45.0,
            znear: 0.1,
            zfar: 100.0,
        }
    }

    // ===== NDC Mapping Tests =====

    #[test]
    fn test_ndc_from_screen_center() {
        let (x, y) = ndc_from_screen(400.0, 300.0, 800, 600);
        assert!(x.abs() < EPSILON);
        assert!(y.abs() < EPSILON);
    }

    #[test]
    fn test_ndc_from_screen_corners() {
        // Top-left maps to (-1, 1); bottom-right to (1, -1)
        let (x, y) = ndc_from_screen(0.0, 0.0, 800, 600);
        assert!((x - -1.0).abs() < EPSILON);
        assert!((y - 1.0).abs() < EPSILON);

        let (x, y) = ndc_from_screen(800.0, 600.0, 800, 600);
        assert!((x - 1.0).abs() < EPSILON);
        assert!((y - -1.0).abs() < EPSILON);
    }

    #[test]
    fn test_ndc_from_screen_formula() {
        // Arbitrary point follows (2x/W - 1, 1 - 2y/H) exactly
        let (w, h) = (1024, 768);
        let (px, py) = (137.0_f32, 512.0_f32);
        let (x, y) = ndc_from_screen(px, py, w, h);
        assert!((x - (2.0 * px / w as f32 - 1.0)).abs() < EPSILON);
        assert!((y - (1.0 - 2.0 * py / h as f32)).abs() < EPSILON);
    }

    // ===== Camera Struct Tests =====

    #[test]
    fn test_camera_forward() {
        let camera = create_test_camera();
        let forward = camera.forward();

        // Eye at (0,0,5), target at (0,0,0): forward is (0,0,-1)
        assert!((forward.x - 0.0).abs() < EPSILON);
        assert!((forward.y - 0.0).abs() < EPSILON);
        assert!((forward.z - -1.0).abs() < EPSILON);

        let magnitude = forward.magnitude();
        assert!((magnitude - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_camera_length() {
        let camera = Camera {
            eye: Point3::new(3.0, 4.0, 0.0),
            target: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            aspect: 1.0,
            fovy: 45.0,
            znear: 0.1,
            zfar: 100.0,
        };

        // Distance from (3,4,0) to (0,0,0) is sqrt(9 + 16) = 5.0
        assert!((camera.length() - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_set_viewport_updates_aspect() {
        let mut camera = create_test_camera();

        camera.set_viewport(1920, 1080);
        assert!((camera.aspect - 1920.0 / 1080.0).abs() < EPSILON);

        camera.set_viewport(333, 777);
        assert!((camera.aspect - 333.0 / 777.0).abs() < EPSILON);
    }

    #[test]
    fn test_set_viewport_ignores_zero_size() {
        let mut camera = create_test_camera();
        let before = camera.aspect;

        camera.set_viewport(0, 600);
        camera.set_viewport(800, 0);
        assert_eq!(camera.aspect, before);
    }

    #[test]
    fn test_build_view_projection_valid() {
        let camera = create_test_camera();
        let vp = camera.build_view_projection_matrix();

        for i in 0..4 {
            for j in 0..4 {
                assert!(vp[i][j].is_finite());
            }
        }

        let det = vp.determinant();
        assert!(det.abs() > EPSILON);
    }

    #[test]
    fn test_build_view_projection_aspect_ratio() {
        let mut camera1 = create_test_camera();
        camera1.aspect = 16.0 / 9.0;

        let mut camera2 = create_test_camera();
        camera2.aspect = 4.0 / 3.0;

        let vp1 = camera1.build_view_projection_matrix();
        let vp2 = camera2.build_view_projection_matrix();

        // Different aspect ratios should produce different matrices
        let mut found_difference = false;
        for i in 0..4 {
            for j in 0..4 {
                if (vp1[i][j] - vp2[i][j]).abs() > EPSILON {
                    found_difference = true;
                    break;
                }
            }
        }
        assert!(found_difference, "Aspect ratio should affect the view-projection matrix");
    }

    // ===== Projection Round Trip =====

    #[test]
    fn test_project_unproject_round_trip() {
        let camera = create_test_camera();
        let world = Point3::new(0.5, -0.25, 1.0);

        let ndc = camera.project_point_ndc(world);
        let back = camera.unproject_point_ndc(ndc).unwrap();

        assert!((back.x - world.x).abs() < 0.001);
        assert!((back.y - world.y).abs() < 0.001);
        assert!((back.z - world.z).abs() < 0.001);
    }

    #[test]
    fn test_project_screen_center() {
        let camera = create_test_camera();

        // Target is dead center of the view
        let screen = camera.project_point_screen(camera.target, 800, 600);
        assert!((screen.x - 400.0).abs() < 0.1);
        assert!((screen.y - 300.0).abs() < 0.1);
    }

    // ===== CameraUniform Tests =====

    #[test]
    fn test_camera_uniform_new() {
        let uniform = CameraUniform::new();
        let identity = Matrix4::<f32>::identity();

        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(uniform.view_proj[i][j], identity[i][j]);
            }
        }
    }

    #[test]
    fn test_camera_uniform_update() {
        let camera = create_test_camera();
        let mut uniform = CameraUniform::new();

        uniform.update_view_proj(&camera);

        let expected_vp = camera.build_view_projection_matrix();
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(uniform.view_proj[i][j], expected_vp[i][j]);
            }
        }
    }

    #[test]
    fn test_camera_uniform_layout() {
        use std::mem;

        // 4x4 matrix of f32 for the GPU
        assert_eq!(mem::size_of::<CameraUniform>(), 64);
        assert_eq!(mem::align_of::<CameraUniform>(), 4);
    }
}
