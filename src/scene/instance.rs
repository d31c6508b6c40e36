use cgmath::{Matrix, Matrix3, Matrix4, SquareMatrix};

use super::material::MaterialId;
use super::mesh::MeshId;

/// Unique identifier for a mesh instance
pub type InstanceId = u32;

/// An instance references a mesh and material to be rendered.
#[derive(Clone)]
pub struct Instance {
    pub id: InstanceId,
    pub mesh: MeshId,
    pub material: MaterialId,
}

impl Instance {
    /// Creates a new instance referencing the given mesh and material.
    pub fn new(id: InstanceId, mesh: MeshId, material: MaterialId) -> Self {
        Self { id, mesh, material }
    }
}

/// Per-instance data uploaded to the GPU: world transform plus the normal
/// matrix (inverse-transpose of the upper 3x3, for correct lighting under
/// non-uniform scale).
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct InstanceRaw {
    transform: [[f32; 4]; 4],
    normal_mat: [[f32; 3]; 3],
}

impl InstanceRaw {
    /// Builds the raw instance data from a world transform.
    pub fn from_world_transform(world: &Matrix4<f32>) -> Self {
        let linear = Matrix3::from_cols(
            world.x.truncate(),
            world.y.truncate(),
            world.z.truncate(),
        );
        let normal_mat = linear
            .invert()
            .map(|inv| inv.transpose())
            .unwrap_or_else(Matrix3::identity);

        Self {
            transform: (*world).into(),
            normal_mat: normal_mat.into(),
        }
    }

    /// Returns the instance buffer layout descriptor for the rendering pipeline.
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem::size_of;

        wgpu::VertexBufferLayout {
            array_stride: size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: size_of::<[f32; 4 * 2]>() as wgpu::BufferAddress,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: size_of::<[f32; 4 * 3]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: size_of::<[f32; 4 * 4]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: size_of::<[f32; (4 * 4) + 3]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: size_of::<[f32; (4 * 4) + (3 * 2)]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    #[test]
    fn test_instance_new() {
        let instance = Instance::new(42, 10, 5);

        assert_eq!(instance.id, 42);
        assert_eq!(instance.mesh, 10);
        assert_eq!(instance.material, 5);
    }

    #[test]
    fn test_instance_raw_identity() {
        let raw = InstanceRaw::from_world_transform(&Matrix4::identity());

        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_eq!(raw.transform[i][j], expected);
                assert_eq!(raw.normal_mat[i][j], expected);
            }
        }
    }

    #[test]
    fn test_instance_raw_nonuniform_scale_normal_matrix() {
        // Scale (2, 1, 1): normal matrix x-axis shrinks by 1/2
        let world = Matrix4::from_nonuniform_scale(2.0, 1.0, 1.0);
        let raw = InstanceRaw::from_world_transform(&world);

        assert!((raw.normal_mat[0][0] - 0.5).abs() < 1e-5);
        assert!((raw.normal_mat[1][1] - 1.0).abs() < 1e-5);
        assert!((raw.normal_mat[2][2] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_instance_raw_translation_kept_in_transform() {
        let world = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0));
        let raw = InstanceRaw::from_world_transform(&world);

        assert_eq!(raw.transform[3][0], 1.0);
        assert_eq!(raw.transform[3][1], 2.0);
        assert_eq!(raw.transform[3][2], 3.0);
    }
}
