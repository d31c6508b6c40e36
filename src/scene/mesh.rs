use std::cell::Cell;

use cgmath::Point3;
use wgpu::util::{BufferInitDescriptor, DeviceExt};

use crate::common::{Aabb, Ray};

/// Unique identifier for a mesh in the scene.
pub type MeshId = u32;

/// Index type used for mesh index buffers (u16 supports up to 65,536 vertices per mesh).
pub type MeshIndex = u16;

/// Primitive types for mesh rendering
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    TriangleList,
    PointList,
}

/// A collection of indices representing a single primitive type in a mesh
#[derive(Debug, Clone)]
pub struct MeshPrimitive {
    pub primitive_type: PrimitiveType,
    pub indices: Vec<MeshIndex>,
}

/// Result of a ray-mesh intersection test in local mesh space.
#[derive(Debug, Clone)]
pub struct MeshHit {
    /// Distance along the ray to the hit point (in local space)
    pub distance: f32,
    /// Hit location in local mesh space
    pub hit_point: Point3<f32>,
    /// Index of the triangle that was hit (index into the mesh's index buffer / 3)
    pub triangle_index: usize,
    /// Barycentric coordinates of the hit point on the triangle (u, v, w) where w = 1 - u - v
    pub barycentric: (f32, f32, f32),
}

/// GPU-compatible vertex structure containing position, texture coordinates, and normal.
///
/// Laid out to match the vertex shader's expectations; 36 bytes per vertex.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Vertex position in local mesh space [x, y, z]
    pub position: [f32; 3],
    /// Texture coordinates [u, v, w] (w unused, reserved for 3D textures)
    pub tex_coords: [f32; 3],
    /// Vertex normal vector [x, y, z]
    pub normal: [f32; 3],
}

impl Vertex {
    /// Returns the vertex buffer layout descriptor for the rendering pipeline.
    pub(crate) fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3 * 2]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// GPU resources for a mesh (vertex and index buffers).
///
/// These are created lazily when the mesh is first needed for rendering.
pub(crate) struct MeshGpuResources {
    /// GPU vertex buffer
    pub vertex_buffer: wgpu::Buffer,
    /// GPU index buffer for triangle primitives
    pub triangle_index_buffer: wgpu::Buffer,
    /// GPU index buffer for point primitives
    pub point_index_buffer: wgpu::Buffer,
}

/// A mesh composed of vertices and primitives.
///
/// Meshes store CPU-side vertex data (positions, normals, texture coordinates)
/// and primitives (triangle lists, point lists). GPU buffers are created
/// lazily before rendering; intersection queries run against the CPU data.
pub struct Mesh {
    /// Unique identifier for this mesh (assigned by Scene)
    pub id: MeshId,
    /// CPU-side vertex data
    vertices: Vec<Vertex>,
    /// CPU-side primitive data (index lists grouped by type)
    primitives: Vec<MeshPrimitive>,
    /// GPU resources (created lazily)
    gpu: Option<MeshGpuResources>,
    /// True if vertex/primitive data changed since last GPU upload
    dirty: bool,
    /// Cached local-space axis-aligned bounding box
    cached_bounding: Cell<Option<Aabb>>,
}

impl Mesh {
    /// Creates a mesh from raw vertex and primitive data.
    pub fn from_raw(vertices: Vec<Vertex>, primitives: Vec<MeshPrimitive>) -> Self {
        Self {
            id: 0, // Assigned by Scene
            vertices,
            primitives,
            gpu: None,
            dirty: true,
            cached_bounding: Cell::new(None),
        }
    }

    // ========== Primitive geometry constructors ==========

    /// Creates a UV sphere mesh centered at the origin.
    ///
    /// # Arguments
    /// * `radius` - Radius of the sphere
    /// * `segments` - Number of longitudinal segments (minimum 3)
    /// * `rings` - Number of latitudinal rings (minimum 2)
    pub fn sphere(radius: f32, segments: u32, rings: u32) -> Self {
        use std::f32::consts::PI;

        let segments = segments.max(3);
        let rings = rings.max(2);

        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        // Generate vertices
        for ring in 0..=rings {
            let phi = PI * ring as f32 / rings as f32; // 0 to PI (top to bottom)
            let sin_phi = phi.sin();
            let cos_phi = phi.cos();
            let v = ring as f32 / rings as f32;

            for seg in 0..=segments {
                let theta = 2.0 * PI * seg as f32 / segments as f32; // 0 to 2PI
                let sin_theta = theta.sin();
                let cos_theta = theta.cos();
                let u = seg as f32 / segments as f32;

                let x = sin_phi * cos_theta;
                let y = cos_phi;
                let z = sin_phi * sin_theta;

                vertices.push(Vertex {
                    position: [x * radius, y * radius, z * radius],
                    tex_coords: [u, v, 0.0],
                    normal: [x, y, z],
                });
            }
        }

        // Generate indices
        let verts_per_ring = segments + 1;
        for ring in 0..rings {
            for seg in 0..segments {
                let current = ring * verts_per_ring + seg;
                let next = current + verts_per_ring;

                // Skip degenerate triangles at poles
                if ring != 0 {
                    indices.push(current as MeshIndex);
                    indices.push(next as MeshIndex);
                    indices.push((current + 1) as MeshIndex);
                }
                if ring != rings - 1 {
                    indices.push((current + 1) as MeshIndex);
                    indices.push(next as MeshIndex);
                    indices.push((next + 1) as MeshIndex);
                }
            }
        }

        Self::from_raw(
            vertices,
            vec![MeshPrimitive {
                primitive_type: PrimitiveType::TriangleList,
                indices,
            }],
        )
    }

    /// Creates a cylinder mesh centered at the origin, extending along the Y axis.
    ///
    /// # Arguments
    /// * `radius` - Radius of the cylinder
    /// * `height` - Height of the cylinder
    /// * `segments` - Number of segments around the circumference (minimum 3)
    /// * `capped` - Whether to include top and bottom cap faces
    pub fn cylinder(radius: f32, height: f32, segments: u32, capped: bool) -> Self {
        use std::f32::consts::PI;

        let segments = segments.max(3);
        let half_height = height / 2.0;

        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        // Side vertices (two rings)
        for i in 0..=segments {
            let theta = 2.0 * PI * i as f32 / segments as f32;
            let cos_theta = theta.cos();
            let sin_theta = theta.sin();
            let u = i as f32 / segments as f32;

            let x = radius * cos_theta;
            let z = radius * sin_theta;
            let normal = [cos_theta, 0.0, sin_theta];

            // Bottom vertex
            vertices.push(Vertex {
                position: [x, -half_height, z],
                tex_coords: [u, 1.0, 0.0],
                normal,
            });
            // Top vertex
            vertices.push(Vertex {
                position: [x, half_height, z],
                tex_coords: [u, 0.0, 0.0],
                normal,
            });
        }

        // Side indices
        for i in 0..segments {
            let base = i * 2;
            indices.extend_from_slice(&[
                base as MeshIndex,
                (base + 1) as MeshIndex,
                (base + 3) as MeshIndex,
                base as MeshIndex,
                (base + 3) as MeshIndex,
                (base + 2) as MeshIndex,
            ]);
        }

        // Caps
        if capped {
            // Top cap center
            let top_center_idx = vertices.len() as MeshIndex;
            vertices.push(Vertex {
                position: [0.0, half_height, 0.0],
                tex_coords: [0.5, 0.5, 0.0],
                normal: [0.0, 1.0, 0.0],
            });

            // Top cap ring
            for i in 0..=segments {
                let theta = 2.0 * PI * i as f32 / segments as f32;
                let cos_theta = theta.cos();
                let sin_theta = theta.sin();

                vertices.push(Vertex {
                    position: [radius * cos_theta, half_height, radius * sin_theta],
                    tex_coords: [(cos_theta + 1.0) / 2.0, (sin_theta + 1.0) / 2.0, 0.0],
                    normal: [0.0, 1.0, 0.0],
                });
            }

            // Top cap indices
            let top_ring_start = top_center_idx + 1;
            for i in 0..segments as MeshIndex {
                indices.extend_from_slice(&[
                    top_center_idx,
                    top_ring_start + i,
                    top_ring_start + i + 1,
                ]);
            }

            // Bottom cap center
            let bottom_center_idx = vertices.len() as MeshIndex;
            vertices.push(Vertex {
                position: [0.0, -half_height, 0.0],
                tex_coords: [0.5, 0.5, 0.0],
                normal: [0.0, -1.0, 0.0],
            });

            // Bottom cap ring
            for i in 0..=segments {
                let theta = 2.0 * PI * i as f32 / segments as f32;
                let cos_theta = theta.cos();
                let sin_theta = theta.sin();

                vertices.push(Vertex {
                    position: [radius * cos_theta, -half_height, radius * sin_theta],
                    tex_coords: [(cos_theta + 1.0) / 2.0, (1.0 - sin_theta) / 2.0, 0.0],
                    normal: [0.0, -1.0, 0.0],
                });
            }

            // Bottom cap indices (winding reversed)
            let bottom_ring_start = bottom_center_idx + 1;
            for i in 0..segments as MeshIndex {
                indices.extend_from_slice(&[
                    bottom_center_idx,
                    bottom_ring_start + i + 1,
                    bottom_ring_start + i,
                ]);
            }
        }

        Self::from_raw(
            vertices,
            vec![MeshPrimitive {
                primitive_type: PrimitiveType::TriangleList,
                indices,
            }],
        )
    }

    /// Creates a cone mesh centered at the origin, with the apex pointing up (+Y).
    ///
    /// # Arguments
    /// * `radius` - Radius of the base
    /// * `height` - Height of the cone
    /// * `segments` - Number of segments around the circumference (minimum 3)
    /// * `capped` - Whether to include the bottom cap face
    pub fn cone(radius: f32, height: f32, segments: u32, capped: bool) -> Self {
        use std::f32::consts::PI;

        let segments = segments.max(3);
        let half_height = height / 2.0;

        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        // Calculate the normal slope for the cone sides
        let slope = radius / height;
        let normal_y = slope / (1.0 + slope * slope).sqrt();
        let normal_xz = 1.0 / (1.0 + slope * slope).sqrt();

        // Apex vertex (duplicated for each segment for proper normals)
        let apex_y = half_height;

        // Side faces
        for i in 0..=segments {
            let theta = 2.0 * PI * i as f32 / segments as f32;
            let cos_theta = theta.cos();
            let sin_theta = theta.sin();

            let nx = normal_xz * cos_theta;
            let nz = normal_xz * sin_theta;

            // Base vertex
            vertices.push(Vertex {
                position: [radius * cos_theta, -half_height, radius * sin_theta],
                tex_coords: [i as f32 / segments as f32, 1.0, 0.0],
                normal: [nx, normal_y, nz],
            });

            // Apex vertex (with matching normal for this segment)
            vertices.push(Vertex {
                position: [0.0, apex_y, 0.0],
                tex_coords: [i as f32 / segments as f32, 0.0, 0.0],
                normal: [nx, normal_y, nz],
            });
        }

        // Side indices
        for i in 0..segments {
            let base = i * 2;
            indices.extend_from_slice(&[
                base as MeshIndex,
                (base + 1) as MeshIndex,
                (base + 2) as MeshIndex,
            ]);
        }

        // Bottom cap
        if capped {
            let cap_center_idx = vertices.len() as MeshIndex;
            vertices.push(Vertex {
                position: [0.0, -half_height, 0.0],
                tex_coords: [0.5, 0.5, 0.0],
                normal: [0.0, -1.0, 0.0],
            });

            // Cap ring
            for i in 0..=segments {
                let theta = 2.0 * PI * i as f32 / segments as f32;
                let cos_theta = theta.cos();
                let sin_theta = theta.sin();

                vertices.push(Vertex {
                    position: [radius * cos_theta, -half_height, radius * sin_theta],
                    tex_coords: [(cos_theta + 1.0) / 2.0, (1.0 - sin_theta) / 2.0, 0.0],
                    normal: [0.0, -1.0, 0.0],
                });
            }

            // Cap indices (winding reversed)
            let cap_ring_start = cap_center_idx + 1;
            for i in 0..segments as MeshIndex {
                indices.extend_from_slice(&[
                    cap_center_idx,
                    cap_ring_start + i + 1,
                    cap_ring_start + i,
                ]);
            }
        }

        Self::from_raw(
            vertices,
            vec![MeshPrimitive {
                primitive_type: PrimitiveType::TriangleList,
                indices,
            }],
        )
    }

    /// Creates a flat plane mesh in the XZ plane, centered at the origin.
    ///
    /// # Arguments
    /// * `width` - Size along the X axis
    /// * `depth` - Size along the Z axis
    /// * `width_segments` - Number of segments along the width (minimum 1)
    /// * `depth_segments` - Number of segments along the depth (minimum 1)
    pub fn plane(width: f32, depth: f32, width_segments: u32, depth_segments: u32) -> Self {
        let width_segments = width_segments.max(1);
        let depth_segments = depth_segments.max(1);

        let hw = width / 2.0;
        let hd = depth / 2.0;

        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for zi in 0..=depth_segments {
            let v = zi as f32 / depth_segments as f32;
            let z = -hd + v * depth;

            for xi in 0..=width_segments {
                let u = xi as f32 / width_segments as f32;
                let x = -hw + u * width;

                vertices.push(Vertex {
                    position: [x, 0.0, z],
                    tex_coords: [u, v, 0.0],
                    normal: [0.0, 1.0, 0.0],
                });
            }
        }

        let verts_per_row = width_segments + 1;
        for zi in 0..depth_segments {
            for xi in 0..width_segments {
                let current = zi * verts_per_row + xi;
                let next = current + verts_per_row;

                indices.extend_from_slice(&[
                    current as MeshIndex,
                    next as MeshIndex,
                    (current + 1) as MeshIndex,
                    (current + 1) as MeshIndex,
                    next as MeshIndex,
                    (next + 1) as MeshIndex,
                ]);
            }
        }

        Self::from_raw(
            vertices,
            vec![MeshPrimitive {
                primitive_type: PrimitiveType::TriangleList,
                indices,
            }],
        )
    }

    /// Creates a point-cloud mesh from the given local-space positions.
    ///
    /// Each position becomes one point primitive; normals point up and
    /// texture coordinates are unused.
    pub fn point_cloud(positions: &[Point3<f32>]) -> Self {
        let vertices: Vec<Vertex> = positions
            .iter()
            .map(|p| Vertex {
                position: [p.x, p.y, p.z],
                tex_coords: [0.0, 0.0, 0.0],
                normal: [0.0, 1.0, 0.0],
            })
            .collect();

        let indices = (0..vertices.len() as MeshIndex).collect();

        Self::from_raw(
            vertices,
            vec![MeshPrimitive {
                primitive_type: PrimitiveType::PointList,
                indices,
            }],
        )
    }

    // ========== GPU resource management ==========

    /// Check if GPU resources need to be created or updated.
    pub(crate) fn needs_gpu_upload(&self) -> bool {
        self.gpu.is_none() || self.dirty
    }

    /// Create or update GPU resources for this mesh.
    ///
    /// Called automatically by the renderer before drawing. After this call,
    /// `gpu()` can be used to access the GPU resources.
    pub(crate) fn ensure_gpu_resources(&mut self, device: &wgpu::Device) {
        if !self.needs_gpu_upload() {
            return;
        }

        let vertex_buffer = if self.vertices.is_empty() {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Mesh Vertex Buffer"),
                size: 0,
                usage: wgpu::BufferUsages::VERTEX,
                mapped_at_creation: false,
            })
        } else {
            device.create_buffer_init(&BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(&self.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            })
        };

        // Helper to create index buffer for a specific primitive type
        let create_index_buffer = |prim_type: PrimitiveType, label: &str| -> wgpu::Buffer {
            let indices: Vec<MeshIndex> = self
                .primitives
                .iter()
                .filter(|p| p.primitive_type == prim_type)
                .flat_map(|p| p.indices.iter().copied())
                .collect();

            if indices.is_empty() {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(label),
                    size: 0,
                    usage: wgpu::BufferUsages::INDEX,
                    mapped_at_creation: false,
                })
            } else {
                device.create_buffer_init(&BufferInitDescriptor {
                    label: Some(label),
                    contents: bytemuck::cast_slice(&indices),
                    usage: wgpu::BufferUsages::INDEX,
                })
            }
        };

        let triangle_index_buffer =
            create_index_buffer(PrimitiveType::TriangleList, "Triangle Index Buffer");
        let point_index_buffer = create_index_buffer(PrimitiveType::PointList, "Point Index Buffer");

        self.gpu = Some(MeshGpuResources {
            vertex_buffer,
            triangle_index_buffer,
            point_index_buffer,
        });
        self.dirty = false;
    }

    /// Get the GPU resources for this mesh.
    ///
    /// # Panics
    /// Panics if GPU resources haven't been initialized yet.
    /// Call `ensure_gpu_resources()` first.
    pub(crate) fn gpu(&self) -> &MeshGpuResources {
        self.gpu
            .as_ref()
            .expect("Mesh GPU resources not initialized. Call ensure_gpu_resources() first.")
    }

    // ========== Query methods ==========

    /// Returns a reference to the mesh's vertex data.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Returns a reference to the mesh's primitives.
    pub fn primitives(&self) -> &[MeshPrimitive] {
        &self.primitives
    }

    /// Returns true if this mesh has any primitives of the specified type.
    pub fn has_primitive_type(&self, primitive_type: PrimitiveType) -> bool {
        self.primitives
            .iter()
            .any(|p| p.primitive_type == primitive_type)
    }

    /// Extracts all triangle indices from the mesh.
    ///
    /// Collects indices from all triangle list primitives in the mesh into a
    /// single vector. Each group of 3 indices defines one triangle.
    pub fn triangle_indices(&self) -> Vec<MeshIndex> {
        self.primitives
            .iter()
            .filter(|p| p.primitive_type == PrimitiveType::TriangleList)
            .flat_map(|p| p.indices.iter().copied())
            .collect()
    }

    /// Get the count of indices for a primitive type.
    pub fn index_count(&self, primitive_type: PrimitiveType) -> u32 {
        self.primitives
            .iter()
            .filter(|p| p.primitive_type == primitive_type)
            .map(|p| p.indices.len())
            .sum::<usize>() as u32
    }

    /// Computes the local-space axis-aligned bounding box for a mesh.
    /// Returns None if the mesh has no vertices.
    pub fn bounding(&self) -> Option<Aabb> {
        let cached_bounding = self.cached_bounding.get();
        if cached_bounding.is_some() {
            return cached_bounding;
        }

        if self.vertices.is_empty() {
            return None;
        }

        let positions: Vec<Point3<f32>> = self
            .vertices
            .iter()
            .map(|v| Point3::new(v.position[0], v.position[1], v.position[2]))
            .collect();

        let bounding = Aabb::from_points(&positions);
        self.cached_bounding.set(bounding);
        bounding
    }

    // ========== Ray intersection ==========

    /// Tests a ray against all triangles in the mesh.
    ///
    /// The ray should be in local mesh space. Returns all intersections found,
    /// unsorted (caller can sort by distance if needed).
    pub fn intersect_ray(&self, ray: &Ray) -> Vec<MeshHit> {
        let mut hits = Vec::new();

        let triangle_indices = self.triangle_indices();

        for triangle_index in 0..(triangle_indices.len() / 3) {
            let i0 = triangle_indices[triangle_index * 3] as usize;
            let i1 = triangle_indices[triangle_index * 3 + 1] as usize;
            let i2 = triangle_indices[triangle_index * 3 + 2] as usize;

            let v0 = Point3::from(self.vertices[i0].position);
            let v1 = Point3::from(self.vertices[i1].position);
            let v2 = Point3::from(self.vertices[i2].position);

            if let Some((t, u, v)) = ray.intersect_triangle(v0, v1, v2) {
                let w = 1.0 - u - v;
                hits.push(MeshHit {
                    distance: t,
                    hit_point: ray.point_at(t),
                    triangle_index,
                    barycentric: (u, v, w),
                });
            }
        }

        hits
    }
}
