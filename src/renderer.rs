use cgmath::Vector3;
use wgpu::util::DeviceExt;

use crate::camera::Camera;
use crate::scene::{
    DrawBatch, InstanceRaw, LightsArrayUniform, MaterialGpuResources, PrimitiveType, Scene, Vertex,
    DEFAULT_MATERIAL_ID,
};
use crate::shaders;

/// Depth buffer format for all pipelines.
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Scene-wide shader parameters (fog).
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct SceneUniform {
    fog_color: [f32; 4],
    // x = fog near, y = fog far
    fog_params: [f32; 4],
}

/// Forward renderer over a wgpu surface.
///
/// Owns the device, surface configuration, depth buffer, global uniforms,
/// and the three pipelines (opaque triangles, blended triangles, blended
/// points). Each frame it uploads dirty CPU-side state and draws the scene's
/// batches, opaque first.
pub struct Renderer<'a> {
    pub surface: wgpu::Surface<'a>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    /// Current drawable size in physical pixels (width, height).
    pub size: (u32, u32),
    pub camera: Camera,
    /// Last observed cursor position, in physical pixels.
    pub cursor_position: Option<(f32, f32)>,

    depth_view: wgpu::TextureView,

    camera_buffer: wgpu::Buffer,
    scene_buffer: wgpu::Buffer,
    lights_buffer: wgpu::Buffer,
    global_bind_group: wgpu::BindGroup,
    lights_bind_group: wgpu::BindGroup,
    material_bind_group_layout: wgpu::BindGroupLayout,

    opaque_pipeline: wgpu::RenderPipeline,
    blend_pipeline: wgpu::RenderPipeline,
    point_pipeline: wgpu::RenderPipeline,
}

impl<'a> Renderer<'a> {
    /// Creates a renderer for the given surface target.
    ///
    /// Failure here (no adapter, no device) is fatal; there is nothing to
    /// render to and no recovery path.
    pub async fn new<T>(surface_target: T, width: u32, height: u32) -> Renderer<'a>
    where
        T: Into<wgpu::SurfaceTarget<'a>>,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(surface_target)
            .expect("Failed to create rendering surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to find a compatible GPU adapter");

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                experimental_features: Default::default(),
                trace: Default::default(),
            })
            .await
            .expect("Failed to create GPU device");

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        let depth_view = create_depth_view(&device, &config);

        let camera = Camera {
            eye: cgmath::point3(8.0, 6.0, 12.0),
            target: cgmath::point3(0.0, 5.0, 0.0),
            up: Vector3::unit_y(),
            aspect: config.width as f32 / config.height as f32,
            fovy: 75.0,
            znear: 0.1,
            zfar: 1000.0,
        };

        // Global uniforms: camera + scene parameters
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera.to_uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let scene_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Buffer"),
            size: std::mem::size_of::<SceneUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let global_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[
                    uniform_layout_entry(0),
                    uniform_layout_entry(1),
                ],
                label: Some("global_bind_group_layout"),
            });

        let global_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &global_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: scene_buffer.as_entire_binding(),
                },
            ],
            label: Some("global_bind_group"),
        });

        // Lights
        let lights_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Lights Buffer"),
            size: std::mem::size_of::<LightsArrayUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let lights_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[uniform_layout_entry(0)],
                label: Some("lights_bind_group_layout"),
            });

        let lights_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &lights_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: lights_buffer.as_entire_binding(),
            }],
            label: Some("lights_bind_group"),
        });

        // Materials
        let material_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[uniform_layout_entry(0)],
                label: Some("material_bind_group_layout"),
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Forward Pipeline Layout"),
            bind_group_layouts: &[
                &global_bind_group_layout,
                &lights_bind_group_layout,
                &material_bind_group_layout,
            ],
            push_constant_ranges: &[],
        });

        let shader = shaders::create_shader_module(&device);

        let opaque_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            config.format,
            wgpu::PrimitiveTopology::TriangleList,
            false,
        );
        let blend_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            config.format,
            wgpu::PrimitiveTopology::TriangleList,
            true,
        );
        let point_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            config.format,
            wgpu::PrimitiveTopology::PointList,
            true,
        );

        Self {
            surface,
            device,
            queue,
            config,
            size: (width, height),
            camera,
            cursor_position: None,
            depth_view,
            camera_buffer,
            scene_buffer,
            lights_buffer,
            global_bind_group,
            lights_bind_group,
            material_bind_group_layout,
            opaque_pipeline,
            blend_pipeline,
            point_pipeline,
        }
    }

    /// Resizes the drawable surface and updates the camera's aspect ratio.
    ///
    /// Safe to call at any point between frames; zero-sized updates (e.g.
    /// minimized windows) are ignored.
    pub fn resize(&mut self, new_size: (u32, u32)) {
        let (width, height) = new_size;
        if width > 0 && height > 0 {
            self.size = new_size;
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);

            self.depth_view = create_depth_view(&self.device, &self.config);
            self.camera.set_viewport(width, height);
        }
    }

    /// Uploads dirty CPU-side state (meshes, materials, uniforms) to the GPU.
    fn prepare_scene(&mut self, scene: &mut Scene) {
        for mesh in scene.meshes.values_mut() {
            if mesh.needs_gpu_upload() {
                mesh.ensure_gpu_resources(&self.device);
            }
        }

        for material in scene.materials.values_mut() {
            if material.gpu.is_none() {
                let buffer = self
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Material Buffer"),
                        contents: bytemuck::cast_slice(&[material.to_uniform()]),
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    });
                let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    layout: &self.material_bind_group_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    }],
                    label: Some("material_bind_group"),
                });
                material.gpu = Some(MaterialGpuResources { buffer, bind_group });
                material.mark_clean();
            } else if material.is_dirty() {
                let gpu = material.gpu.as_ref().unwrap();
                self.queue
                    .write_buffer(&gpu.buffer, 0, bytemuck::cast_slice(&[material.to_uniform()]));
                material.mark_clean();
            }
        }

        // Per-frame uniforms
        self.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera.to_uniform()]),
        );

        let env = scene.environment;
        let scene_uniform = SceneUniform {
            fog_color: [env.background.r, env.background.g, env.background.b, 1.0],
            fog_params: [env.fog_near, env.fog_far, 0.0, 0.0],
        };
        self.queue
            .write_buffer(&self.scene_buffer, 0, bytemuck::cast_slice(&[scene_uniform]));

        let lights_uniform = LightsArrayUniform::from_lights(&scene.lights);
        self.queue
            .write_buffer(&self.lights_buffer, 0, bytemuck::cast_slice(&[lights_uniform]));
    }

    /// Renders one frame of the scene.
    pub fn render(&mut self, scene: &mut Scene) -> anyhow::Result<()> {
        self.render_with_overlay(scene, |_, _, _, _| {})
    }

    /// Renders one frame of the scene, then invokes `overlay_fn` to record
    /// additional passes (e.g. the HUD) on top of the 3D content before the
    /// frame is submitted and presented.
    pub fn render_with_overlay<F>(&mut self, scene: &mut Scene, overlay_fn: F) -> anyhow::Result<()>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        self.prepare_scene(scene);
        let scene = &*scene;

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // Collect batches and split into opaque and blended passes
        let batches = scene.collect_draw_batches();
        let (blend_batches, opaque_batches): (Vec<&DrawBatch>, Vec<&DrawBatch>) =
            batches.iter().partition(|batch| {
                scene
                    .get_material(batch.material_id)
                    .map(|m| m.needs_blend())
                    .unwrap_or(false)
            });

        // One instance buffer per batch, kept alive for the whole pass
        let instance_buffers: Vec<(u32, wgpu::Buffer)> = opaque_batches
            .iter()
            .chain(blend_batches.iter())
            .map(|batch| {
                let raws: Vec<InstanceRaw> = batch
                    .instances
                    .iter()
                    .map(|inst| InstanceRaw::from_world_transform(&inst.world_transform))
                    .collect();
                let buffer = self
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Instance Buffer"),
                        contents: bytemuck::cast_slice(&raws),
                        usage: wgpu::BufferUsages::VERTEX,
                    });
                (raws.len() as u32, buffer)
            })
            .collect();

        {
            let background = scene.environment.background;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: background.r as f64,
                            g: background.g as f64,
                            b: background.b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, &self.global_bind_group, &[]);
            render_pass.set_bind_group(1, &self.lights_bind_group, &[]);

            // Opaque batches first, then blended ones on a read-only depth buffer
            for (i, batch) in opaque_batches
                .iter()
                .chain(blend_batches.iter())
                .enumerate()
            {
                let Some(mesh) = scene.get_mesh(batch.mesh_id) else {
                    continue;
                };
                let material = scene
                    .get_material(batch.material_id)
                    .or_else(|| scene.get_material(DEFAULT_MATERIAL_ID))
                    .expect("default material always exists");
                let Some(material_gpu) = material.gpu.as_ref() else {
                    continue;
                };

                let (pipeline, index_buffer, index_count) = match batch.primitive_type {
                    PrimitiveType::TriangleList => (
                        if material.needs_blend() {
                            &self.blend_pipeline
                        } else {
                            &self.opaque_pipeline
                        },
                        &mesh.gpu().triangle_index_buffer,
                        mesh.index_count(PrimitiveType::TriangleList),
                    ),
                    PrimitiveType::PointList => (
                        &self.point_pipeline,
                        &mesh.gpu().point_index_buffer,
                        mesh.index_count(PrimitiveType::PointList),
                    ),
                };

                if index_count == 0 {
                    continue;
                }

                let (instance_count, instance_buffer) = &instance_buffers[i];

                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(2, &material_gpu.bind_group, &[]);
                render_pass.set_vertex_buffer(0, mesh.gpu().vertex_buffer.slice(..));
                render_pass.set_vertex_buffer(1, instance_buffer.slice(..));
                render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(0..index_count, 0, 0..*instance_count);
            }
        }

        // Record the caller's overlay on top of the 3D content
        overlay_fn(&self.device, &self.queue, &mut encoder, &view);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

/// Creates the depth texture view matching the surface configuration.
fn create_depth_view(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });

    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Shared layout entry for a single uniform buffer binding.
fn uniform_layout_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Builds one of the forward pipelines.
///
/// Blended pipelines keep depth testing but disable depth writes so
/// transparent geometry does not occlude anything behind it.
fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    topology: wgpu::PrimitiveTopology,
    blend: bool,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Forward Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::desc(), InstanceRaw::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(if blend {
                    wgpu::BlendState::ALPHA_BLENDING
                } else {
                    wgpu::BlendState::REPLACE
                }),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: if topology == wgpu::PrimitiveTopology::PointList {
                None
            } else {
                Some(wgpu::Face::Back)
            },
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: !blend,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}
