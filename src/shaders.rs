//! WGSL shader source for the forward pipeline.
//!
//! One shader serves every pipeline: lit or unlit is selected per material
//! via a flag bit, and linear fog is applied to everything using the clip
//! space W coordinate as the view depth.

pub(crate) const SHADER_SOURCE: &str = r#"
struct CameraUniform {
    view_proj: mat4x4<f32>,
};

struct SceneUniform {
    fog_color: vec4<f32>,
    // x = fog near, y = fog far
    fog_params: vec4<f32>,
};

struct Light {
    light_type: u32,
    range: f32,
    intensity: f32,
    position: vec3<f32>,
    direction: vec3<f32>,
    color: vec3<f32>,
};

struct Lights {
    count: u32,
    lights: array<Light, 8>,
};

struct MaterialUniform {
    base_color: vec4<f32>,
    // rgb = emissive color, a = emissive intensity
    emissive: vec4<f32>,
    flags: u32,
};

@group(0) @binding(0) var<uniform> camera: CameraUniform;
@group(0) @binding(1) var<uniform> scene: SceneUniform;
@group(1) @binding(0) var<uniform> lights: Lights;
@group(2) @binding(0) var<uniform> material: MaterialUniform;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) tex_coords: vec3<f32>,
    @location(2) normal: vec3<f32>,
};

struct InstanceInput {
    @location(3) transform_0: vec4<f32>,
    @location(4) transform_1: vec4<f32>,
    @location(5) transform_2: vec4<f32>,
    @location(6) transform_3: vec4<f32>,
    @location(7) normal_0: vec3<f32>,
    @location(8) normal_1: vec3<f32>,
    @location(9) normal_2: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) view_depth: f32,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.transform_0,
        instance.transform_1,
        instance.transform_2,
        instance.transform_3,
    );
    let normal_matrix = mat3x3<f32>(
        instance.normal_0,
        instance.normal_1,
        instance.normal_2,
    );

    let world_position = model * vec4<f32>(vertex.position, 1.0);
    let clip_position = camera.view_proj * world_position;

    var out: VertexOutput;
    out.clip_position = clip_position;
    out.world_position = world_position.xyz;
    out.world_normal = normal_matrix * vertex.normal;
    // For a perspective projection, clip W is the forward view distance
    out.view_depth = clip_position.w;
    return out;
}

const AMBIENT: f32 = 0.12;
const FLAG_UNLIT: u32 = 1u;

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let base = material.base_color;

    var color: vec3<f32>;
    if ((material.flags & FLAG_UNLIT) != 0u) {
        color = base.rgb;
    } else {
        let normal = normalize(in.world_normal);
        var lit = base.rgb * AMBIENT;

        for (var i = 0u; i < lights.count; i = i + 1u) {
            let light = lights.lights[i];

            if (light.light_type == 0u) {
                // Point light with linear range falloff
                let to_light = light.position - in.world_position;
                let dist = length(to_light);

                var attenuation = 1.0;
                if (light.range > 0.0) {
                    attenuation = clamp(1.0 - dist / light.range, 0.0, 1.0);
                }

                let n_dot_l = max(dot(normal, normalize(to_light)), 0.0);
                lit += base.rgb * light.color * light.intensity * n_dot_l * attenuation;
            } else {
                // Directional light
                let n_dot_l = max(dot(normal, normalize(-light.direction)), 0.0);
                lit += base.rgb * light.color * light.intensity * n_dot_l;
            }
        }

        color = lit;
    }

    color += material.emissive.rgb * material.emissive.a;

    // Linear fog toward the background color
    let fog_range = max(scene.fog_params.y - scene.fog_params.x, 0.001);
    let fog_t = clamp((in.view_depth - scene.fog_params.x) / fog_range, 0.0, 1.0);
    color = mix(color, scene.fog_color.rgb, fog_t);

    return vec4<f32>(color, base.a);
}
"#;

/// Creates the shader module for the forward pipelines.
pub(crate) fn create_shader_module(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Forward Shader"),
        source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
    })
}
