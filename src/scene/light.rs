use crate::common::RgbaColor;

/// Maximum number of lights supported in the scene.
pub const MAX_LIGHTS: usize = 8;

/// Light type identifiers for GPU shader discrimination.
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LightType {
    /// Point light (radiates in all directions from a position).
    Point = 0,
    /// Directional light (parallel rays, like sunlight).
    Directional = 1,
}

/// A light source in the scene.
#[derive(Debug, Clone)]
pub enum Light {
    /// Point light that radiates in all directions from a position.
    Point {
        position: cgmath::Vector3<f32>,
        color: RgbaColor,
        intensity: f32,
        /// Maximum range of the light. 0.0 means infinite range.
        range: f32,
    },
    /// Directional light with parallel rays (like sunlight).
    Directional {
        /// Direction the light is pointing (will be normalized).
        direction: cgmath::Vector3<f32>,
        color: RgbaColor,
        intensity: f32,
    },
}

impl Light {
    /// Creates a new point light with explicit intensity.
    pub fn point(position: cgmath::Vector3<f32>, color: RgbaColor, intensity: f32) -> Self {
        Self::Point {
            position,
            color,
            intensity,
            range: 0.0,
        }
    }

    /// Creates a new point light with explicit intensity and range.
    pub fn point_with_range(
        position: cgmath::Vector3<f32>,
        color: RgbaColor,
        intensity: f32,
        range: f32,
    ) -> Self {
        Self::Point {
            position,
            color,
            intensity,
            range,
        }
    }

    /// Creates a new directional light.
    pub fn directional(direction: cgmath::Vector3<f32>, color: RgbaColor, intensity: f32) -> Self {
        use cgmath::InnerSpace;
        Self::Directional {
            direction: direction.normalize(),
            color,
            intensity,
        }
    }

    /// Current intensity of the light.
    pub fn intensity(&self) -> f32 {
        match self {
            Self::Point { intensity, .. } => *intensity,
            Self::Directional { intensity, .. } => *intensity,
        }
    }

    /// Sets the light intensity.
    pub fn set_intensity(&mut self, value: f32) {
        match self {
            Self::Point { intensity, .. } => *intensity = value,
            Self::Directional { intensity, .. } => *intensity = value,
        }
    }

    /// Sets the range of a point light; has no effect on directional lights.
    pub fn set_range(&mut self, value: f32) {
        if let Self::Point { range, .. } = self {
            *range = value;
        }
    }

    /// Moves a point light; has no effect on directional lights.
    pub fn set_position(&mut self, value: cgmath::Vector3<f32>) {
        if let Self::Point { position, .. } = self {
            *position = value;
        }
    }

    /// Converts the light to a GPU-compatible uniform structure.
    pub fn to_uniform(&self) -> LightUniform {
        match self {
            Light::Point {
                position,
                color,
                intensity,
                range,
            } => LightUniform {
                light_type: LightType::Point as u32,
                range: *range,
                intensity: *intensity,
                _padding0: 0.0,
                position: (*position).into(),
                _padding1: 0.0,
                direction: [0.0, 0.0, 0.0],
                _padding2: 0.0,
                color: [color.r, color.g, color.b],
                _padding3: 0.0,
            },
            Light::Directional {
                direction,
                color,
                intensity,
            } => LightUniform {
                light_type: LightType::Directional as u32,
                range: 0.0,
                intensity: *intensity,
                _padding0: 0.0,
                position: [0.0, 0.0, 0.0],
                _padding1: 0.0,
                direction: (*direction).into(),
                _padding2: 0.0,
                color: [color.r, color.g, color.b],
                _padding3: 0.0,
            },
        }
    }
}

/// GPU-compatible representation of a single light for shader uniforms.
///
/// This struct is laid out to match WGSL uniform buffer alignment requirements.
/// vec3<f32> types require 16-byte alignment in WGSL, so scalar fields are
/// grouped at the start to pack efficiently.
///
/// # Memory Layout (64 bytes total)
///
/// | Offset | Size | Field      | Notes                             |
/// |--------|------|------------|-----------------------------------|
/// | 0      | 4    | light_type | 0=Point, 1=Directional            |
/// | 4      | 4    | range      | 0 = infinite range                |
/// | 8      | 4    | intensity  | Light intensity multiplier        |
/// | 12     | 4    | _padding0  | Alignment padding                 |
/// | 16     | 12   | position   | Point: world position             |
/// | 28     | 4    | _padding1  | Alignment padding                 |
/// | 32     | 12   | direction  | Directional: light direction      |
/// | 44     | 4    | _padding2  | Alignment padding                 |
/// | 48     | 12   | color      | RGB color                         |
/// | 60     | 4    | _padding3  | Alignment padding                 |
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    light_type: u32,
    range: f32,
    intensity: f32,
    _padding0: f32,
    position: [f32; 3],
    _padding1: f32,
    direction: [f32; 3],
    _padding2: f32,
    color: [f32; 3],
    _padding3: f32,
}

impl LightUniform {
    /// Creates a zeroed light uniform.
    fn zeroed() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

/// GPU-compatible array of lights with count.
///
/// # Memory Layout (528 bytes total)
///
/// | Offset | Size     | Field       |
/// |--------|----------|-------------|
/// | 0      | 4        | light_count |
/// | 4      | 12       | _padding    |
/// | 16     | 64 * 8   | lights      |
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsArrayUniform {
    pub light_count: u32,
    _padding: [u32; 3],
    pub lights: [LightUniform; MAX_LIGHTS],
}

impl LightsArrayUniform {
    /// Creates an empty lights array uniform.
    pub fn new() -> Self {
        Self {
            light_count: 0,
            _padding: [0; 3],
            lights: [LightUniform::zeroed(); MAX_LIGHTS],
        }
    }

    /// Creates a lights array uniform from a slice of lights.
    ///
    /// Only the first `MAX_LIGHTS` lights will be used.
    pub fn from_lights(lights: &[Light]) -> Self {
        let mut uniform = Self::new();
        uniform.light_count = lights.len().min(MAX_LIGHTS) as u32;
        for (i, light) in lights.iter().take(MAX_LIGHTS).enumerate() {
            uniform.lights[i] = light.to_uniform();
        }
        uniform
    }
}

impl Default for LightsArrayUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::EPSILON;
    use cgmath::Vector3;

    #[test]
    fn test_light_uniform_from_point_light() {
        let position = Vector3::new(1.0, 2.0, 3.0);
        let color = RgbaColor::new(0.5, 0.6, 0.7);
        let light = Light::point(position, color, 2.0);

        let uniform = light.to_uniform();

        assert!((uniform.position[0] - 1.0).abs() < EPSILON);
        assert!((uniform.position[1] - 2.0).abs() < EPSILON);
        assert!((uniform.position[2] - 3.0).abs() < EPSILON);
        assert_eq!(uniform.light_type, LightType::Point as u32);
        assert!((uniform.color[0] - 0.5).abs() < EPSILON);
        assert!((uniform.color[1] - 0.6).abs() < EPSILON);
        assert!((uniform.color[2] - 0.7).abs() < EPSILON);
        assert!((uniform.intensity - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_light_uniform_from_directional_light() {
        let direction = Vector3::new(0.0, -1.0, 0.0);
        let color = RgbaColor::new(1.0, 1.0, 0.9);
        let light = Light::directional(direction, color, 1.5);

        let uniform = light.to_uniform();

        assert_eq!(uniform.light_type, LightType::Directional as u32);
        assert!((uniform.direction[1] - (-1.0)).abs() < EPSILON);
        assert!((uniform.intensity - 1.5).abs() < EPSILON);
    }

    #[test]
    fn test_light_uniform_layout() {
        use std::mem;

        // LightUniform should be 64 bytes
        assert_eq!(mem::size_of::<LightUniform>(), 64);

        // LightsArrayUniform should be 16 + 64*8 = 528 bytes
        assert_eq!(mem::size_of::<LightsArrayUniform>(), 528);
    }

    #[test]
    fn test_lights_array_uniform_from_lights() {
        let lights = vec![
            Light::point(Vector3::new(1.0, 0.0, 0.0), RgbaColor::new(1.0, 0.0, 0.0), 1.0),
            Light::directional(Vector3::new(0.0, -1.0, 0.0), RgbaColor::WHITE, 1.0),
        ];

        let uniform = LightsArrayUniform::from_lights(&lights);

        assert_eq!(uniform.light_count, 2);
        assert_eq!(uniform.lights[0].light_type, LightType::Point as u32);
        assert_eq!(uniform.lights[1].light_type, LightType::Directional as u32);
    }

    #[test]
    fn test_set_intensity_and_range() {
        let mut light = Light::point_with_range(
            Vector3::new(0.0, 0.4, 0.0),
            RgbaColor::from_hex(0xffaa00),
            0.0,
            2.0,
        );

        light.set_intensity(1.5);
        light.set_range(3.0);

        assert!((light.intensity() - 1.5).abs() < EPSILON);
        let uniform = light.to_uniform();
        assert!((uniform.range - 3.0).abs() < EPSILON);
    }
}
