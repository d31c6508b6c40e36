use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};

use crate::common::RgbaColor;

/// The ID of the default material created automatically by the Scene.
///
/// This material is always available with ID 0 and provides fallback
/// rendering (magenta) for instances with an unassigned material.
pub const DEFAULT_MATERIAL_ID: MaterialId = 0;

/// Unique identifier for materials.
pub type MaterialId = u32;

bitflags! {
    /// Material rendering flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MaterialFlags: u32 {
        /// No special flags
        const NONE = 0b0000;
        /// Skip lighting; output the base color directly
        const UNLIT = 0b0001;
        /// Render in the alpha-blended pass without depth writes
        const ALPHA_BLEND = 0b0010;
    }
}

/// Material parameters for the GPU uniform buffer.
///
/// # Memory Layout (48 bytes total)
///
/// | Offset | Size | Field      | Notes                                 |
/// |--------|------|------------|---------------------------------------|
/// | 0      | 16   | base_color | RGBA, alpha drives blending           |
/// | 16     | 16   | emissive   | RGB emissive color, W = intensity     |
/// | 32     | 4    | flags      | MaterialFlags bits                    |
/// | 36     | 12   | _padding   | Alignment padding                     |
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    pub emissive: [f32; 4],
    pub flags: u32,
    _padding: [u32; 3],
}

/// GPU resources for a material (uniform buffer and bind group).
pub(crate) struct MaterialGpuResources {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

/// A colored material that can be rendered lit or unlit, opaque or blended.
///
/// Materials hold a base color, an optional emissive term, and rendering
/// flags. Mutations set a dirty flag; the renderer re-uploads the uniform on
/// the next frame, so per-frame opacity animation stays cheap.
pub struct Material {
    /// Unique identifier for this material
    pub id: MaterialId,

    /// Base color factor; the alpha channel is the material opacity
    pub base_color_factor: RgbaColor,
    /// Emissive color added after lighting
    pub emissive_factor: RgbaColor,
    /// Emissive strength multiplier
    pub emissive_intensity: f32,
    /// Rendering flags
    pub flags: MaterialFlags,

    // GPU resources (created lazily)
    pub(crate) gpu: Option<MaterialGpuResources>,

    dirty: bool,
}

impl Material {
    /// Create a new material with default values.
    ///
    /// Defaults: white base color, no emissive, lit and opaque.
    pub fn new() -> Self {
        Self {
            id: 0, // Assigned by Scene
            base_color_factor: RgbaColor::WHITE,
            emissive_factor: RgbaColor::BLACK,
            emissive_intensity: 0.0,
            flags: MaterialFlags::NONE,
            gpu: None,
            dirty: true,
        }
    }

    // ========== Builder methods (chainable) ==========

    /// Set the base color factor.
    pub fn with_base_color_factor(mut self, color: RgbaColor) -> Self {
        self.base_color_factor = color;
        self.dirty = true;
        self
    }

    /// Set the emissive color and strength.
    pub fn with_emissive(mut self, color: RgbaColor, intensity: f32) -> Self {
        self.emissive_factor = color;
        self.emissive_intensity = intensity;
        self.dirty = true;
        self
    }

    /// Set the rendering flags.
    pub fn with_flags(mut self, flags: MaterialFlags) -> Self {
        self.flags = flags;
        self.dirty = true;
        self
    }

    // ========== Mutation methods (set dirty flag) ==========

    /// Set the base color factor, marking the material as dirty.
    pub fn set_base_color_factor(&mut self, color: RgbaColor) {
        self.base_color_factor = color;
        self.dirty = true;
    }

    /// Set only the opacity (alpha channel), marking the material as dirty.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.base_color_factor.a = opacity;
        self.dirty = true;
    }

    // ========== Queries ==========

    /// Current opacity (base color alpha).
    pub fn opacity(&self) -> f32 {
        self.base_color_factor.a
    }

    /// Whether this material renders in the alpha-blended pass.
    pub fn needs_blend(&self) -> bool {
        self.flags.contains(MaterialFlags::ALPHA_BLEND)
    }

    /// Builds the GPU uniform for the current material state.
    pub fn to_uniform(&self) -> MaterialUniform {
        MaterialUniform {
            base_color: [
                self.base_color_factor.r,
                self.base_color_factor.g,
                self.base_color_factor.b,
                self.base_color_factor.a,
            ],
            emissive: [
                self.emissive_factor.r,
                self.emissive_factor.g,
                self.emissive_factor.b,
                self.emissive_intensity,
            ],
            flags: self.flags.bits(),
            _padding: [0; 3],
        }
    }

    // ========== GPU resource management ==========

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::EPSILON;

    #[test]
    fn test_material_defaults() {
        let material = Material::new();

        assert_eq!(material.base_color_factor, RgbaColor::WHITE);
        assert_eq!(material.flags, MaterialFlags::NONE);
        assert!(!material.needs_blend());
        assert!(material.is_dirty());
    }

    #[test]
    fn test_builder_chaining() {
        let material = Material::new()
            .with_base_color_factor(RgbaColor::from_hex(0xff6600).with_alpha(0.0))
            .with_emissive(RgbaColor::from_hex(0xffd700), 0.5)
            .with_flags(MaterialFlags::UNLIT | MaterialFlags::ALPHA_BLEND);

        assert!((material.opacity() - 0.0).abs() < EPSILON);
        assert!((material.emissive_intensity - 0.5).abs() < EPSILON);
        assert!(material.needs_blend());
        assert!(material.flags.contains(MaterialFlags::UNLIT));
    }

    #[test]
    fn test_set_opacity_marks_dirty() {
        let mut material = Material::new();
        material.mark_clean();
        assert!(!material.is_dirty());

        material.set_opacity(0.5);
        assert!(material.is_dirty());
        assert!((material.opacity() - 0.5).abs() < EPSILON);

        // Only the alpha channel changed
        assert!((material.base_color_factor.r - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_set_base_color_marks_dirty() {
        let mut material = Material::new();
        material.mark_clean();

        material.set_base_color_factor(RgbaColor::from_hex(0xff6600));
        assert!(material.is_dirty());
    }

    #[test]
    fn test_uniform_layout() {
        use std::mem;
        assert_eq!(mem::size_of::<MaterialUniform>(), 48);
    }

    #[test]
    fn test_uniform_contents() {
        let material = Material::new()
            .with_base_color_factor(RgbaColor::new(0.1, 0.2, 0.3).with_alpha(0.4))
            .with_emissive(RgbaColor::new(1.0, 0.5, 0.0), 2.0)
            .with_flags(MaterialFlags::UNLIT);

        let uniform = material.to_uniform();
        assert_eq!(uniform.base_color, [0.1, 0.2, 0.3, 0.4]);
        assert_eq!(uniform.emissive, [1.0, 0.5, 0.0, 2.0]);
        assert_eq!(uniform.flags, MaterialFlags::UNLIT.bits());
    }
}
