//! GPU capabilities and extensions
//!
//! Probing is the backend's job; the renderer only reads the results.

use std::collections::HashSet;

/// Optional GPU features the renderer can take advantage of
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extension {
    ArbDepthTexture,
    OesTextureFloat,
    OesTextureFloatLinear,
    OesTextureHalfFloat,
    OesTextureHalfFloatLinear,
    OesStandardDerivatives,
    OesElementIndexUint,
    AngleInstancedArrays,
}

/// Shader float precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Precision {
    /// lowp
    Low,
    /// mediump
    Medium,
    /// highp
    #[default]
    High,
}

/// Limits reported by the GPU
#[derive(Debug, Clone, PartialEq)]
pub struct Capabilities {
    /// Fragment texture units
    pub max_textures: u32,
    /// Vertex texture units
    pub max_vertex_textures: u32,
    /// Largest 2D texture dimension
    pub max_texture_size: u32,
    /// Largest cube map dimension
    pub max_cubemap_size: u32,
    /// Vertex attribute slots
    pub max_attributes: u32,
    /// Vertex uniform vectors
    pub max_vertex_uniforms: u32,
    /// Varying vectors
    pub max_varyings: u32,
    /// Fragment uniform vectors
    pub max_fragment_uniforms: u32,
    /// Shader precision in use
    pub precision: Precision,
    /// Logarithmic depth buffer requested
    pub logarithmic_depth_buffer: bool,
    /// Supported extensions
    pub extensions: HashSet<Extension>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            max_textures: 16,
            max_vertex_textures: 16,
            max_texture_size: 4096,
            max_cubemap_size: 4096,
            max_attributes: 16,
            max_vertex_uniforms: 1024,
            max_varyings: 15,
            max_fragment_uniforms: 1024,
            precision: Precision::High,
            logarithmic_depth_buffer: false,
            extensions: [
                Extension::ArbDepthTexture,
                Extension::OesTextureFloat,
                Extension::OesStandardDerivatives,
                Extension::OesElementIndexUint,
                Extension::AngleInstancedArrays,
            ]
            .into_iter()
            .collect(),
        }
    }
}

impl Capabilities {
    /// Whether the GPU supports `extension`
    pub fn has(&self, extension: Extension) -> bool {
        self.extensions.contains(&extension)
    }

    /// Vertex shaders can sample textures
    pub fn vertex_textures(&self) -> bool {
        self.max_vertex_textures > 0
    }

    /// Float textures can be sampled in vertex shaders
    pub fn float_vertex_textures(&self) -> bool {
        self.vertex_textures() && self.has(Extension::OesTextureFloat)
    }

    /// Bone count a skinning program can take through uniforms
    pub fn max_bones(&self) -> u32 {
        // 4 vectors per matrix; 20 vectors kept back for other uniforms
        (self.max_vertex_uniforms.saturating_sub(20) / 4).min(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capabilities() {
        let caps = Capabilities::default();
        assert_eq!(caps.max_textures, 16);
        assert!(caps.has(Extension::AngleInstancedArrays));
        assert!(!caps.has(Extension::OesTextureHalfFloat));
        assert!(caps.float_vertex_textures());
    }

    #[test]
    fn test_max_bones() {
        let caps = Capabilities { max_vertex_uniforms: 260, ..Capabilities::default() };
        assert_eq!(caps.max_bones(), 60);
    }
}
