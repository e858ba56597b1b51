//! Offscreen render targets

use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::material::{Texture, TextureRef};
use crate::render::Viewport;

static NEXT_TARGET_ID: AtomicU64 = AtomicU64::new(1);

/// Unique render target identifier, used as the framebuffer key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderTargetId(pub u64);

/// Framebuffer with a color texture and optional depth/stencil attachments
#[derive(Debug, Clone)]
pub struct RenderTarget {
    id: RenderTargetId,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Viewport used while the target is bound
    pub viewport: Viewport,
    /// Scissor rectangle used while the target is bound
    pub scissor: Viewport,
    /// Scissor test enabled while the target is bound
    pub scissor_test: bool,
    /// Depth attachment
    pub depth_buffer: bool,
    /// Stencil attachment
    pub stencil_buffer: bool,
    /// Color attachment
    pub texture: TextureRef,
}

impl RenderTarget {
    /// Color target with depth and stencil; the color texture builds mipmaps
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_texture(width, height, Texture::new("render target", width, height))
    }

    /// Shadow map target: depth only usage, no mipmaps
    pub fn depth(width: u32, height: u32) -> Self {
        let mut texture = Texture::new("shadow map", width, height);
        texture.generate_mipmaps = false;
        let mut target = Self::with_texture(width, height, texture);
        target.stencil_buffer = false;
        target
    }

    fn with_texture(width: u32, height: u32, texture: Texture) -> Self {
        let full = Viewport::new(0.0, 0.0, width as f32, height as f32);
        Self {
            id: RenderTargetId(NEXT_TARGET_ID.fetch_add(1, Ordering::Relaxed)),
            width,
            height,
            viewport: full,
            scissor: full,
            scissor_test: false,
            depth_buffer: true,
            stencil_buffer: true,
            texture: Rc::new(texture),
        }
    }

    /// Target identifier
    pub fn id(&self) -> RenderTargetId {
        self.id
    }

    /// The color texture wants a mip chain after rendering
    pub fn generates_mipmaps(&self) -> bool {
        self.texture.generate_mipmaps && self.width.is_power_of_two() && self.height.is_power_of_two()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_covers_target() {
        let target = RenderTarget::new(256, 128);
        assert_eq!(target.viewport, Viewport::new(0.0, 0.0, 256.0, 128.0));
        assert!(target.generates_mipmaps());
    }

    #[test]
    fn test_depth_target_skips_mipmaps() {
        let target = RenderTarget::depth(512, 512);
        assert!(!target.generates_mipmaps());
        assert!(target.depth_buffer);
    }

    #[test]
    fn test_npot_target_skips_mipmaps() {
        assert!(!RenderTarget::new(300, 200).generates_mipmaps());
    }
}
