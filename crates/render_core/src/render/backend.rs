//! GPU backend abstraction
//!
//! The renderer never talks to a graphics API directly. Everything it needs
//! from the GPU goes through [`GlBackend`], a GL-style immediate interface:
//! state toggles, program and buffer management, uniform uploads and draws.
//! The backend owns the actual GPU objects; the renderer refers to them by
//! the ids of the CPU-side resources (attributes, textures, render targets).

use bitflags::bitflags;

use crate::error::RenderError;
use crate::geometry::AttributeId;
use crate::material::{Blending, Side, Texture};
use crate::render::{Capabilities, ProgramDescriptor, RenderTarget, RenderTargetId};
use crate::uniforms::{UniformName, UniformValue};

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Location of a uniform inside a linked program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniformLocation(pub u32);

/// Handle to a linked program stored in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub u64);

bitflags! {
    /// Buffers affected by a clear
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        /// Color buffer
        const COLOR = 1;
        /// Depth buffer
        const DEPTH = 1 << 1;
        /// Stencil buffer
        const STENCIL = 1 << 2;
    }
}

impl ClearFlags {
    /// Flags from individual selections
    pub fn from_selection(color: bool, depth: bool, stencil: bool) -> Self {
        let mut flags = Self::empty();
        flags.set(Self::COLOR, color);
        flags.set(Self::DEPTH, depth);
        flags.set(Self::STENCIL, stencil);
        flags
    }
}

/// Primitive topology of a draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawMode {
    /// Points
    Points,
    /// Independent line segments
    Lines,
    /// Closed polyline
    LineLoop,
    /// Open polyline
    LineStrip,
    /// Independent triangles
    Triangles,
    /// Triangle strip
    TriangleStrip,
    /// Triangle fan
    TriangleFan,
}

/// Buffer binding point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex data
    Array,
    /// Index data
    ElementArray,
}

/// Rectangle in framebuffer pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    /// Left edge
    pub x: f32,
    /// Bottom edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Viewport {
    /// Create a viewport
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Every component multiplied by `ratio`
    pub fn scaled(self, ratio: f32) -> Self {
        Self::new(self.x * ratio, self.y * ratio, self.width * ratio, self.height * ratio)
    }
}

/// GL-style GPU interface used by the renderer
pub trait GlBackend {
    /// The context was lost and nothing can be drawn until it is restored
    fn is_context_lost(&self) -> bool;

    /// Limits and extensions reported by the GPU
    fn capabilities(&self) -> &Capabilities;

    /// Set the clear color
    fn set_clear_color(&mut self, rgba: [f32; 4]);

    /// Clear the selected buffers of the bound framebuffer
    fn clear(&mut self, flags: ClearFlags);

    /// Bind a render target's framebuffer, or the default framebuffer for `None`
    fn bind_framebuffer(&mut self, target: Option<RenderTargetId>);

    /// Set the viewport
    fn set_viewport(&mut self, viewport: Viewport);

    /// Set the scissor rectangle
    fn set_scissor(&mut self, scissor: Viewport);

    /// Enable or disable the scissor test
    fn set_scissor_test(&mut self, enabled: bool);

    /// Enable or disable depth testing
    fn set_depth_test(&mut self, enabled: bool);

    /// Enable or disable depth writes
    fn set_depth_mask(&mut self, enabled: bool);

    /// Enable or disable color writes
    fn set_color_mask(&mut self, enabled: bool);

    /// Configure blending
    fn set_blending(&mut self, blending: Blending, premultiplied_alpha: bool);

    /// Configure face culling from the rasterized side
    fn set_cull_face(&mut self, side: Side);

    /// Set the rasterized line width
    fn set_line_width(&mut self, width: f32);

    /// Link a program for the descriptor
    fn create_program(&mut self, descriptor: &ProgramDescriptor) -> BackendResult<ProgramHandle>;

    /// Release a program
    fn delete_program(&mut self, program: ProgramHandle);

    /// Make a program current
    fn use_program(&mut self, program: ProgramHandle);

    /// Location of a uniform in a program, `None` if the program does not use it
    fn uniform_location(&self, program: ProgramHandle, name: UniformName) -> Option<UniformLocation>;

    /// Upload a value to a location of the current program
    fn set_uniform(&mut self, location: UniformLocation, value: &UniformValue);

    /// Bind a texture to a texture unit; `None` unbinds
    fn bind_texture(&mut self, unit: u32, texture: Option<&Texture>);

    /// Create or replace the GPU buffer of an attribute
    fn upload_buffer(&mut self, buffer: AttributeId, target: BufferTarget, data: &[u8], dynamic: bool);

    /// Release the GPU buffer of an attribute
    fn delete_buffer(&mut self, buffer: AttributeId);

    /// Point a named vertex input of the current program at a buffer
    fn bind_vertex_attribute(&mut self, name: &str, buffer: AttributeId, item_size: usize, normalized: bool);

    /// Bind an index buffer for element draws
    fn bind_index_buffer(&mut self, buffer: AttributeId);

    /// Upload client-side vertex data into a named vertex input (immediate mode)
    fn upload_immediate_attribute(&mut self, name: &str, data: &[f32], item_size: usize);

    /// Draw `count` vertices starting at `start`
    fn draw_arrays(&mut self, mode: DrawMode, start: u32, count: u32);

    /// Draw `count` indices starting at `start` of the bound index buffer
    fn draw_elements(&mut self, mode: DrawMode, start: u32, count: u32);

    /// Instanced variant of [`GlBackend::draw_arrays`]
    fn draw_arrays_instanced(&mut self, mode: DrawMode, start: u32, count: u32, instances: u32);

    /// Instanced variant of [`GlBackend::draw_elements`]
    fn draw_elements_instanced(&mut self, mode: DrawMode, start: u32, count: u32, instances: u32);

    /// Allocate the framebuffer and attachments of a render target
    fn create_render_target(&mut self, target: &RenderTarget) -> BackendResult<()>;

    /// Free the framebuffer and attachments of a render target
    fn delete_render_target(&mut self, target: RenderTargetId);

    /// Rebuild the mip chain of a render target's color texture
    fn generate_mipmaps(&mut self, target: RenderTargetId);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_clear_flags_selection() {
        assert_eq!(ClearFlags::from_selection(true, false, true), ClearFlags::COLOR | ClearFlags::STENCIL);
        assert!(ClearFlags::from_selection(false, false, false).is_empty());
        assert_eq!(ClearFlags::from_selection(true, true, true), ClearFlags::all());
    }

    #[test]
    fn test_viewport_scaled() {
        let v = Viewport::new(1.0, 2.0, 100.0, 50.0).scaled(2.0);
        assert_relative_eq!(v.width, 200.0);
        assert_relative_eq!(v.y, 4.0);
    }
}
