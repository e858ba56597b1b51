//! GL state cache
//!
//! Remembers the last value sent for each piece of fixed-function state and
//! forwards a change to the backend only when the value differs. Every field
//! starts unknown, so the first request after a reset always reaches the GPU.

use crate::material::{Blending, Material, Side};
use crate::render::{GlBackend, Viewport};

/// Last known fixed-function state
#[derive(Debug, Clone, Default)]
pub struct GlState {
    depth_test: Option<bool>,
    depth_mask: Option<bool>,
    color_mask: Option<bool>,
    blending: Option<(Blending, bool)>,
    cull_face: Option<Side>,
    line_width: Option<f32>,
    viewport: Option<Viewport>,
    scissor: Option<Viewport>,
    scissor_test: Option<bool>,
}

impl GlState {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything, forcing the next requests through
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Depth test on or off
    pub fn set_depth_test(&mut self, backend: &mut dyn GlBackend, enabled: bool) {
        if self.depth_test != Some(enabled) {
            backend.set_depth_test(enabled);
            self.depth_test = Some(enabled);
        }
    }

    /// Depth writes on or off
    pub fn set_depth_mask(&mut self, backend: &mut dyn GlBackend, enabled: bool) {
        if self.depth_mask != Some(enabled) {
            backend.set_depth_mask(enabled);
            self.depth_mask = Some(enabled);
        }
    }

    /// Color writes on or off
    pub fn set_color_mask(&mut self, backend: &mut dyn GlBackend, enabled: bool) {
        if self.color_mask != Some(enabled) {
            backend.set_color_mask(enabled);
            self.color_mask = Some(enabled);
        }
    }

    /// Blend preset
    pub fn set_blending(&mut self, backend: &mut dyn GlBackend, blending: Blending, premultiplied_alpha: bool) {
        if self.blending != Some((blending, premultiplied_alpha)) {
            backend.set_blending(blending, premultiplied_alpha);
            self.blending = Some((blending, premultiplied_alpha));
        }
    }

    /// Face culling
    pub fn set_cull_face(&mut self, backend: &mut dyn GlBackend, side: Side) {
        if self.cull_face != Some(side) {
            backend.set_cull_face(side);
            self.cull_face = Some(side);
        }
    }

    /// Rasterized line width
    pub fn set_line_width(&mut self, backend: &mut dyn GlBackend, width: f32) {
        if self.line_width != Some(width) {
            backend.set_line_width(width);
            self.line_width = Some(width);
        }
    }

    /// Viewport rectangle
    pub fn set_viewport(&mut self, backend: &mut dyn GlBackend, viewport: Viewport) {
        if self.viewport != Some(viewport) {
            backend.set_viewport(viewport);
            self.viewport = Some(viewport);
        }
    }

    /// Scissor rectangle
    pub fn set_scissor(&mut self, backend: &mut dyn GlBackend, scissor: Viewport) {
        if self.scissor != Some(scissor) {
            backend.set_scissor(scissor);
            self.scissor = Some(scissor);
        }
    }

    /// Scissor test on or off
    pub fn set_scissor_test(&mut self, backend: &mut dyn GlBackend, enabled: bool) {
        if self.scissor_test != Some(enabled) {
            backend.set_scissor_test(enabled);
            self.scissor_test = Some(enabled);
        }
    }

    /// Apply the render state of a material
    pub fn set_material(&mut self, backend: &mut dyn GlBackend, material: &Material, premultiplied_alpha: bool) {
        self.set_cull_face(backend, material.side);
        let blending = if material.transparent { material.blending } else { Blending::None };
        self.set_blending(backend, blending, premultiplied_alpha);
        self.set_depth_test(backend, material.depth_test);
        self.set_depth_mask(backend, material.depth_write);
        self.set_color_mask(backend, material.color_write);
    }
}
