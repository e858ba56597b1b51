//! Headless backend that records every call
//!
//! `RecordingBackend` stands in for a GPU in tests and tools: each trait call
//! is appended to a command log that can be inspected afterwards. Program
//! creation hands out sequential handles and every uniform resolves to a
//! location derived from its name.

use crate::geometry::AttributeId;
use crate::material::{Blending, Side, Texture, TextureId};
use crate::render::{
    BackendResult, BufferTarget, Capabilities, ClearFlags, DrawMode, GlBackend, ProgramDescriptor,
    ProgramHandle, RenderTarget, RenderTargetId, UniformLocation, Viewport,
};
use crate::uniforms::{UniformName, UniformValue};

/// One recorded backend call
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum GlCommand {
    ClearColor([f32; 4]),
    Clear(ClearFlags),
    BindFramebuffer(Option<RenderTargetId>),
    Viewport(Viewport),
    Scissor(Viewport),
    ScissorTest(bool),
    DepthTest(bool),
    DepthMask(bool),
    ColorMask(bool),
    Blending(Blending, bool),
    CullFace(Side),
    LineWidth(f32),
    CreateProgram(ProgramHandle, String),
    DeleteProgram(ProgramHandle),
    UseProgram(ProgramHandle),
    SetUniform(UniformLocation, UniformValue),
    BindTexture(u32, Option<TextureId>),
    UploadBuffer { buffer: AttributeId, target: BufferTarget, bytes: usize },
    DeleteBuffer(AttributeId),
    VertexAttribute { name: String, buffer: AttributeId },
    BindIndexBuffer(AttributeId),
    ImmediateAttribute { name: String, count: usize },
    DrawArrays { mode: DrawMode, start: u32, count: u32 },
    DrawElements { mode: DrawMode, start: u32, count: u32 },
    DrawArraysInstanced { mode: DrawMode, start: u32, count: u32, instances: u32 },
    DrawElementsInstanced { mode: DrawMode, start: u32, count: u32, instances: u32 },
    CreateRenderTarget(RenderTargetId),
    DeleteRenderTarget(RenderTargetId),
    GenerateMipmaps(RenderTargetId),
}

impl GlCommand {
    /// Whether the command is a draw call
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            Self::DrawArrays { .. }
                | Self::DrawElements { .. }
                | Self::DrawArraysInstanced { .. }
                | Self::DrawElementsInstanced { .. }
        )
    }
}

/// Backend that records calls instead of executing them
#[derive(Debug, Default)]
pub struct RecordingBackend {
    capabilities: Capabilities,
    context_lost: bool,
    next_program: u64,
    commands: Vec<GlCommand>,
}

impl RecordingBackend {
    /// Backend with default capabilities
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend reporting the given capabilities
    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            ..Self::default()
        }
    }

    /// Every command recorded so far
    pub fn commands(&self) -> &[GlCommand] {
        &self.commands
    }

    /// Take the log, leaving it empty
    pub fn take_commands(&mut self) -> Vec<GlCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Drop the log
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Recorded draw calls in order
    pub fn draw_calls(&self) -> Vec<&GlCommand> {
        self.commands.iter().filter(|c| c.is_draw()).collect()
    }

    /// Simulate losing the GPU context
    pub fn lose_context(&mut self) {
        self.context_lost = true;
    }

    /// Simulate the context coming back
    pub fn restore_context(&mut self) {
        self.context_lost = false;
    }

    fn record(&mut self, command: GlCommand) {
        log::trace!("gl: {:?}", command);
        self.commands.push(command);
    }
}

impl GlBackend for RecordingBackend {
    fn is_context_lost(&self) -> bool {
        self.context_lost
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn set_clear_color(&mut self, rgba: [f32; 4]) {
        self.record(GlCommand::ClearColor(rgba));
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.record(GlCommand::Clear(flags));
    }

    fn bind_framebuffer(&mut self, target: Option<RenderTargetId>) {
        self.record(GlCommand::BindFramebuffer(target));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.record(GlCommand::Viewport(viewport));
    }

    fn set_scissor(&mut self, scissor: Viewport) {
        self.record(GlCommand::Scissor(scissor));
    }

    fn set_scissor_test(&mut self, enabled: bool) {
        self.record(GlCommand::ScissorTest(enabled));
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.record(GlCommand::DepthTest(enabled));
    }

    fn set_depth_mask(&mut self, enabled: bool) {
        self.record(GlCommand::DepthMask(enabled));
    }

    fn set_color_mask(&mut self, enabled: bool) {
        self.record(GlCommand::ColorMask(enabled));
    }

    fn set_blending(&mut self, blending: Blending, premultiplied_alpha: bool) {
        self.record(GlCommand::Blending(blending, premultiplied_alpha));
    }

    fn set_cull_face(&mut self, side: Side) {
        self.record(GlCommand::CullFace(side));
    }

    fn set_line_width(&mut self, width: f32) {
        self.record(GlCommand::LineWidth(width));
    }

    fn create_program(&mut self, descriptor: &ProgramDescriptor) -> BackendResult<ProgramHandle> {
        self.next_program += 1;
        let handle = ProgramHandle(self.next_program);
        self.record(GlCommand::CreateProgram(handle, descriptor.name.clone()));
        Ok(handle)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.record(GlCommand::DeleteProgram(program));
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.record(GlCommand::UseProgram(program));
    }

    fn uniform_location(&self, _program: ProgramHandle, name: UniformName) -> Option<UniformLocation> {
        Some(UniformLocation(name as u32))
    }

    fn set_uniform(&mut self, location: UniformLocation, value: &UniformValue) {
        self.record(GlCommand::SetUniform(location, value.clone()));
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<&Texture>) {
        self.record(GlCommand::BindTexture(unit, texture.map(Texture::id)));
    }

    fn upload_buffer(&mut self, buffer: AttributeId, target: BufferTarget, data: &[u8], _dynamic: bool) {
        self.record(GlCommand::UploadBuffer { buffer, target, bytes: data.len() });
    }

    fn delete_buffer(&mut self, buffer: AttributeId) {
        self.record(GlCommand::DeleteBuffer(buffer));
    }

    fn bind_vertex_attribute(&mut self, name: &str, buffer: AttributeId, _item_size: usize, _normalized: bool) {
        self.record(GlCommand::VertexAttribute { name: name.to_owned(), buffer });
    }

    fn bind_index_buffer(&mut self, buffer: AttributeId) {
        self.record(GlCommand::BindIndexBuffer(buffer));
    }

    fn upload_immediate_attribute(&mut self, name: &str, data: &[f32], item_size: usize) {
        self.record(GlCommand::ImmediateAttribute {
            name: name.to_owned(),
            count: data.len() / item_size.max(1),
        });
    }

    fn draw_arrays(&mut self, mode: DrawMode, start: u32, count: u32) {
        self.record(GlCommand::DrawArrays { mode, start, count });
    }

    fn draw_elements(&mut self, mode: DrawMode, start: u32, count: u32) {
        self.record(GlCommand::DrawElements { mode, start, count });
    }

    fn draw_arrays_instanced(&mut self, mode: DrawMode, start: u32, count: u32, instances: u32) {
        self.record(GlCommand::DrawArraysInstanced { mode, start, count, instances });
    }

    fn draw_elements_instanced(&mut self, mode: DrawMode, start: u32, count: u32, instances: u32) {
        self.record(GlCommand::DrawElementsInstanced { mode, start, count, instances });
    }

    fn create_render_target(&mut self, target: &RenderTarget) -> BackendResult<()> {
        self.record(GlCommand::CreateRenderTarget(target.id()));
        Ok(())
    }

    fn delete_render_target(&mut self, target: RenderTargetId) {
        self.record(GlCommand::DeleteRenderTarget(target));
    }

    fn generate_mipmaps(&mut self, target: RenderTargetId) {
        self.record(GlCommand::GenerateMipmaps(target));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_are_recorded_in_order() {
        let mut backend = RecordingBackend::new();
        backend.clear(ClearFlags::COLOR);
        backend.draw_arrays(DrawMode::Points, 0, 4);
        assert_eq!(
            backend.commands(),
            &[
                GlCommand::Clear(ClearFlags::COLOR),
                GlCommand::DrawArrays { mode: DrawMode::Points, start: 0, count: 4 },
            ]
        );
        assert_eq!(backend.draw_calls().len(), 1);
    }

    #[test]
    fn test_context_loss_toggle() {
        let mut backend = RecordingBackend::new();
        assert!(!backend.is_context_lost());
        backend.lose_context();
        assert!(backend.is_context_lost());
        backend.restore_context();
        assert!(!backend.is_context_lost());
    }

    #[test]
    fn test_take_commands_empties_log() {
        let mut backend = RecordingBackend::new();
        backend.set_line_width(1.0);
        assert_eq!(backend.take_commands().len(), 1);
        assert!(backend.commands().is_empty());
    }
}
