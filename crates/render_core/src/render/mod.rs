//! Render pipeline
//!
//! Everything between a scene and the GPU backend:
//! - Projection of the scene into per-camera render lists
//! - Sorting and dispatch of draw records
//! - Program binding, uniform upload and draw range resolution
//! - Shadow maps, light aggregation and clipping
//! - The frame controller tying it together

mod backend;
mod capabilities;
mod clipping;
mod direct;
mod info;
mod lights;
pub mod morph;
mod objects;
mod program;
mod projector;
mod recording;
mod render_list;
mod renderer;
mod shadow_map;
mod state;
mod target;
mod textures;

pub use backend::{
    BackendResult, BufferTarget, ClearFlags, DrawMode, GlBackend, ProgramHandle, UniformLocation, Viewport,
};
pub use capabilities::{Capabilities, Extension, Precision};
pub use clipping::Clipping;
pub use direct::{compute_draw_range, DirectRenderer, FrameContext, ResolvedRange};
pub use info::{MemoryStats, RenderInfo, RenderStats};
pub use lights::{LightState, LightsHash};
pub use objects::GeometryRegistry;
pub use program::{MaterialProperties, ProgramCache, ProgramDescriptor};
pub use projector::project_scene;
pub use recording::{GlCommand, RecordingBackend};
pub use render_list::{opaque_order, transparent_order, DrawRecord, RenderList, RenderLists};
pub use renderer::{ExtensionFrame, ExtensionPass, Renderer};
pub use shadow_map::ShadowMap;
pub use state::GlState;
pub use target::{RenderTarget, RenderTargetId};
pub use textures::TextureUnits;
