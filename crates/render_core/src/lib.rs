//! # Render Core
//!
//! A scene graph and frame-synchronous render pipeline for GL-style GPU
//! backends.
//!
//! ## Features
//!
//! - **Scene Graph**: slot-map arena of nodes with typed roles (meshes, lines,
//!   points, sprites, lights, immediate objects, lens flares)
//! - **Render Lists**: per-camera projection with layer masks, frustum culling
//!   and per-group material arrays
//! - **Sorted Dispatch**: front-to-back opaque, back-to-front transparent
//! - **Uniform Model**: typed uniform values with dirty tracking and a library
//!   of named uniform fragments
//! - **Shadow Maps**: directional, spot and point light depth passes
//! - **Backend Agnostic**: everything GPU-facing goes through [`render::GlBackend`]
//!
//! ## Quick Start
//!
//! ```rust
//! use render_core::prelude::*;
//!
//! fn main() -> Result<(), RenderError> {
//!     let mut scene = Scene::new();
//!     scene.add(Node::mesh(Geometry::cube(1.0), Material::basic(Color::WHITE)));
//!
//!     let mut camera = Camera::perspective(60.0, 16.0 / 9.0, 0.1, 100.0);
//!     camera.set_position(Vec3::new(0.0, 0.0, 5.0));
//!
//!     let mut renderer = Renderer::new(RecordingBackend::new(), RendererConfig::default());
//!     renderer.set_size(1280, 720);
//!     renderer.render(&mut scene, &mut camera, None, false)?;
//!     assert_eq!(renderer.info().render.calls, 1);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod uniforms;
pub mod material;
pub mod geometry;
pub mod scene;
pub mod render;

mod error;

pub use error::{RenderError, RenderResult, UniformError};

/// Common imports for renderer users
pub mod prelude {
    pub use crate::{
        RenderError, RenderResult,
        config::{Config, RendererConfig},
        foundation::math::{Color, Mat4, Vec3},
        geometry::{BufferAttribute, Geometry, SharedGeometry},
        material::{Material, SharedMaterial},
        render::{GlBackend, RecordingBackend, RenderTarget, Renderer},
        scene::{Camera, Fog, Light, Node, NodeId, Scene},
        uniforms::{UniformName, UniformSet, UniformValue},
    };
}
