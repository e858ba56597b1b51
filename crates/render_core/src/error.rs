//! Error types for the render pipeline

use thiserror::Error;

use crate::config::ConfigError;
use crate::scene::NodeId;
use crate::uniforms::UniformName;

/// Result type for render operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors raised while building or dispatching a frame
#[derive(Error, Debug)]
pub enum RenderError {
    /// More texture units were requested than the GPU reports.
    ///
    /// Fatal for the current frame: the caller decides whether to render again.
    #[error("Texture units exceeded: requested unit {requested}, GPU supports {max}")]
    TextureUnitsExceeded {
        /// Unit index that was requested
        requested: u32,
        /// Maximum number of units reported by the capabilities
        max: u32,
    },

    /// Uniform value could not be assigned or looked up
    #[error("Uniform error: {0}")]
    Uniform(#[from] UniformError),

    /// A node id did not resolve in the scene arena
    #[error("Unknown scene node: {0:?}")]
    UnknownNode(NodeId),

    /// Backend-specific error occurred
    #[error("Backend error: {0}")]
    Backend(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors of the uniform value model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UniformError {
    /// Assigned value kind differs from the stored kind
    #[error("Uniform {name:?} holds a {expected} value, cannot assign {found}")]
    TypeMismatch {
        /// Semantic name of the uniform
        name: UniformName,
        /// Kind currently stored
        expected: &'static str,
        /// Kind that was assigned
        found: &'static str,
    },

    /// Uniform is not part of the set
    #[error("Uniform {0:?} is not present in the set")]
    Missing(UniformName),
}
