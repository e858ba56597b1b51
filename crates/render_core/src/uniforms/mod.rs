//! Uniform value model
//!
//! Typed shader inputs keyed by semantic name, the sets they are grouped in,
//! and the library of named fragments shader templates are merged from.

mod value;
mod set;
pub mod library;

pub use value::{
    Uniform, UniformName, UniformValue,
    DirectionalLightUniform, PointLightUniform, SpotLightUniform,
    HemisphereLightUniform, RectAreaLightUniform,
};
pub use set::UniformSet;
pub use library::UniformsId;
