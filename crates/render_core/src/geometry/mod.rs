//! Buffer geometry and attributes

mod attribute;
mod buffer_geometry;

pub use attribute::{AttributeData, AttributeId, BufferAttribute};
pub use buffer_geometry::{DrawRange, Geometry, GeometryGroup, GeometryId, SharedGeometry};
