//! Materials and textures

mod material;
mod texture;

pub use material::{
    Blending, LineCap, LineJoin, Material, MaterialId, MaterialKind, SharedMaterial, Side,
};
pub use texture::{Texture, TextureId, TextureRef};
