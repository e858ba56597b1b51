//! Texture handles
//!
//! Image decoding and GPU upload live behind the backend; the core only needs
//! identity, size and a version to know when a texture changed.

use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// Unique texture identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// Shared texture handle
pub type TextureRef = Rc<Texture>;

/// CPU-side description of a texture
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    id: TextureId,
    /// Debug name
    pub name: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Incremented when the image data changes
    pub version: u32,
    /// Build a mip chain after upload
    pub generate_mipmaps: bool,
}

impl Texture {
    /// Create a texture description with a fresh id
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: TextureId(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.into(),
            width,
            height,
            version: 0,
            generate_mipmaps: true,
        }
    }

    /// Texture identifier
    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Flag the image data as changed
    pub fn needs_update(&mut self) {
        self.version += 1;
    }
}
