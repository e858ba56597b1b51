//! Texture unit allocation

use crate::error::{RenderError, RenderResult};

/// Counter handing out texture units for the program being bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureUnits {
    used: u32,
    max: u32,
}

impl TextureUnits {
    /// Allocator for a GPU with `max` units
    pub fn new(max: u32) -> Self {
        Self { used: 0, max }
    }

    /// Next free unit; running out is an error
    pub fn allocate(&mut self) -> RenderResult<u32> {
        let unit = self.used;
        if unit >= self.max {
            return Err(RenderError::TextureUnitsExceeded {
                requested: unit,
                max: self.max,
            });
        }
        self.used += 1;
        Ok(unit)
    }

    /// Units handed out since the last reset
    pub fn used(&self) -> u32 {
        self.used
    }

    /// Units available in total
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Start over from unit 0
    pub fn reset(&mut self) {
        self.used = 0;
    }
}
