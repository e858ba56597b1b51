//! Layer masks
//!
//! A node is drawn by a camera only when their masks share a channel.

/// 32-channel membership mask; new masks belong to channel 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Layers {
    mask: u32,
}

impl Default for Layers {
    fn default() -> Self {
        Self { mask: 1 }
    }
}

impl Layers {
    /// Mask containing only channel 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Mask containing no channel
    pub fn none() -> Self {
        Self { mask: 0 }
    }

    /// Raw bit mask
    pub fn mask(self) -> u32 {
        self.mask
    }

    /// Membership in exactly `channel`
    pub fn set(&mut self, channel: u32) {
        self.mask = 1 << (channel % 32);
    }

    /// Add `channel`
    pub fn enable(&mut self, channel: u32) {
        self.mask |= 1 << (channel % 32);
    }

    /// Remove `channel`
    pub fn disable(&mut self, channel: u32) {
        self.mask &= !(1 << (channel % 32));
    }

    /// Flip `channel`
    pub fn toggle(&mut self, channel: u32) {
        self.mask ^= 1 << (channel % 32);
    }

    /// At least one channel in common
    pub fn test(self, other: Layers) -> bool {
        self.mask & other.mask != 0
    }
}
