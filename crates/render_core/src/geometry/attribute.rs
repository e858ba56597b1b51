//! Vertex and index attribute buffers

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ATTRIBUTE_ID: AtomicU64 = AtomicU64::new(1);

/// Unique attribute identifier, used as the GPU buffer key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeId(pub u64);

/// Typed element storage
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeData {
    /// 32-bit floats (positions, normals, uvs, colors)
    F32(Vec<f32>),
    /// 16-bit indices
    U16(Vec<u16>),
    /// 32-bit indices
    U32(Vec<u32>),
}

impl AttributeData {
    /// Number of scalar elements
    pub fn len(&self) -> usize {
        match self {
            Self::F32(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
        }
    }

    /// No elements stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw bytes for buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::F32(v) => bytemuck::cast_slice(v),
            Self::U16(v) => bytemuck::cast_slice(v),
            Self::U32(v) => bytemuck::cast_slice(v),
        }
    }

    /// Element at `i` widened to u32; float data is truncated
    pub fn get_u32(&self, i: usize) -> Option<u32> {
        match self {
            Self::F32(v) => v.get(i).map(|x| *x as u32),
            Self::U16(v) => v.get(i).map(|x| u32::from(*x)),
            Self::U32(v) => v.get(i).copied(),
        }
    }
}

/// A buffer of fixed-size items with a version counter
#[derive(Debug, Clone, PartialEq)]
pub struct BufferAttribute {
    id: AttributeId,
    /// Element storage
    pub data: AttributeData,
    /// Scalars per item (3 for positions, 1 for indices)
    pub item_size: usize,
    /// Integer data is normalized when read by the shader
    pub normalized: bool,
    /// Upload with a dynamic usage hint
    pub dynamic: bool,
    version: u32,
}

impl BufferAttribute {
    /// Create an attribute with a fresh id
    pub fn new(data: AttributeData, item_size: usize) -> Self {
        Self {
            id: AttributeId(NEXT_ATTRIBUTE_ID.fetch_add(1, Ordering::Relaxed)),
            data,
            item_size: item_size.max(1),
            normalized: false,
            dynamic: false,
            version: 0,
        }
    }

    /// Float attribute
    pub fn from_f32(data: Vec<f32>, item_size: usize) -> Self {
        Self::new(AttributeData::F32(data), item_size)
    }

    /// Index attribute; picks 16-bit storage when every index fits
    pub fn index(indices: Vec<u32>) -> Self {
        if indices.iter().all(|i| *i <= u32::from(u16::MAX)) {
            let narrow = indices.iter().map(|i| *i as u16).collect();
            Self::new(AttributeData::U16(narrow), 1)
        } else {
            Self::new(AttributeData::U32(indices), 1)
        }
    }

    /// Attribute identifier
    pub fn id(&self) -> AttributeId {
        self.id
    }

    /// Number of items
    pub fn count(&self) -> u32 {
        u32::try_from(self.data.len() / self.item_size).unwrap_or(u32::MAX)
    }

    /// Incremented by [`BufferAttribute::needs_update`]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Flag the data as changed so the next frame re-uploads it
    pub fn needs_update(&mut self) {
        self.version += 1;
    }

    /// Item `i` as a float triple, if this is 3-component float data
    pub fn vec3(&self, i: usize) -> Option<[f32; 3]> {
        match &self.data {
            AttributeData::F32(v) if self.item_size == 3 => {
                let s = v.get(i * 3..i * 3 + 3)?;
                Some([s[0], s[1], s[2]])
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_uses_item_size() {
        let a = BufferAttribute::from_f32(vec![0.0; 9], 3);
        assert_eq!(a.count(), 3);
        assert_eq!(a.data.as_bytes().len(), 36);
    }

    #[test]
    fn test_index_picks_narrow_storage() {
        let small = BufferAttribute::index(vec![0, 1, 2]);
        assert!(matches!(small.data, AttributeData::U16(_)));
        let large = BufferAttribute::index(vec![0, 70_000]);
        assert!(matches!(large.data, AttributeData::U32(_)));
        assert_eq!(large.data.get_u32(1), Some(70_000));
    }

    #[test]
    fn test_needs_update_bumps_version() {
        let mut a = BufferAttribute::from_f32(vec![1.0], 1);
        a.needs_update();
        a.needs_update();
        assert_eq!(a.version(), 2);
    }
}
