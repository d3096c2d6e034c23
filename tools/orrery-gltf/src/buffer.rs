//! Contiguous binary packing of vertex and index streams
//!
//! Streams are appended back to back in the order they are packed. No
//! alignment padding is inserted, so region `n` starts exactly where region
//! `n - 1` ends. Floats are stored as little-endian `f32`, indices as
//! little-endian `u16`.

use tracing::debug;

use crate::error::{AssetError, Result};

/// What a packed region is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionUsage {
    /// Vertex attribute stream (ARRAY_BUFFER)
    Vertex,
    /// Triangle index stream (ELEMENT_ARRAY_BUFFER)
    Index,
}

/// Components per element of a packed stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementShape {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
}

impl ElementShape {
    /// Shape for `n`-component tuples; only 1 to 4 components exist
    pub const fn from_components(n: usize) -> Option<Self> {
        match n {
            1 => Some(Self::Scalar),
            2 => Some(Self::Vec2),
            3 => Some(Self::Vec3),
            4 => Some(Self::Vec4),
            _ => None,
        }
    }

    pub const fn components(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 => 4,
        }
    }
}

/// Handle to a region inside the packed blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionIndex(pub u32);

/// Location and shape of one packed stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferRegion {
    pub byte_offset: usize,
    pub byte_length: usize,
    /// Number of elements (vertices for attribute streams, indices for index streams)
    pub element_count: usize,
    /// Bytes per element
    pub element_width: usize,
    /// Scalar for indices
    pub shape: ElementShape,
    pub usage: RegionUsage,
}

impl BufferRegion {
    /// Byte range of this region within the blob
    pub fn range(&self) -> std::ops::Range<usize> {
        self.byte_offset..self.byte_offset + self.byte_length
    }
}

/// Finished blob with its region table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackedBuffer {
    pub data: Vec<u8>,
    pub regions: Vec<BufferRegion>,
}

impl PackedBuffer {
    pub fn region(&self, index: RegionIndex) -> &BufferRegion {
        &self.regions[index.0 as usize]
    }

    /// Bytes covered by one region
    pub fn bytes(&self, index: RegionIndex) -> &[u8] {
        &self.data[self.region(index).range()]
    }
}

/// Builder for the packed binary buffer
#[derive(Debug, Default)]
pub struct BufferBuilder {
    buffer: Vec<u8>,
    regions: Vec<BufferRegion>,
}

impl BufferBuilder {
    /// Create a new empty buffer builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the binary buffer data
    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    /// Regions packed so far, in packing order
    pub fn regions(&self) -> &[BufferRegion] {
        &self.regions
    }

    /// Pack a stream of `N`-component float tuples (positions, normals, UVs)
    ///
    /// `N` outside 1..=4 fails to compile.
    pub fn pack_floats<const N: usize>(&mut self, data: &[[f32; N]]) -> RegionIndex {
        let shape = const {
            match ElementShape::from_components(N) {
                Some(shape) => shape,
                None => panic!("float tuples have 1 to 4 components"),
            }
        };
        let offset = self.buffer.len();
        self.buffer.reserve(data.len() * N * 4);
        for item in data {
            for f in item {
                self.buffer.extend_from_slice(&f.to_le_bytes());
            }
        }

        self.push_region(BufferRegion {
            byte_offset: offset,
            byte_length: data.len() * N * 4,
            element_count: data.len(),
            element_width: N * 4,
            shape,
            usage: RegionUsage::Vertex,
        })
    }

    /// Pack triangle indices as u16
    ///
    /// Every index is checked before any byte is written, so an overflow
    /// leaves the buffer untouched.
    pub fn pack_indices_u16(&mut self, indices: &[u32]) -> Result<RegionIndex> {
        if let Some((position, &index)) = indices
            .iter()
            .enumerate()
            .find(|(_, i)| **i > u16::MAX as u32)
        {
            return Err(AssetError::IndexOverflow { index, position });
        }

        let offset = self.buffer.len();
        self.buffer.reserve(indices.len() * 2);
        for &idx in indices {
            // Range checked above
            self.buffer.extend_from_slice(&(idx as u16).to_le_bytes());
        }

        Ok(self.push_region(BufferRegion {
            byte_offset: offset,
            byte_length: indices.len() * 2,
            element_count: indices.len(),
            element_width: 2,
            shape: ElementShape::Scalar,
            usage: RegionUsage::Index,
        }))
    }

    fn push_region(&mut self, region: BufferRegion) -> RegionIndex {
        debug!(
            "packed {:?} region {}: offset {} length {} ({} elements)",
            region.usage,
            self.regions.len(),
            region.byte_offset,
            region.byte_length,
            region.element_count
        );
        self.regions.push(region);
        RegionIndex(self.regions.len() as u32 - 1)
    }

    /// Finish packing
    pub fn finish(self) -> PackedBuffer {
        PackedBuffer {
            data: self.buffer,
            regions: self.regions,
        }
    }
}

/// Read back a float stream from packed bytes
pub fn read_floats<const N: usize>(bytes: &[u8]) -> Vec<[f32; N]> {
    bytes
        .chunks_exact(N * 4)
        .map(|chunk| {
            let mut out = [0.0f32; N];
            for (value, raw) in out.iter_mut().zip(chunk.chunks_exact(4)) {
                *value = f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
            }
            out
        })
        .collect()
}

/// Read back a u16 index stream from packed bytes
pub fn read_indices_u16(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|raw| u16::from_le_bytes([raw[0], raw[1]]))
        .collect()
}
