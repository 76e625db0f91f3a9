use crate::error::{CacheError, Result};

/// Number of lines in every set. The PLRU tree is defined over exactly this many ways.
pub const WAYS: usize = 4;

/// An address split into its cache coordinates
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DecomposedAddress {
    pub tag: usize,
    pub index: usize,
    pub offset: usize,
}

/// The fixed shape of a cache, and the bit arithmetic derived from it
///
/// ```text
/// Address layout:
/// [ tag | index (log2(num_sets) bits) | offset (log2(block_size) bits) ]
/// ```
///
/// Both the block size and the set count are powers of two, so every field is a shift and a mask.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Geometry {
    block_size: usize,
    num_sets: usize,
    offset_bits: u32,
    index_bits: u32,
}

impl Geometry {
    /// Validates a cache shape and derives the set count
    ///
    /// # Arguments
    ///
    /// * `block_size`: Bytes per line, a power of two
    /// * `cache_size`: Total data capacity in bytes
    /// * `ways`: Lines per set, must be [`WAYS`]
    ///
    /// returns: Result<Geometry>
    pub fn new(block_size: usize, cache_size: usize, ways: usize) -> Result<Self> {
        if ways != WAYS {
            return Err(CacheError::UnsupportedAssociativity { ways });
        }
        if !block_size.is_power_of_two() {
            return Err(CacheError::InvalidBlockSize { block_size });
        }
        let set_bytes = block_size
            .checked_mul(ways)
            .ok_or(CacheError::InvalidBlockSize { block_size })?;
        if cache_size % set_bytes != 0 {
            return Err(CacheError::UnevenGeometry {
                cache_size,
                ways,
                block_size,
            });
        }
        let num_sets = cache_size / set_bytes;
        // Also rejects zero, which is_power_of_two reports as false
        if !num_sets.is_power_of_two() {
            return Err(CacheError::InvalidSetCount { num_sets });
        }
        Ok(Self {
            block_size,
            num_sets,
            offset_bits: block_size.trailing_zeros(),
            index_bits: num_sets.trailing_zeros(),
        })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn num_sets(&self) -> usize {
        self.num_sets
    }

    pub fn ways(&self) -> usize {
        WAYS
    }

    /// Total data capacity, `num_sets * ways * block_size`
    pub fn cache_size(&self) -> usize {
        self.num_sets * WAYS * self.block_size
    }

    #[inline]
    pub fn offset(&self, address: usize) -> usize {
        address & (self.block_size - 1)
    }

    #[inline]
    pub fn index(&self, address: usize) -> usize {
        (address >> self.offset_bits) & (self.num_sets - 1)
    }

    #[inline]
    pub fn tag(&self, address: usize) -> usize {
        address >> (self.offset_bits + self.index_bits)
    }

    /// Start of the block containing `address`
    #[inline]
    pub fn block_start(&self, address: usize) -> usize {
        address & !(self.block_size - 1)
    }

    pub fn decompose(&self, address: usize) -> DecomposedAddress {
        DecomposedAddress {
            tag: self.tag(address),
            index: self.index(address),
            offset: self.offset(address),
        }
    }

    /// Inverse of [`Geometry::decompose`]
    pub fn compose(&self, parts: DecomposedAddress) -> usize {
        (parts.tag << (self.offset_bits + self.index_bits))
            | (parts.index << self.offset_bits)
            | parts.offset
    }
}
