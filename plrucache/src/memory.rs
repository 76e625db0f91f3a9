use crate::error::{CacheError, Result};

/// Flat byte-addressable main memory
///
/// The store is never written once constructed; caches only borrow it to fill their lines, so a
/// single store can back any number of caches at once.
#[derive(Debug, Clone)]
pub struct BackingStore {
    bytes: Vec<u8>,
}

impl BackingStore {
    /// Creates a store of `size` bytes where the byte at index `i` holds `i mod 256`
    pub fn new(size: usize) -> Self {
        Self {
            bytes: (0..size).map(|i| i as u8).collect(),
        }
    }

    /// Wraps existing contents
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Reads a single byte
    #[cfg(test)]
    pub fn read_byte(&self, address: usize) -> Result<u8> {
        self.bytes
            .get(address)
            .copied()
            .ok_or(CacheError::OutOfBounds {
                address,
                memory_size: self.size(),
            })
    }

    /// Borrows `len` contiguous bytes starting at `start`
    ///
    /// Fails if any part of the range falls outside the store, rather than truncating it
    pub fn read_block(&self, start: usize, len: usize) -> Result<&[u8]> {
        start
            .checked_add(len)
            .and_then(|end| self.bytes.get(start..end))
            .ok_or(CacheError::OutOfBounds {
                address: start,
                memory_size: self.size(),
            })
    }
}
