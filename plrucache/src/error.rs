use thiserror::Error;

/// Result type for cache and simulator operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Main error type for the cache engine and the simulator around it
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Invalid block size: {block_size} (must be a non-zero power of two)")]
    InvalidBlockSize { block_size: usize },

    #[error("Unsupported associativity: {ways} ways (only 4-way caches are supported)")]
    UnsupportedAssociativity { ways: usize },

    #[error("Cache size {cache_size} is not divisible by {ways} ways x {block_size} byte blocks")]
    UnevenGeometry {
        cache_size: usize,
        ways: usize,
        block_size: usize,
    },

    #[error("Invalid set count: {num_sets} (must be a non-zero power of two)")]
    InvalidSetCount { num_sets: usize },

    #[error("Out of bounds access at 0x{address:X} (memory size {memory_size} bytes)")]
    OutOfBounds { address: usize, memory_size: usize },

    #[error("Pattern starting at 0x{start:X} runs past the end of the address space")]
    AddressOverflow { start: usize },

    #[error("Hit rate is undefined: no accesses recorded")]
    NoAccesses,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Couldn't parse trace line {line}: {content:?}")]
    TraceParse { line: usize, content: String },
}
