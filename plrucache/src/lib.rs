//! # PlruCache
//!
//! PlruCache models a 4-way set-associative cache sitting in front of a byte-addressable backing
//! memory, to study hit/miss behaviour and replacement-policy quality under different access
//! patterns.
//!
//! The cache engine is generic over its replacement policy, with the tree based Pseudo-LRU policy
//! as the default. Around the engine sit the access-pattern generators and a simulator which
//! replays patterns against one or more cache configurations and collects the results.
//!
//! # Example
//!
//! ```
//! use plrucache::cache::{Cache, CacheTrait};
//! use plrucache::memory::BackingStore;
//!
//! let memory = BackingStore::new(65536);
//! let mut cache = Cache::with_default_policy(64, 8192, 4, &memory).unwrap();
//!
//! assert_eq!(cache.read(300).unwrap(), (300 % 256) as u8);
//! assert_eq!(cache.read(301).unwrap(), (301 % 256) as u8);
//! assert_eq!(cache.stats().hits, 1);
//! assert_eq!(cache.stats().misses, 1);
//! ```

/// Address decomposition into tag, set index and block offset
pub mod address;

/// Contains the implementation of the cache engine, its sets and lines, and a utility enum for
/// the supported replacement policies
pub mod cache;

/// Contains definitions for the JSON configuration format
pub mod config;

/// Error types shared by the engine and the simulator
pub mod error;

/// Loading of address trace files
pub mod io;

/// The backing store the cache reads blocks from
pub mod memory;

/// Access pattern generators used to drive the cache. They know nothing about caches and every
/// one is deterministic, so runs can be compared across cache configurations
pub mod patterns;

/// Contains the provided replacement policies, with a trait for implementing custom replacement
/// policies
pub mod replacement_policies;

/// Contains the simulator used to replay access patterns against a set of cache configurations
pub mod simulator;

/// Hit and miss counters
pub mod stats;

#[cfg(test)]
mod test;
