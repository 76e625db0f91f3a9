use crate::address::{Geometry, WAYS};
use crate::error::{CacheError, Result};
use crate::memory::BackingStore;
use crate::replacement_policies::{LeastRecentlyUsed, PseudoLru, ReplacementPolicy, RoundRobin};
use crate::stats::CacheStats;

/// A generic trait for caches
///
/// Technically not required as we're using static dispatch through [`GenericCache`] instead of
/// dyn Cache, but it keeps the simulator independent of the concrete replacement policy
pub trait CacheTrait {
    /// Reads the byte at `address`, filling its block from memory on a miss
    ///
    /// Counts as a measured access. On an out of bounds address nothing is updated, not even the
    /// access total
    ///
    /// # Arguments
    ///
    /// * `address`: Byte address, must be below the backing store size
    ///
    /// returns: Result<u8>
    fn read(&mut self, address: usize) -> Result<u8>;

    /// Loads `num_blocks` consecutive blocks starting with the one containing `start_address`,
    /// exactly as a miss would, but without touching the hit and miss counters
    ///
    /// Blocks are loaded in increasing address order, so once more blocks map to a set than it
    /// has ways, later blocks evict earlier ones. A block which is already cached only has its
    /// replacement state touched. The whole range is checked against the backing store before
    /// anything is loaded
    fn preload(&mut self, start_address: usize, num_blocks: usize) -> Result<()>;

    /// Fails exactly when [`CacheTrait::read`] would reject `address`, without touching the cache
    fn check_read(&self, address: usize) -> Result<()>;

    /// Fails exactly when [`CacheTrait::preload`] would reject the range, without touching the
    /// cache
    fn check_preload(&self, start_address: usize, num_blocks: usize) -> Result<()>;

    /// Clears the hit and miss counters, leaving the cached data and replacement state intact
    fn reset_stats(&mut self);

    fn stats(&self) -> &CacheStats;

    fn geometry(&self) -> &Geometry;

    /// Gets the number of invalid cache lines. Useful for analysing cache performance or
    /// debugging
    fn get_uninitialised_line_count(&self) -> usize;
}

/// A single line: validity, tag, and one block of data
///
/// `tag` and `data` only mean something while `valid` is set
#[derive(Debug, Clone)]
pub struct CacheLine {
    valid: bool,
    tag: usize,
    data: Box<[u8]>,
}

impl CacheLine {
    fn new(block_size: usize) -> Self {
        Self {
            valid: false,
            tag: 0,
            data: vec![0; block_size].into_boxed_slice(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn tag(&self) -> usize {
        self.tag
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn holds(&self, tag: usize) -> bool {
        self.valid && self.tag == tag
    }

    fn fill(&mut self, tag: usize, block: &[u8]) {
        self.data.copy_from_slice(block);
        self.tag = tag;
        self.valid = true;
    }
}

/// Four lines and the replacement state which picks a victim among them
#[derive(Debug, Clone)]
pub struct CacheSet<R: ReplacementPolicy> {
    lines: [CacheLine; WAYS],
    policy: R,
}

impl<R: ReplacementPolicy> CacheSet<R> {
    fn new(block_size: usize) -> Self {
        Self {
            lines: std::array::from_fn(|_| CacheLine::new(block_size)),
            policy: R::default(),
        }
    }

    pub fn lines(&self) -> &[CacheLine; WAYS] {
        &self.lines
    }

    pub fn policy(&self) -> &R {
        &self.policy
    }

    /// Way holding `tag`, if any
    fn lookup(&self, tag: usize) -> Option<usize> {
        self.lines.iter().position(|line| line.holds(tag))
    }

    /// The first invalid way in index order, otherwise whatever the policy picks
    ///
    /// Empty lines are never chosen through the policy, so cold fills always land in ways 0..3 in
    /// order
    fn choose_victim(&self) -> usize {
        self.lines
            .iter()
            .position(|line| !line.valid)
            .unwrap_or_else(|| self.policy.victim())
    }
}

/// The cache engine, parameterised by a replacement policy
///
/// The engine borrows the backing store for its whole lifetime and never writes to it. Each
/// instance owns its sets and its counters; nothing is shared between caches except the store.
pub struct Cache<'m, R: ReplacementPolicy> {
    geometry: Geometry,
    sets: Vec<CacheSet<R>>,
    stats: CacheStats,
    memory: &'m BackingStore,
}

impl<'m, R: ReplacementPolicy> Cache<'m, R> {
    /// Creates an empty cache
    ///
    /// # Arguments
    ///
    /// * `block_size`: Bytes per line, a power of two
    /// * `cache_size`: Total data capacity, a multiple of `ways * block_size` giving a power of two
    /// number of sets
    /// * `ways`: Associativity, must be 4
    /// * `memory`: The backing store blocks are filled from
    ///
    /// returns: Result<Cache<R>>
    pub fn new(block_size: usize, cache_size: usize, ways: usize, memory: &'m BackingStore) -> Result<Self> {
        let geometry = Geometry::new(block_size, cache_size, ways)?;
        Ok(Self {
            sets: (0..geometry.num_sets()).map(|_| CacheSet::new(block_size)).collect(),
            geometry,
            stats: CacheStats::default(),
            memory,
        })
    }

    pub fn sets(&self) -> &[CacheSet<R>] {
        &self.sets
    }

    pub fn hits(&self) -> u64 {
        self.stats.hits
    }

    pub fn misses(&self) -> u64 {
        self.stats.misses
    }

    pub fn total_accesses(&self) -> u64 {
        self.stats.total_accesses
    }

    pub fn hit_rate(&self) -> Result<f64> {
        self.stats.hit_rate()
    }

    /// Fails unless the whole block containing `address` lies inside the backing store
    fn check_block(&self, address: usize) -> Result<()> {
        let out_of_bounds = CacheError::OutOfBounds {
            address,
            memory_size: self.memory.size(),
        };
        if address >= self.memory.size() {
            return Err(out_of_bounds);
        }
        match self.geometry.block_start(address).checked_add(self.geometry.block_size()) {
            Some(end) if end <= self.memory.size() => Ok(()),
            _ => Err(out_of_bounds),
        }
    }

    /// Copies the block containing `address` into `way` of its set and marks the line valid
    fn load_block_from_memory(&mut self, address: usize, way: usize) -> Result<()> {
        let parts = self.geometry.decompose(address);
        let memory = self.memory;
        let block = memory.read_block(address - parts.offset, self.geometry.block_size())?;
        let set = &mut self.sets[parts.index];
        debug_assert!(
            set.lines.iter().enumerate().all(|(w, line)| w == way || !line.holds(parts.tag)),
            "tag {:#x} is already cached in set {}",
            parts.tag,
            parts.index
        );
        set.lines[way].fill(parts.tag, block);
        Ok(())
    }

    /// Victim selection and fill shared by the miss path and preloading. Returns the way filled
    fn allocate(&mut self, address: usize) -> Result<usize> {
        let index = self.geometry.index(address);
        let way = self.sets[index].choose_victim();
        self.load_block_from_memory(address, way)?;
        self.sets[index].policy.update_on_fill(way);
        Ok(way)
    }
}

impl<'m> Cache<'m, PseudoLru> {
    /// Creates a cache using tree Pseudo-LRU replacement
    pub fn with_default_policy(block_size: usize, cache_size: usize, ways: usize, memory: &'m BackingStore) -> Result<Self> {
        Self::new(block_size, cache_size, ways, memory)
    }
}

impl<'m, R: ReplacementPolicy> CacheTrait for Cache<'m, R> {
    fn read(&mut self, address: usize) -> Result<u8> {
        self.check_block(address)?;
        let parts = self.geometry.decompose(address);

        if let Some(way) = self.sets[parts.index].lookup(parts.tag) {
            self.stats.record_hit();
            let set = &mut self.sets[parts.index];
            set.policy.update_on_access(way);
            return Ok(set.lines[way].data[parts.offset]);
        }

        self.stats.record_miss();
        let way = self.allocate(address)?;
        Ok(self.sets[parts.index].lines[way].data[parts.offset])
    }

    fn preload(&mut self, start_address: usize, num_blocks: usize) -> Result<()> {
        self.check_preload(start_address, num_blocks)?;
        let block_size = self.geometry.block_size();

        for i in 0..num_blocks {
            let address = start_address + i * block_size;
            let parts = self.geometry.decompose(address);
            // A block which is already cached is only touched, never loaded a second time
            match self.sets[parts.index].lookup(parts.tag) {
                Some(way) => self.sets[parts.index].policy.update_on_access(way),
                None => {
                    self.allocate(address)?;
                }
            }
        }
        Ok(())
    }

    fn check_read(&self, address: usize) -> Result<()> {
        self.check_block(address)
    }

    fn check_preload(&self, start_address: usize, num_blocks: usize) -> Result<()> {
        if num_blocks == 0 {
            return Ok(());
        }
        let last = (num_blocks - 1)
            .checked_mul(self.geometry.block_size())
            .and_then(|span| start_address.checked_add(span))
            .ok_or(CacheError::OutOfBounds {
                address: start_address,
                memory_size: self.memory.size(),
            })?;
        // Addresses only grow, so the first and last blocks bound the whole range
        self.check_block(start_address)?;
        self.check_block(last)
    }

    fn reset_stats(&mut self) {
        self.stats.reset();
    }

    fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    fn get_uninitialised_line_count(&self) -> usize {
        self.sets
            .iter()
            .flat_map(|set| set.lines.iter())
            .filter(|line| !line.valid)
            .count()
    }
}

/// Enum for the caches provided by the library, one variant per replacement policy
///
/// Using trait objects reduces boilerplate, but explicitly branching on every implementation lets
/// the compiler reason about the concrete types and inline the policy calls on each access
pub enum GenericCache<'m> {
    PseudoLru(Cache<'m, PseudoLru>),
    LeastRecentlyUsed(Cache<'m, LeastRecentlyUsed>),
    RoundRobin(Cache<'m, RoundRobin>),
}

impl<'m> From<Cache<'m, PseudoLru>> for GenericCache<'m> {
    fn from(value: Cache<'m, PseudoLru>) -> Self {
        Self::PseudoLru(value)
    }
}

impl<'m> From<Cache<'m, LeastRecentlyUsed>> for GenericCache<'m> {
    fn from(value: Cache<'m, LeastRecentlyUsed>) -> Self {
        Self::LeastRecentlyUsed(value)
    }
}

impl<'m> From<Cache<'m, RoundRobin>> for GenericCache<'m> {
    fn from(value: Cache<'m, RoundRobin>) -> Self {
        Self::RoundRobin(value)
    }
}

impl<'m> CacheTrait for GenericCache<'m> {
    fn read(&mut self, address: usize) -> Result<u8> {
        match self {
            GenericCache::PseudoLru(c) => c.read(address),
            GenericCache::LeastRecentlyUsed(c) => c.read(address),
            GenericCache::RoundRobin(c) => c.read(address),
        }
    }

    fn preload(&mut self, start_address: usize, num_blocks: usize) -> Result<()> {
        match self {
            GenericCache::PseudoLru(c) => c.preload(start_address, num_blocks),
            GenericCache::LeastRecentlyUsed(c) => c.preload(start_address, num_blocks),
            GenericCache::RoundRobin(c) => c.preload(start_address, num_blocks),
        }
    }

    fn check_read(&self, address: usize) -> Result<()> {
        match self {
            GenericCache::PseudoLru(c) => c.check_read(address),
            GenericCache::LeastRecentlyUsed(c) => c.check_read(address),
            GenericCache::RoundRobin(c) => c.check_read(address),
        }
    }

    fn check_preload(&self, start_address: usize, num_blocks: usize) -> Result<()> {
        match self {
            GenericCache::PseudoLru(c) => c.check_preload(start_address, num_blocks),
            GenericCache::LeastRecentlyUsed(c) => c.check_preload(start_address, num_blocks),
            GenericCache::RoundRobin(c) => c.check_preload(start_address, num_blocks),
        }
    }

    fn reset_stats(&mut self) {
        match self {
            GenericCache::PseudoLru(c) => c.reset_stats(),
            GenericCache::LeastRecentlyUsed(c) => c.reset_stats(),
            GenericCache::RoundRobin(c) => c.reset_stats(),
        }
    }

    fn stats(&self) -> &CacheStats {
        match self {
            GenericCache::PseudoLru(c) => c.stats(),
            GenericCache::LeastRecentlyUsed(c) => c.stats(),
            GenericCache::RoundRobin(c) => c.stats(),
        }
    }

    fn geometry(&self) -> &Geometry {
        match self {
            GenericCache::PseudoLru(c) => c.geometry(),
            GenericCache::LeastRecentlyUsed(c) => c.geometry(),
            GenericCache::RoundRobin(c) => c.geometry(),
        }
    }

    fn get_uninitialised_line_count(&self) -> usize {
        match self {
            GenericCache::PseudoLru(c) => c.get_uninitialised_line_count(),
            GenericCache::LeastRecentlyUsed(c) => c.get_uninitialised_line_count(),
            GenericCache::RoundRobin(c) => c.get_uninitialised_line_count(),
        }
    }
}
