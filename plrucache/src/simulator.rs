use std::time::{Duration, Instant};
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use crate::cache::{Cache, CacheTrait, GenericCache};
use crate::config::{CacheConfig, PatternConfig, PreloadConfig, ReplacementPolicyConfig, SimulationConfig};
use crate::error::Result;
use crate::memory::BackingStore;
use crate::patterns::generate;
use crate::replacement_policies::{LeastRecentlyUsed, PseudoLru, RoundRobin};
use crate::stats::hit_rate;

/// The simulator replays access patterns against every configured cache and collects results.
///
/// Every cache borrows the same backing store and sees exactly the same address sequence. It
/// supports calling `run` multiple times, and will update the time taken to simulate and the
/// results accordingly
pub struct Simulator<'m> {
    caches: Vec<GenericCache<'m>>,
    result: SimulationResult,
    preload: Option<PreloadConfig>,
    memory_size: usize,
    simulation_time: Duration,
}

/// The result of a simulation. Can be serialised to JSON
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationResult {
    pub caches: Vec<CacheResult>,
}

/// The results for an individual cache, per pattern and overall
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheResult {
    pub name: String,
    pub patterns: Vec<PatternResult>,
    pub overall_hits: u64,
    pub overall_misses: u64,
    /// `None` until at least one access has been measured
    pub overall_hit_rate: Option<f64>,
}

/// Counters for one pattern, measured from a freshly reset window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternResult {
    pub name: String,
    pub hits: u64,
    pub misses: u64,
    /// `None` for a pattern which produced no addresses
    pub hit_rate: Option<f64>,
}

impl<'m> Simulator<'m> {
    /// Creates a new simulator for a given configuration
    ///
    /// # Arguments
    ///
    /// * `config`: A simulation configuration, usually resulting from parsing JSON
    /// * `memory`: The backing store shared by every cache. Its size takes precedence over
    /// `config.memory_size`
    ///
    /// returns: Result<Simulator>
    pub fn new(config: &SimulationConfig, memory: &'m BackingStore) -> Result<Self> {
        let caches = config
            .caches
            .iter()
            .map(|cache| Self::config_to_cache(cache, memory))
            .collect::<Result<Vec<_>>>()?;
        let result = SimulationResult {
            caches: config
                .caches
                .iter()
                .map(|cache| CacheResult {
                    name: cache.name.clone(),
                    patterns: Vec::new(),
                    overall_hits: 0,
                    overall_misses: 0,
                    overall_hit_rate: None,
                })
                .collect(),
        };
        Ok(Self {
            caches,
            result,
            preload: config.preload,
            memory_size: memory.size(),
            simulation_time: Duration::new(0, 0),
        })
    }

    /// Preloads every cache (if configured), then replays each pattern against each cache
    ///
    /// Counters are reset before every pattern, so each `PatternResult` only covers its own
    /// accesses. Preloading happens on the first successful run only; later runs continue from
    /// whatever the caches already hold. A run which fails leaves the caches, the results and the
    /// pending preload as they were
    pub fn run(&mut self, patterns: &[PatternConfig]) -> Result<&SimulationResult> {
        let start = Instant::now();
        let generated = patterns
            .iter()
            .map(|pattern| Ok((pattern.display_name(), generate(&pattern.kind, self.memory_size)?)))
            .collect::<Result<Vec<_>>>()?;
        self.validate(&generated)?;

        if let Some(preload) = self.preload.take() {
            for cache in &mut self.caches {
                cache.preload(preload.start_address, preload.num_blocks)?;
            }
            debug!(
                "Preloaded {} blocks from 0x{:X} into {} cache(s)",
                preload.num_blocks,
                preload.start_address,
                self.caches.len()
            );
        }

        for (name, addresses) in &generated {
            debug!("Running {name} ({} accesses)", addresses.len());

            for (cache, res) in self.caches.iter_mut().zip(&mut self.result.caches) {
                cache.reset_stats();
                for &address in addresses {
                    let value = cache.read(address)?;
                    trace!("{}: read 0x{address:X} -> 0x{value:02X}", res.name);
                }
                let stats = *cache.stats();
                res.overall_hits += stats.hits;
                res.overall_misses += stats.misses;
                res.overall_hit_rate = hit_rate(res.overall_hits, res.overall_misses).ok();
                res.patterns.push(PatternResult {
                    name: name.clone(),
                    hits: stats.hits,
                    misses: stats.misses,
                    hit_rate: stats.hit_rate().ok(),
                });
            }
        }

        self.simulation_time += start.elapsed();
        info!(
            "Simulated {} pattern(s) on {} cache(s) in {:?}",
            patterns.len(),
            self.caches.len(),
            self.simulation_time
        );
        Ok(&self.result)
    }

    pub fn result(&self) -> &SimulationResult {
        &self.result
    }

    /// Read access to the caches, in configuration order
    pub fn caches(&self) -> &[GenericCache<'m>] {
        &self.caches
    }

    /// Gets the wall-clock execution time for processing
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }

    /// Gets the number of invalid lines for each cache
    pub fn get_uninitialised_line_counts(&self) -> Vec<u64> {
        self.caches.iter().map(|x| x.get_uninitialised_line_count() as u64).collect()
    }

    /// Checks the pending preload and every generated address against every cache
    ///
    /// Caches with different block sizes can disagree on whether a range is in bounds, so each
    /// one is asked before any of them is touched
    fn validate(&self, generated: &[(String, Vec<usize>)]) -> Result<()> {
        for cache in &self.caches {
            if let Some(preload) = &self.preload {
                cache.check_preload(preload.start_address, preload.num_blocks)?;
            }
            for (_, addresses) in generated {
                for &address in addresses {
                    cache.check_read(address)?;
                }
            }
        }
        Ok(())
    }

    /// Creates a new cache from a cache configuration
    fn config_to_cache(config: &CacheConfig, memory: &'m BackingStore) -> Result<GenericCache<'m>> {
        let (block_size, size, ways) = (config.block_size, config.size, config.ways);
        let cache = match config.replacement_policy {
            ReplacementPolicyConfig::PseudoLru => {
                GenericCache::from(Cache::<PseudoLru>::new(block_size, size, ways, memory)?)
            }
            ReplacementPolicyConfig::LeastRecentlyUsed => {
                GenericCache::from(Cache::<LeastRecentlyUsed>::new(block_size, size, ways, memory)?)
            }
            ReplacementPolicyConfig::RoundRobin => {
                GenericCache::from(Cache::<RoundRobin>::new(block_size, size, ways, memory)?)
            }
        };
        debug!(
            "Cache {}: {} sets x {} ways x {} bytes, {:?}",
            config.name,
            cache.geometry().num_sets(),
            cache.geometry().ways(),
            block_size,
            config.replacement_policy
        );
        Ok(cache)
    }
}
