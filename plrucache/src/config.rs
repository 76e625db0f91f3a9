use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::address::WAYS;
use crate::error::Result;

/// A full simulation: the memory, the caches to compare, optional priming, and the patterns to
/// replay against every cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_memory_size")]
    pub memory_size: usize,
    pub caches: Vec<CacheConfig>,
    #[serde(default)]
    pub preload: Option<PreloadConfig>,
    pub patterns: Vec<PatternConfig>,
}

/// A configuration for a single cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub name: String,
    pub size: usize,
    pub block_size: usize,
    #[serde(default = "default_ways")]
    pub ways: usize,
    #[serde(default)]
    pub replacement_policy: ReplacementPolicyConfig,
}

/// The replacement policy - plru, lru, or rr. Defaults to tree Pseudo-LRU.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum ReplacementPolicyConfig {
    #[default]
    #[serde(alias = "plru")]
    PseudoLru,
    #[serde(alias = "lru")]
    LeastRecentlyUsed,
    #[serde(alias = "rr")]
    RoundRobin,
}

/// Blocks to load before any measured access
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct PreloadConfig {
    pub start_address: usize,
    pub num_blocks: usize,
}

/// A named access pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub kind: PatternKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatternKind {
    Sequential { start: usize, count: usize },
    RoundRobin { addresses: Vec<usize>, repetitions: usize },
    Random { count: usize, #[serde(default)] seed: Option<u64> },
    Strided { start: usize, stride: usize, count: usize },
    Trace { path: String },
}

impl Display for PatternKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PatternKind::Sequential { .. } => "Sequential Access",
            PatternKind::RoundRobin { .. } => "Round Robin Access",
            PatternKind::Random { .. } => "Random Access",
            PatternKind::Strided { .. } => "Strided Access",
            PatternKind::Trace { .. } => "Trace Access",
        };
        f.write_str(name)
    }
}

impl PatternConfig {
    pub fn new(kind: PatternKind) -> Self {
        Self { name: None, kind }
    }

    /// The configured name, or the display name of the pattern kind
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.kind.to_string())
    }
}

impl SimulationConfig {
    /// Reads a JSON configuration file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Seeds every random pattern which doesn't carry its own seed
    pub fn with_default_seed(mut self, default_seed: u64) -> Self {
        for pattern in &mut self.patterns {
            if let PatternKind::Random { seed, .. } = &mut pattern.kind {
                seed.get_or_insert(default_seed);
            }
        }
        self
    }
}

impl Default for SimulationConfig {
    /// 64 KiB of memory, one 8 KiB 4-way PLRU cache with 64 byte blocks, the first 100 blocks
    /// preloaded, and the four synthetic patterns
    fn default() -> Self {
        Self {
            memory_size: default_memory_size(),
            caches: vec![CacheConfig {
                name: "L1".to_string(),
                size: 8192,
                block_size: 64,
                ways: WAYS,
                replacement_policy: ReplacementPolicyConfig::PseudoLru,
            }],
            preload: Some(PreloadConfig {
                start_address: 0,
                num_blocks: 100,
            }),
            patterns: vec![
                PatternConfig::new(PatternKind::Sequential { start: 0, count: 100 }),
                PatternConfig::new(PatternKind::RoundRobin {
                    addresses: vec![0, 64, 128, 192],
                    repetitions: 20,
                }),
                PatternConfig::new(PatternKind::Random { count: 50, seed: None }),
                PatternConfig::new(PatternKind::Strided { start: 0, stride: 16, count: 50 }),
            ],
        }
    }
}

fn default_memory_size() -> usize {
    65536
}

fn default_ways() -> usize {
    WAYS
}
