use crate::cache::CacheTrait;
use crate::config::{
    CacheConfig, PatternConfig, PatternKind, PreloadConfig, ReplacementPolicyConfig, SimulationConfig,
};
use crate::error::CacheError;
use crate::memory::BackingStore;
use crate::patterns;
use crate::simulator::Simulator;

fn cache_config(name: &str, policy: ReplacementPolicyConfig) -> CacheConfig {
    CacheConfig {
        name: name.to_string(),
        size: 8192,
        block_size: 64,
        ways: 4,
        replacement_policy: policy,
    }
}

#[test]
fn default_experiment() {
    let config = SimulationConfig::default();
    let memory = BackingStore::new(config.memory_size);
    let mut simulator = Simulator::new(&config, &memory).unwrap();
    let result = simulator.run(&config.patterns).unwrap();

    assert_eq!(result.caches.len(), 1);
    let l1 = &result.caches[0];
    assert_eq!(l1.name, "L1");
    let names = l1.patterns.iter().map(|p| p.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["Sequential Access", "Round Robin Access", "Random Access", "Strided Access"]);

    assert_eq!((l1.patterns[0].hits, l1.patterns[0].misses), (100, 0));
    assert_eq!((l1.patterns[1].hits, l1.patterns[1].misses), (20, 0));
    assert_eq!(l1.patterns[2].hits + l1.patterns[2].misses, 50);
    // Random misses may evict some of the 13 blocks the strided pattern touches
    assert_eq!(l1.patterns[3].hits + l1.patterns[3].misses, 50);
    assert!(l1.patterns[3].misses <= 13);
    assert_eq!(l1.patterns[0].hit_rate, Some(1.0));

    let hits: u64 = l1.patterns.iter().map(|p| p.hits).sum();
    let misses: u64 = l1.patterns.iter().map(|p| p.misses).sum();
    assert_eq!((l1.overall_hits, l1.overall_misses), (hits, misses));
    assert_eq!(l1.overall_hit_rate, Some(hits as f64 / 220.0));
}

#[test]
fn preloaded_patterns_never_miss() {
    // Without the random pattern everything stays inside the preloaded first 6400 bytes
    let mut config = SimulationConfig::default();
    config.patterns.retain(|p| !matches!(p.kind, PatternKind::Random { .. }));
    let memory = BackingStore::new(config.memory_size);
    let mut simulator = Simulator::new(&config, &memory).unwrap();
    let result = simulator.run(&config.patterns).unwrap();
    let l1 = &result.caches[0];
    assert_eq!(l1.patterns.len(), 3);
    assert!(l1.patterns.iter().all(|p| p.misses == 0));
    assert_eq!(l1.overall_hits, 170);
    assert_eq!(l1.overall_hit_rate, Some(1.0));
}

#[test]
fn runs_are_reproducible() {
    let config = SimulationConfig::default().with_default_seed(7);
    let memory = BackingStore::new(config.memory_size);
    let first = Simulator::new(&config, &memory).unwrap().run(&config.patterns).unwrap().clone();
    let second = Simulator::new(&config, &memory).unwrap().run(&config.patterns).unwrap().clone();
    assert_eq!(first, second);
}

#[test]
fn every_cache_sees_the_same_addresses() {
    let config = SimulationConfig {
        memory_size: 65536,
        caches: vec![
            cache_config("plru", ReplacementPolicyConfig::PseudoLru),
            cache_config("lru", ReplacementPolicyConfig::LeastRecentlyUsed),
            cache_config("rr", ReplacementPolicyConfig::RoundRobin),
        ],
        preload: None,
        patterns: vec![PatternConfig::new(PatternKind::Random { count: 500, seed: Some(3) })],
    };
    let memory = BackingStore::new(config.memory_size);
    let mut simulator = Simulator::new(&config, &memory).unwrap();
    let result = simulator.run(&config.patterns).unwrap();
    assert_eq!(result.caches.len(), 3);
    for cache in &result.caches {
        assert_eq!(cache.patterns[0].hits + cache.patterns[0].misses, 500);
    }
    assert!(simulator.caches().iter().all(|c| c.stats().total_accesses == 500));
}

#[test]
fn empty_pattern_has_no_hit_rate() {
    let config = SimulationConfig {
        memory_size: 4096,
        caches: vec![cache_config("L1", ReplacementPolicyConfig::PseudoLru)],
        preload: None,
        patterns: vec![PatternConfig {
            name: Some("nothing".to_string()),
            kind: PatternKind::Sequential { start: 0, count: 0 },
        }],
    };
    let memory = BackingStore::new(config.memory_size);
    let mut simulator = Simulator::new(&config, &memory).unwrap();
    let result = simulator.run(&config.patterns).unwrap();
    assert_eq!(result.caches[0].patterns[0].name, "nothing");
    assert_eq!(result.caches[0].patterns[0].hit_rate, None);
    assert_eq!(result.caches[0].overall_hit_rate, None);
    assert_eq!(simulator.get_uninitialised_line_counts(), vec![128]);
}

#[test]
fn invalid_cache_is_rejected() {
    let mut config = SimulationConfig::default();
    config.caches[0].size = 8000;
    let memory = BackingStore::new(config.memory_size);
    assert!(matches!(
        Simulator::new(&config, &memory),
        Err(CacheError::UnevenGeometry { .. })
    ));
}

#[test]
fn out_of_range_pattern_fails() {
    let mut config = SimulationConfig::default();
    config.preload = None;
    config.patterns = vec![PatternConfig::new(PatternKind::Sequential { start: 65530, count: 10 })];
    let memory = BackingStore::new(config.memory_size);
    let mut simulator = Simulator::new(&config, &memory).unwrap();
    assert!(matches!(
        simulator.run(&config.patterns),
        Err(CacheError::OutOfBounds { address: 65536, .. })
    ));
}

#[test]
fn preload_out_of_range_fails() {
    let mut config = SimulationConfig::default();
    config.preload = Some(PreloadConfig { start_address: 0, num_blocks: 2000 });
    let memory = BackingStore::new(config.memory_size);
    let mut simulator = Simulator::new(&config, &memory).unwrap();
    assert!(simulator.run(&config.patterns).is_err());
}

#[test]
fn parses_json_config() {
    let json = r#"{
        "caches": [
            { "name": "a", "size": 4096, "block_size": 32 },
            { "name": "b", "size": 4096, "block_size": 32, "replacement_policy": "lru" }
        ],
        "preload": { "start_address": 0, "num_blocks": 8 },
        "patterns": [
            { "kind": "sequential", "start": 0, "count": 10 },
            { "kind": "round_robin", "name": "rr", "addresses": [0, 64], "repetitions": 4 },
            { "kind": "random", "count": 5 },
            { "kind": "strided", "start": 0, "stride": 16, "count": 3 },
            { "kind": "trace", "path": "trace.txt" }
        ]
    }"#;
    let config: SimulationConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.memory_size, 65536);
    assert_eq!(config.caches[0].ways, 4);
    assert_eq!(config.caches[0].replacement_policy, ReplacementPolicyConfig::PseudoLru);
    assert_eq!(config.caches[1].replacement_policy, ReplacementPolicyConfig::LeastRecentlyUsed);
    assert_eq!(config.preload.unwrap().num_blocks, 8);
    assert_eq!(config.patterns.len(), 5);
    assert_eq!(config.patterns[0].display_name(), "Sequential Access");
    assert_eq!(config.patterns[1].display_name(), "rr");
    assert!(matches!(config.patterns[2].kind, PatternKind::Random { count: 5, seed: None }));
    assert!(matches!(&config.patterns[4].kind, PatternKind::Trace { path } if path == "trace.txt"));

    let seeded = config.with_default_seed(9);
    assert!(matches!(seeded.patterns[2].kind, PatternKind::Random { seed: Some(9), .. }));
}

#[test]
fn explicit_seed_is_kept() {
    let mut config = SimulationConfig::default();
    config.patterns = vec![PatternConfig::new(PatternKind::Random { count: 1, seed: Some(5) })];
    let config = config.with_default_seed(9);
    assert!(matches!(config.patterns[0].kind, PatternKind::Random { seed: Some(5), .. }));
}

#[test]
fn pattern_generators() {
    assert_eq!(patterns::sequential(10, 3).unwrap(), vec![10, 11, 12]);
    assert_eq!(patterns::round_robin(&[1, 2, 3], 7), vec![1, 2, 3, 1, 2, 3, 1]);
    assert!(patterns::round_robin(&[], 7).is_empty());
    assert_eq!(patterns::strided(4, 16, 3).unwrap(), vec![4, 20, 36]);

    let random = patterns::random(1000, 4096, 11);
    assert_eq!(random.len(), 1000);
    assert!(random.iter().all(|&a| a < 4096));
    assert_eq!(random, patterns::random(1000, 4096, 11));
    assert_ne!(random, patterns::random(1000, 4096, 12));
    assert!(patterns::random(10, 0, 1).is_empty());
}

#[test]
fn generators_reject_address_overflow() {
    assert!(matches!(
        patterns::strided(0, usize::MAX / 4, 8),
        Err(CacheError::AddressOverflow { start: 0 })
    ));
    assert!(matches!(
        patterns::sequential(usize::MAX, 2),
        Err(CacheError::AddressOverflow { start: usize::MAX })
    ));
    // The last address itself may be usize::MAX
    assert_eq!(patterns::sequential(usize::MAX - 1, 1).unwrap(), vec![usize::MAX - 1]);
    assert!(patterns::strided(usize::MAX, 1, 0).unwrap().is_empty());
}

#[test]
fn overflowing_pattern_fails_run() {
    let mut config = SimulationConfig::default();
    config.patterns = vec![PatternConfig::new(PatternKind::Strided {
        start: 64,
        stride: usize::MAX / 2,
        count: 4,
    })];
    let memory = BackingStore::new(config.memory_size);
    let mut simulator = Simulator::new(&config, &memory).unwrap();
    assert!(matches!(
        simulator.run(&config.patterns),
        Err(CacheError::AddressOverflow { start: 64 })
    ));
    assert!(simulator.result().caches[0].patterns.is_empty());
}

/// Over 1000 bytes the last 8 byte block is readable but the last 64 byte block is not
fn mixed_block_config(preload: Option<PreloadConfig>) -> SimulationConfig {
    SimulationConfig {
        memory_size: 1000,
        caches: vec![
            CacheConfig {
                name: "small".to_string(),
                size: 128,
                block_size: 8,
                ways: 4,
                replacement_policy: ReplacementPolicyConfig::PseudoLru,
            },
            CacheConfig {
                name: "wide".to_string(),
                size: 1024,
                block_size: 64,
                ways: 4,
                replacement_policy: ReplacementPolicyConfig::PseudoLru,
            },
        ],
        preload,
        patterns: vec![PatternConfig::new(PatternKind::Sequential { start: 0, count: 8 })],
    }
}

#[test]
fn rejected_preload_touches_no_cache() {
    let config = mixed_block_config(Some(PreloadConfig { start_address: 992, num_blocks: 1 }));
    let memory = BackingStore::new(config.memory_size);
    let mut simulator = Simulator::new(&config, &memory).unwrap();

    assert!(matches!(
        simulator.run(&config.patterns),
        Err(CacheError::OutOfBounds { address: 992, memory_size: 1000 })
    ));
    assert_eq!(simulator.get_uninitialised_line_counts(), vec![16, 16]);
    assert!(simulator.result().caches.iter().all(|c| c.patterns.is_empty()));

    // The preload is still pending, so the next run fails the same way
    assert!(simulator.run(&config.patterns).is_err());
    assert_eq!(simulator.get_uninitialised_line_counts(), vec![16, 16]);
}

#[test]
fn rejected_pattern_leaves_results_untouched() {
    let config = mixed_block_config(None);
    let memory = BackingStore::new(config.memory_size);
    let mut simulator = Simulator::new(&config, &memory).unwrap();
    let before = simulator.run(&config.patterns).unwrap().clone();
    assert_eq!(simulator.get_uninitialised_line_counts(), vec![15, 15]);

    let patterns = vec![
        PatternConfig::new(PatternKind::Sequential { start: 0, count: 8 }),
        PatternConfig::new(PatternKind::Sequential { start: 992, count: 8 }),
    ];
    assert!(matches!(
        simulator.run(&patterns),
        Err(CacheError::OutOfBounds { address: 992, .. })
    ));
    assert_eq!(simulator.result(), &before);
    assert_eq!(simulator.get_uninitialised_line_counts(), vec![15, 15]);
    assert!(simulator.caches().iter().all(|c| c.stats().total_accesses == 8));
}
