use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::config::PatternKind;
use crate::error::{CacheError, Result};
use crate::io::load_trace;

/// Seed used for random patterns which don't specify one
pub const DEFAULT_SEED: u64 = 0x5EED_CAC4E;

/// `count` consecutive byte addresses from `start`
///
/// Fails with [`CacheError::AddressOverflow`] if the run would pass `usize::MAX`
pub fn sequential(start: usize, count: usize) -> Result<Vec<usize>> {
    let end = start
        .checked_add(count)
        .ok_or(CacheError::AddressOverflow { start })?;
    Ok((start..end).collect())
}

/// Cycles through `bases` until `repetitions` addresses have been produced
pub fn round_robin(bases: &[usize], repetitions: usize) -> Vec<usize> {
    if bases.is_empty() {
        return Vec::new();
    }
    bases.iter().copied().cycle().take(repetitions).collect()
}

/// `count` addresses drawn uniformly from `[0, memory_size)`, the same ones for the same seed
pub fn random(count: usize, memory_size: usize, seed: u64) -> Vec<usize> {
    if memory_size == 0 {
        return Vec::new();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_| rng.gen_range(0..memory_size)).collect()
}

/// `count` addresses `stride` bytes apart
///
/// Fails with [`CacheError::AddressOverflow`] if the last address would pass `usize::MAX`
pub fn strided(start: usize, stride: usize, count: usize) -> Result<Vec<usize>> {
    (0..count)
        .map(|i| {
            i.checked_mul(stride)
                .and_then(|offset| start.checked_add(offset))
                .ok_or(CacheError::AddressOverflow { start })
        })
        .collect()
}

/// Expands a configured pattern into its addresses
pub fn generate(kind: &PatternKind, memory_size: usize) -> Result<Vec<usize>> {
    match kind {
        PatternKind::Sequential { start, count } => sequential(*start, *count),
        PatternKind::RoundRobin { addresses, repetitions } => Ok(round_robin(addresses, *repetitions)),
        PatternKind::Random { count, seed } => Ok(random(*count, memory_size, seed.unwrap_or(DEFAULT_SEED))),
        PatternKind::Strided { start, stride, count } => strided(*start, *stride, *count),
        PatternKind::Trace { path } => load_trace(path),
    }
}
