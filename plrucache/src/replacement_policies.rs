use crate::address::WAYS;

/// A generic trait for implementing new replacement policies. Can be used to parameterise a Cache.
///
/// Each set owns one instance, so the state only ever describes the ways of that set. The cache
/// always fills empty lines first (lowest way first); the policy is consulted only when every
/// line of the set is valid.
pub trait ReplacementPolicy: Default {
    /// Updates the policy when a line is read on a hit
    ///
    /// # Arguments
    ///
    /// * `way`: The way which was accessed, in `0..WAYS`
    ///
    /// returns: ()
    fn update_on_access(&mut self, way: usize);

    /// Updates the policy when a line has just been filled from memory
    ///
    /// Most policies make no distinction between a hit and a fill, a default which forwards to
    /// `update_on_access` is provided
    fn update_on_fill(&mut self, way: usize) {
        self.update_on_access(way);
    }

    /// Chooses the way to evict from a full set. Must not change the policy state; the cache
    /// reports the reuse of the chosen way through `update_on_fill`.
    fn victim(&self) -> usize;
}

/// Tree Pseudo-LRU over 4 ways
///
/// ```text
///            bit0
///          /      \
///       bit1      bit2
///      /    \    /    \
///    w0     w1  w2     w3
/// ```
///
/// * `bit0` - set when the most recently used way is in {2, 3}
/// * `bit1` - direction taken inside {0, 1} on the last access to that subtree
/// * `bit2` - direction taken inside {2, 3} on the last access to that subtree
///
/// An access overwrites all three bits with the identity of the accessed way; it does not
/// incrementally walk the tree. The victim walk descends into the subtree `bit0` points at and
/// picks the leaf selected by that subtree's bit.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct PseudoLru {
    bits: [bool; 3],
}

impl PseudoLru {
    pub fn from_bits(bits: [bool; 3]) -> Self {
        Self { bits }
    }

    pub fn bits(&self) -> [bool; 3] {
        self.bits
    }
}

impl ReplacementPolicy for PseudoLru {
    fn update_on_access(&mut self, way: usize) {
        debug_assert!(way < WAYS);
        self.bits[0] = way >= 2;
        self.bits[1] = way % 2 == 1;
        self.bits[2] = (way / 2) % 2 == 1;
    }

    fn victim(&self) -> usize {
        match self.bits {
            [true, _, true] => 3,
            [true, _, false] => 2,
            [false, true, _] => 1,
            [false, false, _] => 0,
        }
    }
}

/// Exact Least Recently Used replacement policy
///
/// Keeps the full recency order of the ways, most recent first. Useful as a baseline to measure
/// how far the PLRU approximation drifts from true LRU on a given pattern.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct LeastRecentlyUsed {
    order: [usize; WAYS],
}

impl Default for LeastRecentlyUsed {
    fn default() -> Self {
        Self { order: [0, 1, 2, 3] }
    }
}

impl LeastRecentlyUsed {
    /// Ways from most to least recently used
    pub fn order(&self) -> [usize; WAYS] {
        self.order
    }
}

impl ReplacementPolicy for LeastRecentlyUsed {
    fn update_on_access(&mut self, way: usize) {
        if let Some(position) = self.order.iter().position(|&w| w == way) {
            // Shift everything more recent than `way` down one slot, then put it at the front
            self.order.copy_within(0..position, 1);
            self.order[0] = way;
        }
    }

    fn victim(&self) -> usize {
        self.order[WAYS - 1]
    }
}

/// Standard round robin replacement policy, evicting ways in fill order
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct RoundRobin {
    next: usize,
}

impl ReplacementPolicy for RoundRobin {
    fn update_on_access(&mut self, _: usize) {}

    fn update_on_fill(&mut self, way: usize) {
        self.next = (way + 1) % WAYS;
    }

    fn victim(&self) -> usize {
        self.next
    }
}
