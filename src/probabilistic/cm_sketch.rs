// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::config::SketchConfig;
use crate::traits::{KvError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use siphasher::sip::SipHasher13;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Number of counter rows in a [`CmSketch`].
pub const SKETCH_DEPTH: usize = 4;

/// Largest value a 4-bit counter can hold.
pub const MAX_COUNT: u8 = 15;

/// Rounds `x` up to the smallest power of two that is `>= x`.
///
/// Returns `None` for zero and for values above `2^63`, which have no
/// representable power of two.
///
/// ```
/// use kv_primitives::probabilistic::next_power_of_two;
///
/// assert_eq!(next_power_of_two(1), Some(1));
/// assert_eq!(next_power_of_two(5), Some(8));
/// assert_eq!(next_power_of_two(64), Some(64));
/// assert_eq!(next_power_of_two(0), None);
/// ```
pub fn next_power_of_two(x: u64) -> Option<u64> {
    if x == 0 || x > 1 << 63 {
        return None;
    }
    // Smear the highest set bit into every lower position. Decrementing first
    // keeps exact powers of two unchanged.
    let mut x = x - 1;
    x |= x >> 1;
    x |= x >> 2;
    x |= x >> 4;
    x |= x >> 8;
    x |= x >> 16;
    x |= x >> 32;
    Some(x + 1)
}

/// Hashes any `Hash` item into the 64-bit domain the sketch consumes.
pub fn hash_key<T: Hash + ?Sized>(item: &T) -> u64 {
    let mut hasher = SipHasher13::new();
    item.hash(&mut hasher);
    hasher.finish()
}

/// One row of 4-bit counters, two per byte.
///
/// Slot `n` lives in byte `n / 2`: even slots in the low nibble, odd slots in
/// the high nibble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmRow {
    bytes: Vec<u8>,
    counters: usize,
}

#[allow(clippy::len_without_is_empty)]
impl CmRow {
    fn new(counters: usize) -> Self {
        Self {
            bytes: vec![0; counters.div_ceil(2)],
            counters,
        }
    }

    /// Reads the counter at slot `n`, taken modulo the row length.
    pub fn get(&self, n: u64) -> u8 {
        let n = n & (self.counters as u64 - 1);
        (self.bytes[(n / 2) as usize] >> ((n & 1) * 4)) & 0x0f
    }

    fn increment(&mut self, n: u64) {
        let i = (n / 2) as usize;
        let shift = (n & 1) * 4;
        let v = (self.bytes[i] >> shift) & 0x0f;
        if v < MAX_COUNT {
            self.bytes[i] += 1 << shift;
        }
    }

    fn reset(&mut self) {
        for b in self.bytes.iter_mut() {
            *b = (*b >> 1) & 0x77;
        }
    }

    fn clear(&mut self) {
        self.bytes.fill(0);
    }

    /// Number of logical counters in the row.
    pub fn len(&self) -> usize {
        self.counters
    }

    /// Size of the backing buffer in bytes.
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Display for CmRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.counters as u64 {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02}", self.get(i))?;
        }
        Ok(())
    }
}

/// Count-Min Sketch with 4-bit saturating counters.
///
/// Estimates how often a hashed key has been seen using four rows of
/// `capacity` counters each, half a byte per counter. Every row salts the
/// incoming hash with its own random seed before masking it down to a slot,
/// so one collision rarely repeats in all rows.
///
/// # Key Properties
///
/// - **Fixed Memory**: `4 × capacity / 2` bytes, independent of the key count.
/// - **Conservative**: Estimates never fall below the true count (up to the
///   counter ceiling of 15), but may exceed it when keys collide in every row.
/// - **Aging**: [`reset`](Self::reset) halves every counter so stale
///   popularity decays.
///
/// # Thread Safety
///
/// The sketch has no internal locking. Mutating methods take `&mut self`, so
/// an owner shared across threads must serialize access itself, typically
/// under the cache lock it already holds.
///
/// # Example
///
/// ```
/// use kv_primitives::CmSketch;
///
/// let mut sketch = CmSketch::new(1000).unwrap();
/// assert_eq!(sketch.capacity(), 1024);
///
/// sketch.increment(42);
/// sketch.increment(42);
/// assert!(sketch.estimate(42) >= 2);
///
/// sketch.reset();
/// assert!(sketch.estimate(42) >= 1);
///
/// sketch.clear();
/// assert_eq!(sketch.estimate(42), 0);
/// ```
#[derive(Debug, Clone)]
pub struct CmSketch {
    rows: [CmRow; SKETCH_DEPTH],
    seeds: [u64; SKETCH_DEPTH],
    mask: u64,
}

impl CmSketch {
    /// Creates a sketch with at least `counters` counters per row, seeded
    /// from OS entropy.
    pub fn new(counters: u64) -> Result<Self> {
        Self::build(counters, &mut StdRng::from_entropy())
    }

    /// Creates a sketch whose row seeds are derived from `seed`.
    pub fn with_seed(counters: u64, seed: u64) -> Result<Self> {
        Self::build(counters, &mut StdRng::seed_from_u64(seed))
    }

    pub fn from_config(config: &SketchConfig) -> Result<Self> {
        config.validate()?;
        match config.seed {
            Some(seed) => Self::with_seed(config.counters, seed),
            None => Self::new(config.counters),
        }
    }

    fn build(counters: u64, rng: &mut StdRng) -> Result<Self> {
        if counters == 0 {
            return Err(KvError::InvalidArgument(
                "cm sketch needs at least one counter".into(),
            ));
        }
        let capacity = next_power_of_two(counters).ok_or_else(|| {
            KvError::CapacityOverflow(format!("{} counters cannot be rounded", counters))
        })?;
        let width = usize::try_from(capacity).map_err(|_| {
            KvError::CapacityOverflow(format!(
                "{} counters do not fit in memory",
                capacity
            ))
        })?;

        let seeds = std::array::from_fn(|_| rng.gen::<u64>());
        let rows = std::array::from_fn(|_| CmRow::new(width));
        let mask = capacity - 1;

        tracing::debug!(requested = counters, capacity, mask, "cm sketch created");

        Ok(Self { rows, seeds, mask })
    }

    #[inline]
    fn slot(&self, row: usize, hashed: u64) -> u64 {
        (hashed ^ self.seeds[row]) & self.mask
    }

    /// Records one occurrence of `hashed`.
    pub fn increment(&mut self, hashed: u64) {
        for row in 0..SKETCH_DEPTH {
            let slot = self.slot(row, hashed);
            self.rows[row].increment(slot);
        }
    }

    /// Returns the estimated occurrence count of `hashed`, in `0..=15`.
    pub fn estimate(&self, hashed: u64) -> u8 {
        (0..SKETCH_DEPTH)
            .map(|row| self.rows[row].get(self.slot(row, hashed)))
            .min()
            .unwrap_or(0)
    }

    /// Hashes `item` with [`hash_key`] and records it.
    pub fn increment_key<T: Hash + ?Sized>(&mut self, item: &T) {
        self.increment(hash_key(item));
    }

    /// Hashes `item` with [`hash_key`] and estimates it.
    pub fn estimate_key<T: Hash + ?Sized>(&self, item: &T) -> u8 {
        self.estimate(hash_key(item))
    }

    /// Halves every counter.
    pub fn reset(&mut self) {
        for row in self.rows.iter_mut() {
            row.reset();
        }
        tracing::trace!(capacity = self.capacity(), "cm sketch aged");
    }

    /// Zeroes every counter.
    pub fn clear(&mut self) {
        for row in self.rows.iter_mut() {
            row.clear();
        }
        tracing::trace!(capacity = self.capacity(), "cm sketch cleared");
    }

    /// Counters per row; always a power of two.
    pub fn capacity(&self) -> usize {
        self.rows[0].len()
    }

    pub fn mask(&self) -> u64 {
        self.mask
    }

    pub fn depth(&self) -> usize {
        SKETCH_DEPTH
    }

    pub fn rows(&self) -> &[CmRow] {
        &self.rows
    }

    /// Returns true if every counter is zero.
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.bytes.iter().all(|&b| b == 0))
    }
}
