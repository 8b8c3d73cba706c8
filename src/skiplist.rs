// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::config::{IndexConfig, DEFAULT_MAX_HEIGHT, MAX_SUPPORTED_HEIGHT};
use crate::traits::{KvError, Record, Result};
use parking_lot::{RwLock, RwLockReadGuard};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering as KeyOrdering;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// End-of-level marker in a forward tower.
const NIL: u32 = u32::MAX;

/// Packs the first 8 key bytes big-endian into a `u64`.
///
/// Shorter keys are zero-padded on the right, so the score never orders two
/// keys differently from a byte-wise comparison. It does collide for keys
/// that share an 8-byte prefix, which is why comparisons fall back to the
/// full key on equal scores.
///
/// ```
/// use kv_primitives::skiplist::calc_score;
///
/// assert_eq!(calc_score(b"a"), 0x6100_0000_0000_0000);
/// assert_eq!(calc_score(b"abcdefgh"), calc_score(b"abcdefghXYZ"));
/// assert!(calc_score(b"a") < calc_score(b"b"));
/// ```
pub fn calc_score(key: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    let n = key.len().min(8);
    buf[..n].copy_from_slice(&key[..n]);
    u64::from_be_bytes(buf)
}

struct Node<R> {
    /// `tower[i]` is the next node at level `i`.
    tower: Box<[u32]>,
    record: Arc<R>,
    score: u64,
}

struct Inner<R> {
    /// Header tower, one slot per possible level.
    head: Box<[u32]>,
    /// Node arena. Nodes are never removed, so indices stay valid.
    nodes: Vec<Node<R>>,
    /// Levels currently in use; descent starts at `height - 1`.
    height: usize,
    bytes: usize,
    rng: StdRng,
}

impl<R: Record> Inner<R> {
    /// Successor of `from` at `level`; `None` stands for the header.
    #[inline]
    fn forward(&self, from: Option<u32>, level: usize) -> u32 {
        match from {
            None => self.head[level],
            Some(idx) => self.nodes[idx as usize].tower[level],
        }
    }

    #[inline]
    fn set_forward(&mut self, from: Option<u32>, level: usize, to: u32) {
        match from {
            None => self.head[level] = to,
            Some(idx) => self.nodes[idx as usize].tower[level] = to,
        }
    }

    /// Orders `(score, key)` against the node at `idx`.
    #[inline]
    fn compare(&self, score: u64, key: &[u8], idx: u32) -> KeyOrdering {
        let node = &self.nodes[idx as usize];
        score
            .cmp(&node.score)
            .then_with(|| key.cmp(node.record.key()))
    }

    /// Walks down from the top level in use. Returns the matching node if the
    /// key is present; otherwise fills `preds[i]` with the last node before the
    /// key at every level `i < height`.
    fn find(&self, score: u64, key: &[u8], preds: &mut [Option<u32>]) -> Option<u32> {
        let mut prev = None;
        for level in (0..self.height).rev() {
            loop {
                let next = self.forward(prev, level);
                if next == NIL {
                    break;
                }
                match self.compare(score, key, next) {
                    KeyOrdering::Greater => prev = Some(next),
                    KeyOrdering::Equal => return Some(next),
                    KeyOrdering::Less => break,
                }
            }
            preds[level] = prev;
        }
        None
    }

    /// First node whose key is `>= key`, or `NIL`.
    fn lower_bound(&self, score: u64, key: &[u8]) -> u32 {
        let mut prev = None;
        for level in (0..self.height).rev() {
            loop {
                let next = self.forward(prev, level);
                if next == NIL {
                    break;
                }
                match self.compare(score, key, next) {
                    KeyOrdering::Greater => prev = Some(next),
                    KeyOrdering::Equal => return next,
                    KeyOrdering::Less => break,
                }
            }
        }
        self.forward(prev, 0)
    }

    fn get(&self, key: &[u8]) -> Option<u32> {
        let score = calc_score(key);
        let idx = self.lower_bound(score, key);
        (idx != NIL && self.compare(score, key, idx) == KeyOrdering::Equal).then_some(idx)
    }

    /// Geometric level draw: stop with probability 1/2 at each step.
    fn rand_level(&mut self, max_level: usize) -> usize {
        for level in 0..max_level {
            if self.rng.gen::<bool>() {
                return level;
            }
        }
        max_level
    }
}

/// Skip List - Ordered In-Memory Index
///
/// A randomized multi-level linked list mapping byte-string keys to records.
/// It is the sorted write buffer behind the memtable: records go in with
/// [`add`](Self::add), come out with [`search`](Self::search), and are
/// flushed in key order with [`iter`](Self::iter).
///
/// # Key Properties
///
/// - **Ordered**: Every level is strictly ascending by key, so a level-0 walk
///   yields keys in byte-lexicographic order.
/// - **Unique Keys**: Adding a record whose key is already present replaces
///   the stored record; the entry count does not change.
/// - **Append-Only Structure**: Nodes are never unlinked. There is no delete.
/// - **Expected O(log n)**: Node heights follow a geometric distribution with
///   p = 1/2, capped at the configured maximum height (48 by default).
///
/// # Concurrency
///
/// One readers-writer lock covers the whole structure. Lookups and iterators
/// share it; `add` takes it exclusively. Shared acquisitions are recursive, so
/// a thread holding an iterator can still call `search` while a writer waits.
/// Records are handed out as `Arc<R>` and replaced by swapping the `Arc`, so a
/// reader holding a record after the lock is released sees either the old or
/// the new record in full.
///
/// # Example
///
/// ```
/// use kv_primitives::{Entry, SkipList};
///
/// let list = SkipList::new();
/// list.add(Entry::new("b", "2")).unwrap();
/// list.add(Entry::new("a", "1")).unwrap();
///
/// assert_eq!(list.len(), 2);
/// assert_eq!(list.search(b"a").unwrap().value(), b"1");
/// assert!(list.search(b"c").is_none());
///
/// let keys: Vec<_> = list.iter().map(|e| e.key.clone()).collect();
/// assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec()]);
/// ```
pub struct SkipList<R> {
    inner: RwLock<Inner<R>>,
    max_height: usize,
    len: AtomicUsize,
}

impl<R: Record> SkipList<R> {
    /// Creates an empty list with the default height of 48, seeded from OS
    /// entropy.
    pub fn new() -> Self {
        Self::build(DEFAULT_MAX_HEIGHT, StdRng::from_entropy())
    }

    /// Creates an empty list whose level draws are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::build(DEFAULT_MAX_HEIGHT, StdRng::seed_from_u64(seed))
    }

    pub fn from_config(config: &IndexConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self::build(config.max_height, rng))
    }

    fn build(max_height: usize, rng: StdRng) -> Self {
        debug_assert!((1..=MAX_SUPPORTED_HEIGHT).contains(&max_height));
        Self {
            inner: RwLock::new(Inner {
                head: vec![NIL; max_height].into_boxed_slice(),
                nodes: Vec::new(),
                height: 1,
                bytes: 0,
                rng,
            }),
            max_height,
            len: AtomicUsize::new(0),
        }
    }

    /// Inserts `record`, or replaces the stored record with the same key.
    pub fn add(&self, record: R) -> Result<()> {
        let score = calc_score(record.key());
        let new_len = record.encoded_len();

        let mut guard = self.inner.write();
        let inner = &mut *guard;

        let mut preds = [None; MAX_SUPPORTED_HEIGHT];
        if let Some(idx) = inner.find(score, record.key(), &mut preds) {
            let node = &mut inner.nodes[idx as usize];
            let old_len = node.record.encoded_len();
            node.record = Arc::new(record);
            inner.bytes = inner.bytes.saturating_sub(old_len) + new_len;
            tracing::trace!(node = idx, "record replaced");
            return Ok(());
        }

        let idx = u32::try_from(inner.nodes.len())
            .ok()
            .filter(|&idx| idx != NIL)
            .ok_or_else(|| {
                KvError::CapacityOverflow(format!(
                    "skiplist cannot hold more than {} nodes",
                    NIL
                ))
            })?;

        let level = inner.rand_level(self.max_height - 1);
        if level >= inner.height {
            // Levels above the old height have the header as predecessor,
            // which `preds` already holds as `None`.
            inner.height = level + 1;
            tracing::debug!(height = inner.height, "skiplist height grew");
        }

        let mut tower = vec![NIL; level + 1].into_boxed_slice();
        for (l, next) in tower.iter_mut().enumerate() {
            *next = inner.forward(preds[l], l);
        }
        inner.nodes.push(Node {
            tower,
            record: Arc::new(record),
            score,
        });
        for (l, pred) in preds.iter().enumerate().take(level + 1) {
            inner.set_forward(*pred, l, idx);
        }

        inner.bytes += new_len;
        self.len.fetch_add(1, Ordering::Release);
        Ok(())
    }

    /// Returns the record stored under `key`, if any.
    pub fn search(&self, key: &[u8]) -> Option<Arc<R>> {
        let inner = self.inner.read_recursive();
        inner
            .get(key)
            .map(|idx| Arc::clone(&inner.nodes[idx as usize].record))
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.inner.read_recursive().get(key).is_some()
    }

    /// Number of distinct keys present.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Levels currently in use (at least 1).
    pub fn height(&self) -> usize {
        self.inner.read_recursive().height
    }

    pub fn max_height(&self) -> usize {
        self.max_height
    }

    /// Sum of [`Record::encoded_len`] over the current records.
    pub fn approximate_bytes(&self) -> usize {
        self.inner.read_recursive().bytes
    }

    /// Iterates all records in ascending key order.
    ///
    /// The iterator holds the shared lock until it is dropped, so `add` calls
    /// from other threads wait for it. Reads from the iterating thread do not:
    /// every shared-mode call takes the lock recursively and never queues
    /// behind a waiting writer.
    pub fn iter(&self) -> Iter<'_, R> {
        let guard = self.inner.read_recursive();
        let cursor = guard.head[0];
        Iter { guard, cursor }
    }

    /// Iterates records in ascending key order, starting at the first key
    /// that is `>= key`.
    pub fn seek(&self, key: &[u8]) -> Iter<'_, R> {
        let guard = self.inner.read_recursive();
        let cursor = guard.lower_bound(calc_score(key), key);
        Iter { guard, cursor }
    }

    /// Nothing to release; kept so owners can treat the index like the other
    /// closable parts of the engine.
    pub fn close(&self) -> Result<()> {
        tracing::debug!(len = self.len(), "skiplist closed");
        Ok(())
    }
}

impl<R: Record> Default for SkipList<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for SkipList<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkipList")
            .field("len", &self.len.load(Ordering::Acquire))
            .field("max_height", &self.max_height)
            .finish_non_exhaustive()
    }
}

/// In-order iterator over a [`SkipList`], holding its read lock.
pub struct Iter<'a, R> {
    guard: RwLockReadGuard<'a, Inner<R>>,
    cursor: u32,
}

impl<R> Iterator for Iter<'_, R> {
    type Item = Arc<R>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let node = &self.guard.nodes[self.cursor as usize];
        self.cursor = node.tower[0];
        Some(Arc::clone(&node.record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Entry;
    use proptest::prelude::*;
    use std::collections::HashSet;

    impl<R: Record> SkipList<R> {
        /// Walks every level from the header and checks the layering.
        fn check_levels(&self) {
            let inner = self.inner.read();
            let mut below: Option<HashSet<u32>> = None;

            for level in 0..self.max_height {
                if level >= inner.height {
                    assert_eq!(inner.head[level], NIL, "unused level {} is linked", level);
                }

                let mut seen = HashSet::new();
                let mut prev: Option<u32> = None;
                let mut cursor = inner.head[level];
                while cursor != NIL {
                    let node = &inner.nodes[cursor as usize];
                    assert!(
                        node.tower.len() > level,
                        "node {} too short for level {}",
                        cursor,
                        level
                    );
                    assert_eq!(node.score, calc_score(node.record.key()));
                    if let Some(p) = prev {
                        let before = &inner.nodes[p as usize];
                        assert_eq!(
                            inner.compare(before.score, before.record.key(), cursor),
                            KeyOrdering::Less,
                            "level {} out of order",
                            level
                        );
                    }
                    if let Some(lower) = &below {
                        assert!(
                            lower.contains(&cursor),
                            "node {} at level {} missing from the level below",
                            cursor,
                            level
                        );
                    }
                    seen.insert(cursor);
                    prev = Some(cursor);
                    cursor = node.tower[level];
                }

                if level == 0 {
                    assert_eq!(seen.len(), self.len());
                    assert_eq!(seen.len(), inner.nodes.len());
                }
                below = Some(seen);
            }

            for node in inner.nodes.iter() {
                assert!(node.tower.len() <= inner.height);
            }
        }
    }

    fn arb_key() -> impl Strategy<Value = Vec<u8>> {
        prop_oneof![
            prop::collection::vec(any::<u8>(), 0..12),
            prop::collection::vec(any::<u8>(), 0..4).prop_map(|suffix| {
                let mut key = b"sharedpf".to_vec();
                key.extend(suffix);
                key
            }),
        ]
    }

    #[test]
    fn levels_hold_after_sequential_inserts() {
        let list = SkipList::with_seed(11);
        for i in 0..3_000u32 {
            list.add(Entry::new(i.to_be_bytes().to_vec(), "")).unwrap();
        }
        assert!(list.height() > 1);
        list.check_levels();
    }

    #[test]
    fn levels_hold_with_small_max_height() {
        let cfg = IndexConfig {
            max_height: 3,
            seed: Some(5),
        };
        let list = SkipList::from_config(&cfg).unwrap();
        for i in (0..500u32).rev() {
            list.add(i.to_le_bytes().to_vec()).unwrap();
        }
        list.check_levels();
    }

    proptest! {
        #[test]
        fn levels_hold_after_random_adds(
            seed in any::<u64>(),
            keys in prop::collection::vec(arb_key(), 0..300),
        ) {
            let list = SkipList::with_seed(seed);
            for (i, key) in keys.iter().enumerate() {
                let value = (i as u32).to_be_bytes().to_vec();
                list.add(Entry::new(key.clone(), value)).unwrap();
            }
            list.check_levels();
        }
    }
}
