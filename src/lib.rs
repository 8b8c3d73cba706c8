//! # kv-primitives
//!
//! In-memory building blocks for a log-structured key-value engine:
//!
//! - [`SkipList`]: a concurrent, ordered, probabilistically balanced index
//!   backing the memtable.
//! - [`CmSketch`]: a 4-bit count-min frequency sketch driving cache
//!   admission and eviction (behind the default `probabilistic` feature).
//!
//! The two are independent; an engine wires the index into its write path
//! and the sketch into its cache.

pub mod config;
pub mod entry;
#[cfg(feature = "probabilistic")]
pub mod probabilistic;
pub mod skiplist;
pub mod traits;

// Re-export core traits
pub use traits::{KvError, Record, Result};

pub use config::{IndexConfig, SketchConfig};
pub use entry::Entry;
#[cfg(feature = "probabilistic")]
pub use probabilistic::CmSketch;
pub use skiplist::SkipList;
