// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

//! Probabilistic Data Structures (Sketches)
//!
//! Approximate frequency tracking in fixed memory, used by a cache to decide
//! which keys are worth admitting and which are safe to evict.

pub mod cm_sketch;

pub use cm_sketch::{hash_key, next_power_of_two, CmRow, CmSketch, MAX_COUNT, SKETCH_DEPTH};
