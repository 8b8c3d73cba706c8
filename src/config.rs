// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

//! Settings for the index and the frequency sketch.
//!
//! Both structs deserialize with every field optional, so a host engine can
//! embed them in its own configuration file and only override what it needs.
//!
//! ```
//! use kv_primitives::config::IndexConfig;
//!
//! let cfg: IndexConfig = serde_json::from_str(r#"{"seed": 7}"#).unwrap();
//! assert_eq!(cfg.max_height, 48);
//! assert_eq!(cfg.seed, Some(7));
//! cfg.validate().unwrap();
//! ```

use crate::traits::{KvError, Result};
use serde::{Deserialize, Serialize};

/// Default number of levels in the skip list header.
pub const DEFAULT_MAX_HEIGHT: usize = 48;

/// Upper bound accepted for a configured skip list height.
pub const MAX_SUPPORTED_HEIGHT: usize = 64;

/// Default number of counters per sketch row.
pub const DEFAULT_SKETCH_COUNTERS: u64 = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Maximum tower height, header included.
    pub max_height: usize,
    /// Fixed seed for level draws. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_height: DEFAULT_MAX_HEIGHT,
            seed: None,
        }
    }
}

impl IndexConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_height == 0 || self.max_height > MAX_SUPPORTED_HEIGHT {
            return Err(KvError::InvalidConfig(format!(
                "max_height must be in 1..={}, got {}",
                MAX_SUPPORTED_HEIGHT, self.max_height
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SketchConfig {
    /// Requested counters per row; rounded up to a power of two.
    pub counters: u64,
    /// Fixed seed for the row salts. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self {
            counters: DEFAULT_SKETCH_COUNTERS,
            seed: None,
        }
    }
}

impl SketchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.counters == 0 {
            return Err(KvError::InvalidConfig(
                "counters must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
