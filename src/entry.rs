// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::traits::Record;
use serde::{Deserialize, Serialize};

/// A key/value pair as buffered by the memtable.
///
/// # Example
///
/// ```
/// use kv_primitives::{Entry, Record};
///
/// let entry = Entry::new("user:1001", "alice");
/// assert_eq!(entry.key(), b"user:1001");
/// assert_eq!(entry.encoded_len(), 14);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Entry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl Entry {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }
}

impl Record for Entry {
    fn key(&self) -> &[u8] {
        &self.key
    }

    fn encoded_len(&self) -> usize {
        self.key.len() + self.value.len()
    }
}
