// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use thiserror::Error;

/// Error type for index and sketch operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KvError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Capacity overflow: {0}")]
    CapacityOverflow(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, KvError>;

/// A value that can be stored in the ordered index.
///
/// The index only ever looks at the key bytes; everything else about the
/// record is opaque to it. Keys are compared lexicographically, byte by byte.
///
/// # Requirements
///
/// - `key()` must return the same bytes for the lifetime of the record.
/// - Two records with equal keys are the same logical entry: adding the
///   second one replaces the first.
pub trait Record {
    /// The ordering key of this record.
    fn key(&self) -> &[u8];

    /// Approximate in-memory footprint of the record in bytes.
    ///
    /// Used by [`crate::SkipList::approximate_bytes`] so a write path can
    /// decide when the memtable is full. Defaults to the key length.
    fn encoded_len(&self) -> usize {
        self.key().len()
    }
}

impl Record for Vec<u8> {
    fn key(&self) -> &[u8] {
        self
    }
}
