// Copyright 2022 TiKV Project Authors. Licensed under Apache-2.0.

//! Partition descriptors and the traits the scanner's collaborators
//! implement: range iteration over the underlying byte store, and
//! approximate split-point estimation.
//!
//! A `Partition` is an immutable half-open byte range `[start, end)`.
//! Partitions are produced per scan request and shared by reference across
//! worker boundaries; any further sub-splitting produces new values.

mod errors;
pub mod mem;

pub use self::errors::{Error, Result};

/// A half-open raw-key range `[start, end)` assigned to one scan worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    start: Vec<u8>,
    end: Vec<u8>,
}

impl Partition {
    pub fn new(start: impl Into<Vec<u8>>, end: impl Into<Vec<u8>>) -> Partition {
        Partition {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn start(&self) -> &[u8] {
        &self.start
    }

    pub fn end(&self) -> &[u8] {
        &self.end
    }

    /// A degenerate partition covers nothing and must never be handed to
    /// a scan worker.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.start.as_slice() <= key && key < self.end.as_slice()
    }

    pub fn into_parts(self) -> (Vec<u8>, Vec<u8>) {
        (self.start, self.end)
    }
}

/// Proposes raw, approximate split points for a key range, e.g. by size
/// estimation or sampling. Output carries no boundary-safety, ordering, or
/// non-degeneracy guarantee; the scanner repairs it.
pub trait SplitEstimator {
    /// Returns at most `key_count` candidate split keys for `[start, end)`.
    fn approximate_split_keys(
        &self,
        start: &[u8],
        end: &[u8],
        key_count: usize,
    ) -> Result<Vec<Vec<u8>>>;
}

/// A store that can open forward iterators over half-open key ranges.
pub trait Iterable {
    type Iterator: Iterator;

    /// Opens an iterator over exactly `[start, end)`, positioned at the
    /// first key in range.
    fn iterator(&self, start: &[u8], end: &[u8]) -> Result<Self::Iterator>;
}

/// Forward-only iteration over raw key/value pairs in lexicographic key
/// order. `key`/`value` may only be called while `valid` holds.
pub trait Iterator {
    /// Repositions at the first key of the range. Returns whether the
    /// iterator is valid afterwards.
    fn seek_to_start(&mut self) -> Result<bool>;

    /// Advances one entry. Returns whether the iterator is still valid.
    fn next(&mut self) -> Result<bool>;

    fn valid(&self) -> Result<bool>;

    fn key(&self) -> &[u8];

    fn value(&self) -> &[u8];
}
