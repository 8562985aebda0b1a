// Copyright 2022 TiKV Project Authors. Licensed under Apache-2.0.

//! Splits a key range into disjoint partitions that independent workers
//! can scan concurrently.
//!
//! An external estimator proposes raw split points with no structural
//! guarantees; the scanner repairs them against the key encoding so that
//! no partition border falls inside one logical record's encoding and no
//! degenerate `[start, start)` range survives. Borders that collapse under
//! repair are merged into a neighbor rather than clamped: an empty
//! partition handed to a worker is at best useless work and at worst a
//! whole-keyspace scan under some iteration conventions.

#[macro_use]
extern crate log;

mod cursor;
mod errors;

pub use self::cursor::ScanCursor;
pub use self::errors::{Error, Result};

use coder::{Coder, Round};
use storage::{Iterable, Partition, SplitEstimator};

/// Plans partitions and opens partition-bounded scans. Carries no mutable
/// state; one scanner is shared by all scan requests.
pub struct Scanner<C> {
    coder: C,
}

impl<C: Coder> Scanner<C> {
    pub fn new(coder: C) -> Scanner<C> {
        Scanner { coder }
    }

    pub fn coder(&self) -> &C {
        &self.coder
    }

    /// Covers `[start, end)` with at most `desired` safe partitions.
    ///
    /// Asks `estimator` for approximate split keys, then adjusts them into
    /// a contiguous, gap-free, overlap-free list with no degenerate
    /// member. A range too narrow to split that many ways yields fewer
    /// partitions, never padded ones.
    pub fn plan<E: SplitEstimator>(
        &self,
        estimator: &E,
        start: &[u8],
        end: &[u8],
        desired: usize,
    ) -> Result<Vec<Partition>> {
        if start >= end {
            return Err(Error::InvalidRange(start.to_vec(), end.to_vec()));
        }
        let desired = desired.max(1);
        if desired == 1 {
            return Ok(vec![Partition::new(start, end)]);
        }

        let mut split_keys = estimator.approximate_split_keys(start, end, desired - 1)?;
        split_keys.sort_unstable();
        split_keys.dedup();
        split_keys.retain(|k| k.as_slice() > start && k.as_slice() < end);
        split_keys.truncate(desired - 1);

        let mut partitions = Vec::with_capacity(split_keys.len() + 1);
        let mut prev = start.to_vec();
        for key in split_keys {
            partitions.push(Partition::new(prev, key.clone()));
            prev = key;
        }
        partitions.push(Partition::new(prev, end));
        Ok(self.adjust_partitions_borders(partitions))
    }

    /// Opens a scan over exactly `[partition.start, partition.end)`.
    pub fn open<S: Iterable>(
        &self,
        store: &S,
        partition: &Partition,
    ) -> Result<ScanCursor<S::Iterator>> {
        if partition.start() >= partition.end() {
            return Err(Error::InvalidRange(
                partition.start().to_vec(),
                partition.end().to_vec(),
            ));
        }
        let iter = store.iterator(partition.start(), partition.end())?;
        Ok(ScanCursor::new(iter))
    }

    /// Repairs the internal borders of a contiguous candidate partition
    /// list.
    ///
    /// Every shared border is rounded down to the nearest structurally
    /// valid cut; rounding each border the same way gives it a single
    /// canonical position and cannot oscillate. A border whose adjusted
    /// value fails to advance strictly past the running partition start
    /// (or reaches the outer end) is dropped, merging the collapsed
    /// partition into its neighbor, transitively if needed. The outermost
    /// bounds are caller-supplied and never touched; they may legitimately
    /// be range sentinels rather than real keys.
    fn adjust_partitions_borders(&self, partitions: Vec<Partition>) -> Vec<Partition> {
        if partitions.len() <= 1 {
            return partitions;
        }
        let hi = partitions.last().unwrap().end().to_vec();
        let mut adjusted = Vec::with_capacity(partitions.len());
        let mut start = partitions[0].start().to_vec();
        for p in &partitions[1..] {
            let border = p.start();
            let safe = match self.coder.adjust_to_safe_boundary(border, Round::Down) {
                Ok(safe) => safe,
                Err(e) => {
                    warn!("dropping unadjustable partition border {:?}: {}", border, e);
                    continue;
                }
            };
            if safe.as_slice() <= start.as_slice() || safe.as_slice() >= hi.as_slice() {
                // Collapsed to an empty range; merge with the neighbor.
                // Expected, normal behavior under skewed key
                // distributions, not a failure.
                debug!("merging collapsed partition at border {:?}", border);
                continue;
            }
            adjusted.push(Partition::new(start.clone(), safe.clone()));
            start = safe;
        }
        adjusted.push(Partition::new(start, hi));
        adjusted
    }
}
