// Copyright 2022 TiKV Project Authors. Licensed under Apache-2.0.

use super::Result;

/// A lazy, forward-only scan over one partition. Entries come back in
/// strict lexicographic key order. Not thread-safe; independent cursors
/// over independent or overlapping partitions may run concurrently.
/// Dropping the cursor releases the underlying iterator.
pub struct ScanCursor<I> {
    iter: I,
}

impl<I: storage::Iterator> ScanCursor<I> {
    pub(crate) fn new(iter: I) -> ScanCursor<I> {
        ScanCursor { iter }
    }

    /// Returns the next key/value pair, or `None` once the partition is
    /// exhausted. Storage errors pass through unchanged.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        if !self.iter.valid()? {
            return Ok(None);
        }
        let pair = (self.iter.key().to_vec(), self.iter.value().to_vec());
        self.iter.next()?;
        Ok(Some(pair))
    }

    /// Repositions at the partition start.
    pub fn restart(&mut self) -> Result<()> {
        self.iter.seek_to_start()?;
        Ok(())
    }
}
