// Copyright 2022 TiKV Project Authors. Licensed under Apache-2.0.

//! A skiplist-backed store used by scanner tests and tools. Implements
//! both collaborator traits: range iteration and split-point estimation
//! by evenly-spaced key sampling.

use std::ops::Bound::{Excluded, Included};
use std::sync::Arc;

use crossbeam_skiplist::SkipMap;

use super::{Error, Iterable, Iterator, Result, SplitEstimator};

#[derive(Clone)]
pub struct MemStore {
    map: Arc<SkipMap<Vec<u8>, Vec<u8>>>,
}

impl Default for MemStore {
    fn default() -> MemStore {
        MemStore::new()
    }
}

impl MemStore {
    pub fn new() -> MemStore {
        MemStore {
            map: Arc::new(SkipMap::new()),
        }
    }

    pub fn put(&self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.map.insert(key.into(), value.into());
    }

    pub fn delete(&self, key: &[u8]) {
        self.map.remove(key);
    }

    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.map.get(key).map(|e| e.value().clone())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn range_keys(&self, start: &[u8], end: &[u8]) -> Vec<Vec<u8>> {
        if start >= end {
            return vec![];
        }
        self.map
            .range::<[u8], _>((Included(start), Excluded(end)))
            .map(|e| e.key().clone())
            .collect()
    }
}

impl Iterable for MemStore {
    type Iterator = MemIterator;

    fn iterator(&self, start: &[u8], end: &[u8]) -> Result<MemIterator> {
        if start > end {
            return Err(Error::Engine(format!(
                "inverted iterator range {:?} > {:?}",
                start, end
            )));
        }
        // Snapshot the range up front; live writes must not move a
        // cursor that is already open.
        let entries = if start == end {
            vec![]
        } else {
            self.map
                .range::<[u8], _>((Included(start), Excluded(end)))
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect()
        };
        Ok(MemIterator { entries, pos: 0 })
    }
}

impl SplitEstimator for MemStore {
    fn approximate_split_keys(
        &self,
        start: &[u8],
        end: &[u8],
        key_count: usize,
    ) -> Result<Vec<Vec<u8>>> {
        if key_count == 0 {
            return Ok(vec![]);
        }
        let keys = self.range_keys(start, end);
        if keys.len() <= 1 {
            return Ok(vec![]);
        }
        let mut split_keys = Vec::with_capacity(key_count);
        for i in 1..=key_count {
            let idx = i * keys.len() / (key_count + 1);
            if idx == 0 || idx >= keys.len() {
                continue;
            }
            split_keys.push(keys[idx].clone());
        }
        split_keys.dedup();
        Ok(split_keys)
    }
}

pub struct MemIterator {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    pos: usize,
}

impl Iterator for MemIterator {
    fn seek_to_start(&mut self) -> Result<bool> {
        self.pos = 0;
        Ok(!self.entries.is_empty())
    }

    fn next(&mut self) -> Result<bool> {
        if self.pos < self.entries.len() {
            self.pos += 1;
        }
        Ok(self.pos < self.entries.len())
    }

    fn valid(&self) -> Result<bool> {
        Ok(self.pos < self.entries.len())
    }

    fn key(&self) -> &[u8] {
        &self.entries[self.pos].0
    }

    fn value(&self) -> &[u8] {
        &self.entries[self.pos].1
    }
}
