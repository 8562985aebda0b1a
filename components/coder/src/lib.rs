// Copyright 2022 TiKV Project Authors. Licensed under Apache-2.0.

//! Binary encoding for composite, revision-carrying keys.
//!
//! A raw key is the lexicographically-comparable form handed to the
//! underlying store:
//!
//! ```text
//! raw key = lead-in(4) ++ path ++ [ separator(1) ++ revision(8, big endian) ]
//! ```
//!
//! An index key carries no suffix; a revisioned key addresses one historical
//! version of a path. Revision 0 is reserved: `path ++ '$' ++ 0x00^8` is a
//! range sentinel that bounds prefix scans and never decodes as a logical
//! key. The separator sorts below `/`, so one path's revisions sit between
//! its index key and any child path.
//!
//! Coder values are stateless and shared freely across scan workers. One
//! coder variant exists per on-disk encoding epoch; the variant is selected
//! once at engine startup and never switched at runtime.

mod error;
mod normal;

pub use self::error::{Error, Result};
pub use self::normal::{NormalCoder, PREFIX_LEN, REVISION_LEN, SEPARATOR};

/// A domain-level key before binary encoding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogicalKey {
    /// Maps a path to metadata about its current state. No revision suffix.
    Index { path: Vec<u8> },
    /// Addresses one historical version of a path. Revisions start at 1.
    Revisioned { path: Vec<u8>, revision: u64 },
}

impl LogicalKey {
    pub fn index(path: impl Into<Vec<u8>>) -> LogicalKey {
        LogicalKey::Index { path: path.into() }
    }

    pub fn revisioned(path: impl Into<Vec<u8>>, revision: u64) -> LogicalKey {
        LogicalKey::Revisioned {
            path: path.into(),
            revision,
        }
    }

    pub fn path(&self) -> &[u8] {
        match self {
            LogicalKey::Index { path } => path,
            LogicalKey::Revisioned { path, .. } => path,
        }
    }

    pub fn revision(&self) -> Option<u64> {
        match self {
            LogicalKey::Index { .. } => None,
            LogicalKey::Revisioned { revision, .. } => Some(*revision),
        }
    }
}

/// Direction used when repairing a cut point that is not boundary safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Round {
    /// Toward the owning group's floor. The canonical choice for internal
    /// partition borders: rounding every border the same way yields one
    /// stable position per border.
    Down,
    /// Just past the owning group.
    Up,
}

/// Capability interface shared by all encoding epochs.
pub trait Coder: Send + Sync {
    /// Encodes a logical key. Deterministic and injective.
    fn encode(&self, key: &LogicalKey) -> Result<Vec<u8>>;

    /// Inverse of `encode`. Fails on malformed input and on range
    /// sentinels, which carry no logical key.
    fn decode(&self, raw: &[u8]) -> Result<LogicalKey>;

    /// Whether `raw` is a structurally valid cut point: a complete
    /// bare-path key, or a recognized range sentinel. A cut inside a
    /// path's revision run is never safe.
    fn is_boundary_safe(&self, raw: &[u8]) -> bool;

    /// Whether `raw` has the floor-sentinel form `path ++ '$' ++ 0x00^8`.
    fn is_range_sentinel(&self, raw: &[u8]) -> bool;

    /// The lexicographically-next byte sequence after everything sharing
    /// `prefix`: increment the last non-0xff byte and drop trailing 0xff
    /// bytes. Fails with `Error::PrefixOverflow` when no greater sequence
    /// exists; the caller must fall back to an unbounded upper bound.
    fn next_prefix_sentinel(&self, prefix: &[u8]) -> Result<Vec<u8>>;

    /// Identity on boundary-safe input, otherwise the nearest canonical
    /// safe cut in the given direction. Idempotent.
    fn adjust_to_safe_boundary(&self, raw: &[u8], round: Round) -> Result<Vec<u8>>;

    /// Inclusive lower bound for scanning everything under `path`.
    fn encode_range_start(&self, path: &[u8]) -> Result<Vec<u8>>;

    /// Exclusive upper bound matching `encode_range_start`.
    fn encode_range_end(&self, path: &[u8]) -> Result<Vec<u8>>;
}

/// On-disk encoding epochs. A closed set: adding an epoch means adding a
/// coder variant, never changing an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Epoch {
    Normal,
}

static NORMAL_CODER: NormalCoder = NormalCoder::new();

/// Returns the coder for `epoch`. Selected once at engine startup and held
/// for the process lifetime.
pub fn select(epoch: Epoch) -> &'static dyn Coder {
    match epoch {
        Epoch::Normal => &NORMAL_CODER,
    }
}
