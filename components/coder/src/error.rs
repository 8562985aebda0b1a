// Copyright 2022 TiKV Project Authors. Licensed under Apache-2.0.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("path embeds reserved separator byte at offset {0}")]
    AmbiguousPath(usize),
    #[error("empty path")]
    EmptyPath,
    #[error("revision 0 is reserved for range sentinels")]
    ReservedRevision,
    #[error("bad format key(prefix)")]
    KeyPrefix,
    #[error("bad format key(length)")]
    KeyLength,
    #[error("bad format key(separator)")]
    KeySeparator,
    #[error("key is a range sentinel, not a logical key")]
    Sentinel,
    #[error("prefix has no successor, all bytes are 0xff")]
    PrefixOverflow,
}

pub type Result<T> = std::result::Result<T, Error>;
