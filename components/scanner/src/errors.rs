// Copyright 2022 TiKV Project Authors. Licensed under Apache-2.0.

use std::result;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Caller logic error; never retried.
    #[error("invalid scan range [{0:?}, {1:?})")]
    InvalidRange(Vec<u8>, Vec<u8>),
    #[error("coder {0}")]
    Coder(#[from] coder::Error),
    // Collaborator failures pass through; retry policy is the caller's.
    #[error("storage {0}")]
    Storage(#[from] storage::Error),
}

pub type Result<T> = result::Result<T, Error>;
