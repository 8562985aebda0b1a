// Copyright 2022 TiKV Project Authors. Licensed under Apache-2.0.

use std::{error, io, result};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Engines use plain strings as their error type.
    #[error("storage engine {0}")]
    Engine(String),
    #[error("io {0}")]
    Io(#[from] io::Error),
    #[error("{0:?}")]
    Other(#[from] Box<dyn error::Error + Sync + Send>),
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Engine(err)
    }
}

pub type Result<T> = result::Result<T, Error>;
