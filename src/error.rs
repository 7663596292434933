use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("malformed index range {0:?}")]
    MalformedRange(String),
    #[error("malformed subset header {0:?}")]
    MalformedHeader(String),
    #[error("subset stream ended after {found} of {expected} flags")]
    TruncatedStream { expected: usize, found: usize },
    #[error("invalid subset flag {flag:?} for index {index}")]
    InvalidFlag { index: usize, flag: char },
    #[error("index {index} is outside the universe 1..={size}")]
    IndexOutOfUniverse { index: usize, size: usize },
    #[error("range {range} is outside the universe 1..={size}")]
    RangeOutOfUniverse { range: String, size: usize },
    #[error("requested {requested} indices but only {available} are available")]
    SampleTooLarge { requested: usize, available: usize },
    #[error("subset universe must not be empty")]
    EmptyUniverse,
    #[error("subset universe of {size} does not fit the stream header")]
    UniverseTooLarge { size: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
