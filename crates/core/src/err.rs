//! Error types and utilities.

use crate::format::Dialect;

#[derive(thiserror::Error, Debug)]
/// Represents an error that can occur while generating or writing a dataset.
pub enum Error {
    /// An I/O error occurred.
    #[error("i/o error {0}")]
    Io(#[from] std::io::Error),

    /// A finished temporary file could not be moved onto its destination.
    #[error("could not persist output: {0}")]
    Persist(#[from] tempfile::PersistError),

    /// A caller-supplied parameter is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Unique address sampling could not reach the requested size.
    #[error("could not sample {requested} unique addresses (stalled at {collected})")]
    PoolExhausted { requested: usize, collected: usize },

    /// A weighted catalog was built from unusable weights.
    #[error("weighted catalog error {0}")]
    Catalog(#[from] rand::distr::weighted::Error),

    #[error("timestamp formatting failed: {0}")]
    TimestampFormat(#[from] time::error::Format),

    #[error("timestamp parsing failed: {0}")]
    TimestampParse(#[from] time::error::Parse),

    #[error("invalid line pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A line did not match the expected log dialect.
    #[error("line is not valid {dialect}: {line:?}")]
    Malformed { dialect: Dialect, line: String },
}

/// A specialized [Result] type for this crate's operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
