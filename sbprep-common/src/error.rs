//! Common error types for sbprep

use thiserror::Error;

/// Common result type for sbprep operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the sbprep crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Category/variant pair (or name) not present in the range table
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Operator-supplied interval is not usable as a prefix range
    #[error("Malformed interval: {0}")]
    MalformedInterval(String),
}
