use thiserror::Error;

/// Errors from a single chain read.
///
/// These are absorbed at the store boundary: a failed field is recorded as
/// missing and never retried, so callers of the store never observe them.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("call timed out")]
    Timeout,

    #[error("contract reverted: {0}")]
    Revert(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Errors while parsing an address string.
#[derive(Debug, Error)]
pub enum AddressError {
    #[error("missing 0x prefix")]
    MissingPrefix,

    #[error("expected 40 hex characters, got {0}")]
    BadLength(usize),

    #[error("invalid hex digit")]
    BadHex,
}

/// Errors while loading a seed table.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("parse error: {0}")]
    Parse(String),
}
