//! Format Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A format error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for format operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Neither the filename nor the content matched a registered handler.
    #[display("unrecognized format: {_0}")]
    UnknownFormat(#[error(not(source))] String),
    /// No handler is registered under this format id.
    #[display("no handler registered for format '{_0}'")]
    UnregisteredFormat(#[error(not(source))] String),
    /// A handler with this id was already registered.
    #[display("format '{_0}' registered twice")]
    DuplicateFormat(#[error(not(source))] String),
    /// The payload claims to be of a format but does not parse as one.
    #[display("malformed {format} payload: {reason}")]
    Malformed { format: &'static str, reason: String },
    /// The payload parsed, but contained nothing to extract.
    #[display("no {_0} records found in payload")]
    NoRecords(#[error(not(source))] &'static str),
    /// Records could not be combined into an artifact.
    #[display("could not assemble {_0} artifact")]
    Assembly(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Parsing is deterministic: the same bytes fail the same way.
        false
    }
}
