//! Pipeline Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Per-file and per-destination failures are not errors
//! at this level: they are recorded in the batch reports. These kinds cover
//! what stops a whole batch or a whole artifact.

use derive_more::{Display, Error};

/// A pipeline error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Reading or writing processing state via [`mergebot_state::Repository`] failed.
    #[display("processing state unavailable")]
    State,
    /// A route asks for a format no handler is registered for.
    #[display("no handler for format '{_0}'")]
    Format(#[error(not(source))] String),
    /// The format handler could not combine the records into one artifact.
    #[display("could not assemble {_0} artifact")]
    Assembly(#[error(not(source))] String),
    /// The artifact could not be archived, so it was not delivered anywhere.
    #[display("could not archive artifact {_0}")]
    Archive(#[error(not(source))] String),
    /// A caption template doesn't compile or names an unknown placeholder.
    #[display("invalid caption template: {_0}")]
    Caption(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::State | Self::Archive(_))
    }
}
