//! CLI Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A CLI error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("configuration could not be loaded")]
    Config,
    #[display("storage under the data directory is unavailable")]
    Storage,
    #[display("state database is unavailable")]
    State,
    #[display("publisher could not be set up")]
    Publisher,
    #[display("could not read input file {}", _0.display())]
    Input(#[error(not(source))] PathBuf),
    #[display("source '{_0}' is not configured")]
    UnknownSource(#[error(not(source))] String),
    #[display("route '{_0}' is not configured")]
    UnknownRoute(#[error(not(source))] String),
    #[display("--external-id applies to a single file")]
    AmbiguousExternalId,
    #[display("transform could not run")]
    Transform,
    /// Some artifacts failed to publish; the rest went through.
    #[display("{_0} artifact(s) could not be published")]
    Incomplete(#[error(not(source))] usize),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage | Self::State | Self::Transform | Self::Incomplete(_))
    }
}
