//! Publisher Error Types
//!
//! Transport failures for a single delivery. The publish pipeline folds these
//! into the destination's outcome; they never abort the other destinations.

use derive_more::{Display, Error};

/// A publisher error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for publisher operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The HTTP client for a token could not be created.
    #[display("publisher client could not be created")]
    Client,
    /// The request never got a response (connection, TLS, timeout).
    #[display("destination unreachable")]
    Transport,
    /// The destination answered and said no.
    #[display("destination rejected the delivery ({status}): {description}")]
    Rejected {
        status: u16,
        #[error(not(source))]
        description: String,
    },
    /// The destination answered with something that isn't a valid reply.
    #[display("unexpected response from destination")]
    InvalidResponse,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport | Self::InvalidResponse => true,
            // Telegram signals flood control and server trouble in-band.
            Self::Rejected { status, .. } => *status == 429 || *status >= 500,
            Self::Client => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(400, false)]
    #[case(403, false)]
    #[case(429, true)]
    #[case(502, true)]
    fn test_rejection_retryable(#[case] status: u16, #[case] retryable: bool) {
        let kind = ErrorKind::Rejected { status, description: "nope".to_string() };
        assert_eq!(kind.is_retryable(), retryable);
    }
}
