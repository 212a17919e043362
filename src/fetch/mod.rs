//! Fetch outcome model shared by the client, poller, and view layers.
//!
//! Every network round-trip in emon normalizes to a [`FetchOutcome`]: either
//! the decoded payload or a categorized failure, each stamped with the time
//! the round-trip completed. Failures are data, not `Err` — the layers above
//! (poller, view model) route them without ever propagating an error across
//! their own boundaries.

use std::fmt;

use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Category of a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection refused, DNS failure, timeout — the request never got a
    /// usable HTTP response.
    Network,
    /// The backend answered with a non-2xx status code.
    Server(u16),
    /// The response body could not be decoded as the expected JSON shape.
    Parse,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network error"),
            Self::Server(status) => write!(f, "server error (HTTP {status})"),
            Self::Parse => write!(f, "parse error"),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of one completed fetch: payload or categorized failure, never both.
#[derive(Debug, Clone)]
pub enum FetchOutcome<T> {
    Success {
        data: T,
        at: DateTime<Utc>,
    },
    Failure {
        kind: ErrorKind,
        message: String,
        at: DateTime<Utc>,
    },
}

impl<T> FetchOutcome<T> {
    /// Wrap a decoded payload, stamped with the current time.
    pub fn success(data: T) -> Self {
        Self::Success {
            data,
            at: Utc::now(),
        }
    }

    /// Wrap a failure, stamped with the current time.
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            message: message.into(),
            at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Completion timestamp, regardless of outcome.
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Self::Success { at, .. } | Self::Failure { at, .. } => *at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_is_tagged_union() {
        let ok: FetchOutcome<u32> = FetchOutcome::success(7);
        assert!(ok.is_success());
        assert!(ok.at() <= Utc::now());

        let bad: FetchOutcome<u32> = FetchOutcome::failure(ErrorKind::Parse, "bad body");
        assert!(!bad.is_success());
        match bad {
            FetchOutcome::Failure { kind, message, .. } => {
                assert_eq!(kind, ErrorKind::Parse);
                assert_eq!(message, "bad body");
            }
            FetchOutcome::Success { .. } => unreachable!(),
        }
    }

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::Network.to_string(), "network error");
        assert_eq!(ErrorKind::Server(503).to_string(), "server error (HTTP 503)");
        assert_eq!(ErrorKind::Parse.to_string(), "parse error");
    }
}
