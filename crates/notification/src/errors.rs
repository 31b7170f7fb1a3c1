//! Error types for the build notifier domain.
//!
//! [`NotifyError`] is what a single notifier invocation returns. Every variant
//! propagates to the caller unchanged; nothing is retried or recovered locally.
//!
//! [`RepoNameError`] and [`PublishError`] are the component-level errors they
//! wrap: the first from parsing the mirrored repository name, the second from
//! whichever [`crate::StatusPublisher`] implementation is wired in.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Component errors
// ---------------------------------------------------------------------------

/// The mirrored repository name does not carry owner and repository slugs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoNameError {
    /// The name has fewer than three `_`-separated segments.
    #[error("repository name '{repo_name}' has {segments} segment(s), expected at least 3")]
    TooFewSegments {
        /// The repository name as received.
        repo_name: String,
        /// Number of segments found.
        segments: usize,
    },

    /// The owner (position 1) or repository (position 2) segment is empty.
    #[error("repository name '{repo_name}' has an empty segment at position {position}")]
    EmptySegment {
        /// The repository name as received.
        repo_name: String,
        /// Zero-based position of the empty segment.
        position: usize,
    },
}

/// Failure to deliver a status update to the hosting service.
///
/// Only transport-level failures appear here. An HTTP response of any status
/// code is a successful publish; see [`crate::PublishReceipt`].
#[derive(Debug, Error)]
pub enum PublishError {
    /// The request could not be built or sent, or no response was received
    /// (DNS failure, connection refused, TLS error, connection reset).
    #[error("status request to '{endpoint}' failed: {message}")]
    Transport {
        /// Endpoint the request was addressed to.
        endpoint: String,
        /// Transport error description.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Invocation errors
// ---------------------------------------------------------------------------

/// Errors returned by a single notifier invocation.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The event payload is not a JSON build result.
    #[error("failed to decode build result: {0}")]
    Decode(#[source] serde_json::Error),

    /// The build's repository name does not identify a Bitbucket repository.
    #[error(transparent)]
    RepoName(#[from] RepoNameError),

    /// The status update could not be serialised.
    #[error("failed to encode status update: {0}")]
    Encode(#[source] serde_json::Error),

    /// The status update could not be delivered.
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// The hosting service answered with a non-success status code.
    ///
    /// Only produced under [`crate::ErrorStatusPolicy::Fail`].
    #[error("status API rejected the update with HTTP {status}")]
    Rejected {
        /// HTTP status code returned by the status API.
        status: u16,
    },
}

impl NotifyError {
    /// Returns `true` if the error was caused by the inbound event itself
    /// rather than by the downstream service.
    ///
    /// Redelivering such an event can never succeed.
    pub fn is_bad_event(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::RepoName(_))
    }
}
