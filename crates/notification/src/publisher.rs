//! Port for delivering status updates to the hosting service.

use async_trait::async_trait;

use crate::errors::PublishError;

/// A serialised status update addressed to a status-API endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRequest {
    /// Absolute URL of the commit's build-status resource.
    pub endpoint: String,
    /// JSON-encoded [`crate::StatusUpdate`].
    pub body: Vec<u8>,
}

/// Outcome of a delivered status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishReceipt {
    /// HTTP status code returned by the status API.
    pub status: u16,
}

impl PublishReceipt {
    /// Returns `true` for a 2xx status code.
    pub fn is_success(self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one status update and reports the response status code.
///
/// Implementations send exactly one request per call and never retry. Any
/// HTTP response, whatever its status code, is `Ok`; only transport failures
/// are errors. The response body is discarded.
#[async_trait]
pub trait StatusPublisher: Send + Sync {
    async fn publish(&self, request: StatusRequest) -> Result<PublishReceipt, PublishError>;
}
