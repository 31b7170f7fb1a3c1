//! The notifier function: build-result event in, one commit-status POST out.

use std::sync::Arc;

use tracing::{field, info, warn, Span};

use crate::errors::NotifyError;
use crate::event::PubSubMessage;
use crate::publisher::{PublishReceipt, StatusPublisher, StatusRequest};
use crate::repository::RepoCoordinates;
use crate::status::{status_endpoint, StatusUpdate, DEFAULT_API_BASE};

/// How a non-2xx response from the status API is reported to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorStatusPolicy {
    /// Log the status code and report success.
    #[default]
    Ignore,
    /// Report [`NotifyError::Rejected`].
    Fail,
}

/// Translates build-result events into Bitbucket commit-status updates.
///
/// Holds no per-event state; one instance serves any number of concurrent
/// invocations.
pub struct Notifier {
    publisher: Arc<dyn StatusPublisher>,
    api_base: String,
    error_status_policy: ErrorStatusPolicy,
}

impl Notifier {
    /// Creates a notifier that posts to the production Bitbucket API and
    /// ignores non-2xx responses.
    pub fn new(publisher: Arc<dyn StatusPublisher>) -> Self {
        Self {
            publisher,
            api_base: DEFAULT_API_BASE.to_string(),
            error_status_policy: ErrorStatusPolicy::default(),
        }
    }

    /// Overrides the status API base URL.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Sets how non-2xx responses are reported.
    #[must_use]
    pub fn with_error_status_policy(mut self, policy: ErrorStatusPolicy) -> Self {
        self.error_status_policy = policy;
        self
    }

    /// Status API base URL requests are addressed to.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Policy applied to non-2xx responses.
    pub fn error_status_policy(&self) -> ErrorStatusPolicy {
        self.error_status_policy
    }

    /// Derives the status request for an event without sending it.
    ///
    /// # Errors
    ///
    /// [`NotifyError::Decode`], [`NotifyError::RepoName`], or
    /// [`NotifyError::Encode`]. No request is produced in any of these cases.
    pub fn prepare(&self, message: &PubSubMessage) -> Result<StatusRequest, NotifyError> {
        let build = message.build_result()?;
        let span = Span::current();
        span.record("build_id", build.id.as_str());
        span.record("build_status", build.status.as_str());

        let coords = RepoCoordinates::parse(&build.source.repo_source.repo_name)?;
        let update = StatusUpdate::from(&build);
        let body = serde_json::to_vec(&update).map_err(NotifyError::Encode)?;

        Ok(StatusRequest {
            endpoint: status_endpoint(
                &self.api_base,
                &coords,
                &build.source_provenance.resolved_repo_source.commit_sha,
            ),
            body,
        })
    }

    /// Handles one event: derives the status update and posts it once.
    ///
    /// # Errors
    ///
    /// Any error from [`Self::prepare`], [`NotifyError::Publish`] on transport
    /// failure, and [`NotifyError::Rejected`] on a non-2xx response when the
    /// policy is [`ErrorStatusPolicy::Fail`].
    #[tracing::instrument(
        name = "notify",
        skip_all,
        fields(build_id = field::Empty, build_status = field::Empty, message_id = ?message.message_id)
    )]
    pub async fn notify(&self, message: &PubSubMessage) -> Result<PublishReceipt, NotifyError> {
        let request = self.prepare(message)?;
        let endpoint = request.endpoint.clone();

        let receipt = self.publisher.publish(request).await?;
        if receipt.is_success() {
            info!(%endpoint, status = receipt.status, "Published commit status");
            return Ok(receipt);
        }

        warn!(%endpoint, status = receipt.status, "Status API returned a non-success status");
        match self.error_status_policy {
            ErrorStatusPolicy::Ignore => Ok(receipt),
            ErrorStatusPolicy::Fail => Err(NotifyError::Rejected {
                status: receipt.status,
            }),
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("api_base", &self.api_base)
            .field("error_status_policy", &self.error_status_policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::errors::PublishError;

    /// Records every request and answers with a fixed outcome.
    struct RecordingPublisher {
        requests: Mutex<Vec<StatusRequest>>,
        status: Option<u16>,
    }

    impl RecordingPublisher {
        fn answering(status: u16) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                status: Some(status),
            })
        }

        fn unreachable() -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                status: None,
            })
        }

        fn requests(&self) -> Vec<StatusRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StatusPublisher for RecordingPublisher {
        async fn publish(&self, request: StatusRequest) -> Result<PublishReceipt, PublishError> {
            let endpoint = request.endpoint.clone();
            self.requests.lock().unwrap().push(request);
            match self.status {
                Some(status) => Ok(PublishReceipt { status }),
                None => Err(PublishError::Transport {
                    endpoint,
                    message: "connection refused".to_string(),
                }),
            }
        }
    }

    fn build_message(status: &str, repo_name: &str) -> PubSubMessage {
        PubSubMessage::from_data(
            serde_json::json!({
                "id": "b-1",
                "status": status,
                "logUrl": "https://logs/1",
                "source": {"repoSource": {"repoName": repo_name, "branchName": "main"}},
                "sourceProvenance": {"resolvedRepoSource": {"commitSha": "abc123"}},
            })
            .to_string(),
        )
    }

    #[tokio::test]
    async fn successful_build_posts_one_update() {
        let publisher = RecordingPublisher::answering(201);
        let notifier = Notifier::new(publisher.clone());

        let receipt = notifier
            .notify(&build_message("SUCCESS", "x_acme_widgets"))
            .await
            .unwrap();

        assert_eq!(receipt.status, 201);
        let requests = publisher.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].endpoint,
            "https://api.bitbucket.org/2.0/repositories/acme/widgets/commit/abc123/statuses/build"
        );
        assert_eq!(
            String::from_utf8(requests[0].body.clone()).unwrap(),
            r#"{"state":"SUCCESSFUL","key":"CLOUD-BUILD-NOTIFICATION","name":"main","url":"https://logs/1"}"#
        );
    }

    #[tokio::test]
    async fn malformed_payload_never_reaches_the_publisher() {
        let publisher = RecordingPublisher::answering(200);
        let notifier = Notifier::new(publisher.clone());

        let err = notifier
            .notify(&PubSubMessage::from_data("{not json"))
            .await
            .unwrap_err();

        assert!(matches!(err, NotifyError::Decode(_)));
        assert!(publisher.requests().is_empty());
    }

    #[tokio::test]
    async fn short_repo_name_never_reaches_the_publisher() {
        let publisher = RecordingPublisher::answering(200);
        let notifier = Notifier::new(publisher.clone());

        let err = notifier
            .notify(&build_message("SUCCESS", "onlyone"))
            .await
            .unwrap_err();

        assert!(matches!(err, NotifyError::RepoName(_)));
        assert!(publisher.requests().is_empty());
    }

    #[tokio::test]
    async fn server_error_is_ignored_by_default() {
        let publisher = RecordingPublisher::answering(500);
        let notifier = Notifier::new(publisher.clone());

        let receipt = notifier
            .notify(&build_message("FAILURE", "x_acme_widgets"))
            .await
            .unwrap();

        assert_eq!(receipt.status, 500);
        assert_eq!(publisher.requests().len(), 1);
    }

    #[tokio::test]
    async fn server_error_fails_under_fail_policy() {
        let publisher = RecordingPublisher::answering(500);
        let notifier =
            Notifier::new(publisher.clone()).with_error_status_policy(ErrorStatusPolicy::Fail);

        let err = notifier
            .notify(&build_message("WORKING", "x_acme_widgets"))
            .await
            .unwrap_err();

        assert!(matches!(err, NotifyError::Rejected { status: 500 }));
    }

    #[tokio::test]
    async fn transport_failure_is_propagated() {
        let publisher = RecordingPublisher::unreachable();
        let notifier = Notifier::new(publisher.clone());

        let err = notifier
            .notify(&build_message("QUEUED", "x_acme_widgets"))
            .await
            .unwrap_err();

        assert!(matches!(err, NotifyError::Publish(PublishError::Transport { .. })));
        assert_eq!(publisher.requests().len(), 1);
    }

    #[test]
    fn prepare_uses_configured_api_base() {
        let notifier = Notifier::new(RecordingPublisher::answering(200))
            .with_api_base("http://127.0.0.1:4010/2.0");

        let request = notifier
            .prepare(&build_message("QUEUED", "bitbucket_acme_widgets"))
            .unwrap();

        assert_eq!(
            request.endpoint,
            "http://127.0.0.1:4010/2.0/repositories/acme/widgets/commit/abc123/statuses/build"
        );
        let update: StatusUpdate = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(update.state, crate::StatusState::InProgress);
    }
}
