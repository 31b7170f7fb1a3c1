use std::error::Error as _;

use async_trait::async_trait;
use notification::{PublishError, PublishReceipt, StatusPublisher, StatusRequest};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use thiserror::Error;
use tracing::debug;

const APPLICATION_JSON: &str = "application/json";

/// Errors constructing a [`BitbucketClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The HTTP client (TLS backend) could not be initialised.
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Posts commit-status updates to Bitbucket Cloud with HTTP Basic auth.
#[derive(Debug, Clone)]
pub struct BitbucketClient {
    http: reqwest::Client,
    credentials: crate::Credentials,
}

impl BitbucketClient {
    /// Creates a client with default `reqwest` settings.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the TLS backend cannot be initialised.
    pub fn new(credentials: crate::Credentials) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self::with_http_client(http, credentials))
    }

    /// Creates a client over an existing `reqwest` client.
    pub fn with_http_client(http: reqwest::Client, credentials: crate::Credentials) -> Self {
        Self { http, credentials }
    }
}

#[async_trait]
impl StatusPublisher for BitbucketClient {
    async fn publish(&self, request: StatusRequest) -> Result<PublishReceipt, PublishError> {
        let StatusRequest { endpoint, body } = request;
        debug!(%endpoint, bytes = body.len(), "Posting commit status");

        let response = self
            .http
            .post(&endpoint)
            .basic_auth(self.credentials.username(), Some(self.credentials.password()))
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .header(ACCEPT, APPLICATION_JSON)
            .body(body)
            .send()
            .await
            .map_err(|err| PublishError::Transport {
                endpoint: endpoint.clone(),
                message: error_chain(&err),
            })?;

        // Dropping the response discards the body without reading it.
        Ok(PublishReceipt {
            status: response.status().as_u16(),
        })
    }
}

/// Renders an error with its sources, `outer: inner: root`.
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
