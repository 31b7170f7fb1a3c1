use notification::PubSubMessage;
use serde::{Deserialize, Serialize};

/// Body of a Pub/Sub push request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEnvelope {
    /// The delivered message.
    pub message: PubSubMessage,
    /// Full subscription name, `projects/{project}/subscriptions/{name}`.
    #[serde(default)]
    pub subscription: String,
}

impl PushEnvelope {
    /// Parses a push request body.
    ///
    /// # Errors
    ///
    /// Fails if the body is not JSON of the push shape or `message.data` is
    /// not valid base64.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_push_request_body() {
        let body = br#"{
            "message": {
                "attributes": {"buildId": "b-7", "status": "SUCCESS"},
                "data": "eyJpZCI6ImItMiJ9",
                "messageId": "2070443601311540",
                "publishTime": "2021-02-26T19:13:55.749Z"
            },
            "subscription": "projects/demo/subscriptions/cloud-builds-push"
        }"#;

        let envelope = PushEnvelope::from_slice(body).unwrap();

        assert_eq!(envelope.subscription, "projects/demo/subscriptions/cloud-builds-push");
        assert_eq!(envelope.message.data, br#"{"id":"b-2"}"#);
        assert_eq!(envelope.message.message_id.as_deref(), Some("2070443601311540"));
        assert_eq!(
            envelope.message.publish_time.as_deref(),
            Some("2021-02-26T19:13:55.749Z")
        );
        assert_eq!(envelope.message.attributes["status"], "SUCCESS");
    }

    #[test]
    fn missing_message_is_rejected() {
        assert!(PushEnvelope::from_slice(br#"{"subscription":"s"}"#).is_err());
    }
}
