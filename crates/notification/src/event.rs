//! Inbound event shapes.
//!
//! Cloud Build publishes one Pub/Sub message per build state change. The
//! message `data` is the JSON-encoded build resource; only the handful of
//! fields the notifier consumes are modelled here, everything else is ignored.
//!
//! Absent and `null` fields decode to their empty value. Only malformed JSON
//! or a field of the wrong type is a decode error.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::NotifyError;

// ---------------------------------------------------------------------------
// Pub/Sub message
// ---------------------------------------------------------------------------

/// A Pub/Sub message carrying a build result.
///
/// `data` holds the raw bytes; in JSON form it is base64-encoded, as Pub/Sub
/// delivers it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubSubMessage {
    /// JSON-encoded [`BuildResult`].
    #[serde(default, with = "base64_bytes")]
    pub data: Vec<u8>,

    /// Message attributes. Cloud Build sets `buildId` and `status`.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, String>,

    /// Server-assigned message id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    /// RFC 3339 publish timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_time: Option<String>,
}

impl PubSubMessage {
    /// Wraps raw bytes in a message with no attributes.
    pub fn from_data(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    /// Decodes `data` as a [`BuildResult`].
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Decode`] if `data` is not a JSON object of the
    /// expected shape.
    pub fn build_result(&self) -> Result<BuildResult, NotifyError> {
        serde_json::from_slice(&self.data).map_err(NotifyError::Decode)
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Build result
// ---------------------------------------------------------------------------

/// The subset of a Cloud Build resource the notifier consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildResult {
    /// Cloud Build build id.
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    /// Build status code.
    #[serde(deserialize_with = "null_as_default")]
    pub status: BuildStatus,
    /// Link to the build log in the Cloud console.
    #[serde(deserialize_with = "null_as_default")]
    pub log_url: String,
    /// Repository and branch the build ran against.
    #[serde(deserialize_with = "null_as_default")]
    pub source: Source,
    /// Resolved commit of the code that was built.
    #[serde(deserialize_with = "null_as_default")]
    pub source_provenance: SourceProvenance,
}

/// Build source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Source {
    /// Mirrored repository and branch.
    #[serde(deserialize_with = "null_as_default")]
    pub repo_source: RepoSource,
}

/// Mirrored repository the build ran against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RepoSource {
    /// Mirrored repository name, `<prefix>_<owner>_<repo>`.
    #[serde(deserialize_with = "null_as_default")]
    pub repo_name: String,
    /// Branch that triggered the build.
    #[serde(deserialize_with = "null_as_default")]
    pub branch_name: String,
}

/// Immutable reference to the code that was built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SourceProvenance {
    /// Repository source with the branch resolved to a commit.
    #[serde(deserialize_with = "null_as_default")]
    pub resolved_repo_source: ResolvedRepoSource,
}

/// Repository source resolved to a commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolvedRepoSource {
    /// Full commit hash.
    #[serde(deserialize_with = "null_as_default")]
    pub commit_sha: String,
}

/// Reads `null` as the type's default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Build status
// ---------------------------------------------------------------------------

/// Cloud Build status code.
///
/// Matching is exact and case-sensitive. Any code not listed here, including
/// the empty string, is kept verbatim in [`BuildStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BuildStatus {
    /// `STATUS_UNKNOWN`
    StatusUnknown,
    /// `PENDING`
    Pending,
    /// `QUEUED`
    Queued,
    /// `WORKING`
    Working,
    /// `SUCCESS`
    Success,
    /// `FAILURE`
    Failure,
    /// `INTERNAL_ERROR`
    InternalError,
    /// `TIMEOUT`
    Timeout,
    /// `CANCELLED`
    Cancelled,
    /// `EXPIRED`
    Expired,
    /// Any other code, verbatim.
    Other(String),
}

impl BuildStatus {
    /// Returns the wire representation of the status code.
    pub fn as_str(&self) -> &str {
        match self {
            Self::StatusUnknown => "STATUS_UNKNOWN",
            Self::Pending => "PENDING",
            Self::Queued => "QUEUED",
            Self::Working => "WORKING",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::InternalError => "INTERNAL_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Cancelled => "CANCELLED",
            Self::Expired => "EXPIRED",
            Self::Other(code) => code,
        }
    }
}

impl Default for BuildStatus {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for BuildStatus {
    fn from(code: String) -> Self {
        match code.as_str() {
            "STATUS_UNKNOWN" => Self::StatusUnknown,
            "PENDING" => Self::Pending,
            "QUEUED" => Self::Queued,
            "WORKING" => Self::Working,
            "SUCCESS" => Self::Success,
            "FAILURE" => Self::Failure,
            "INTERNAL_ERROR" => Self::InternalError,
            "TIMEOUT" => Self::Timeout,
            "CANCELLED" => Self::Cancelled,
            "EXPIRED" => Self::Expired,
            _ => Self::Other(code),
        }
    }
}

impl From<&str> for BuildStatus {
    fn from(code: &str) -> Self {
        Self::from(code.to_string())
    }
}

impl From<BuildStatus> for String {
    fn from(status: BuildStatus) -> Self {
        match status {
            BuildStatus::Other(code) => code,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUILD_JSON: &str = r#"{
        "id": "b-1",
        "projectId": "ignored",
        "status": "SUCCESS",
        "logUrl": "https://logs/1",
        "source": {"repoSource": {"repoName": "x_acme_widgets", "branchName": "main"}},
        "sourceProvenance": {"resolvedRepoSource": {"commitSha": "abc123"}}
    }"#;

    #[test]
    fn decodes_consumed_fields_and_ignores_the_rest() {
        let result = PubSubMessage::from_data(BUILD_JSON).build_result().unwrap();
        assert_eq!(result.id, "b-1");
        assert_eq!(result.status, BuildStatus::Success);
        assert_eq!(result.log_url, "https://logs/1");
        assert_eq!(result.source.repo_source.repo_name, "x_acme_widgets");
        assert_eq!(result.source.repo_source.branch_name, "main");
        assert_eq!(
            result.source_provenance.resolved_repo_source.commit_sha,
            "abc123"
        );
    }

    #[test]
    fn absent_fields_decode_empty() {
        let result = PubSubMessage::from_data(r#"{"status":"QUEUED"}"#)
            .build_result()
            .unwrap();
        assert_eq!(result.status, BuildStatus::Queued);
        assert_eq!(result.source.repo_source.repo_name, "");
        assert_eq!(result.source_provenance.resolved_repo_source.commit_sha, "");
    }

    #[test]
    fn null_fields_decode_empty() {
        let result = PubSubMessage::from_data(
            r#"{"id":"b","status":null,"logUrl":null,"source":{"repoSource":{"repoName":"x_acme_widgets","branchName":null}},"sourceProvenance":null}"#,
        )
        .build_result()
        .unwrap();
        assert_eq!(result.status, BuildStatus::default());
        assert_eq!(crate::StatusState::from(&result.status), crate::StatusState::Failed);
        assert_eq!(result.log_url, "");
        assert_eq!(result.source.repo_source.repo_name, "x_acme_widgets");
        assert_eq!(result.source.repo_source.branch_name, "");
        assert_eq!(result.source_provenance.resolved_repo_source.commit_sha, "");
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let err = PubSubMessage::from_data("not json").build_result().unwrap_err();
        assert!(matches!(err, NotifyError::Decode(_)));
    }

    #[test]
    fn empty_data_is_a_decode_error() {
        let err = PubSubMessage::from_data(Vec::new()).build_result().unwrap_err();
        assert!(matches!(err, NotifyError::Decode(_)));
    }

    #[test]
    fn type_mismatch_is_a_decode_error() {
        let err = PubSubMessage::from_data(r#"{"status": 3}"#)
            .build_result()
            .unwrap_err();
        assert!(matches!(err, NotifyError::Decode(_)));
    }

    #[test]
    fn unknown_status_code_is_kept_verbatim() {
        let status = BuildStatus::from("success");
        assert_eq!(status, BuildStatus::Other("success".to_string()));
        assert_eq!(status.as_str(), "success");
        assert_eq!(String::from(BuildStatus::InternalError), "INTERNAL_ERROR");
    }

    #[test]
    fn message_data_is_base64_on_the_wire() {
        let json = r#"{"data":"eyJpZCI6ImItMiJ9","messageId":"42","attributes":{"buildId":"b-2"}}"#;
        let message: PubSubMessage = serde_json::from_str(json).unwrap();
        assert_eq!(message.data, br#"{"id":"b-2"}"#);
        assert_eq!(message.message_id.as_deref(), Some("42"));
        assert_eq!(message.attributes.get("buildId").map(String::as_str), Some("b-2"));
        assert_eq!(message.build_result().unwrap().id, "b-2");
    }

    #[test]
    fn invalid_base64_data_is_rejected() {
        assert!(serde_json::from_str::<PubSubMessage>(r#"{"data":"***"}"#).is_err());
    }
}
