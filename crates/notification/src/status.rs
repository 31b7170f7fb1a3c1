//! Outbound commit-status shapes and endpoint construction.

use serde::{Deserialize, Serialize};

use crate::event::{BuildResult, BuildStatus};
use crate::repository::RepoCoordinates;

/// Production base URL of the Bitbucket Cloud REST API.
pub const DEFAULT_API_BASE: &str = "https://api.bitbucket.org/2.0";

/// Key identifying the Cloud Build check on a commit.
///
/// Bitbucket keeps one status per key and commit, so every update for the
/// same commit replaces the previous one.
pub const STATUS_KEY: &str = "CLOUD-BUILD-NOTIFICATION";

// ---------------------------------------------------------------------------
// State translation
// ---------------------------------------------------------------------------

/// Commit-status state reported to Bitbucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusState {
    /// `INPROGRESS`: queued or running.
    InProgress,
    /// `SUCCESSFUL`: the build succeeded.
    Successful,
    /// `FAILED`: every other outcome.
    Failed,
}

impl StatusState {
    /// Returns the wire representation of the state.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "INPROGRESS",
            Self::Successful => "SUCCESSFUL",
            Self::Failed => "FAILED",
        }
    }
}

impl From<&BuildStatus> for StatusState {
    /// `QUEUED` and `WORKING` are in progress, `SUCCESS` is successful, and
    /// every other code (failures, cancellation, timeouts, unknown codes) is
    /// reported as failed.
    fn from(status: &BuildStatus) -> Self {
        match status {
            BuildStatus::Queued | BuildStatus::Working => Self::InProgress,
            BuildStatus::Success => Self::Successful,
            _ => Self::Failed,
        }
    }
}

impl std::fmt::Display for StatusState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Status update
// ---------------------------------------------------------------------------

/// Body of a Bitbucket build-status update.
///
/// Field order matches the serialised form: `state`, `key`, `name`, `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    /// Reported state.
    pub state: StatusState,
    /// Check identifier, always [`STATUS_KEY`].
    pub key: String,
    /// Display name; the branch the build ran against.
    pub name: String,
    /// Link shown on the status; the build log.
    pub url: String,
}

impl From<&BuildResult> for StatusUpdate {
    fn from(build: &BuildResult) -> Self {
        Self {
            state: StatusState::from(&build.status),
            key: STATUS_KEY.to_string(),
            name: build.source.repo_source.branch_name.clone(),
            url: build.log_url.clone(),
        }
    }
}

/// Formats the build-status resource URL for a commit.
///
/// Slugs and the commit hash are inserted verbatim.
pub fn status_endpoint(api_base: &str, coords: &RepoCoordinates, commit_sha: &str) -> String {
    format!(
        "{}/repositories/{}/{}/commit/{}/statuses/build",
        api_base.trim_end_matches('/'),
        coords.owner,
        coords.repo,
        commit_sha,
    )
}
