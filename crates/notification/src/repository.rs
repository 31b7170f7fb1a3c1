//! Parsing of Cloud Build mirrored-repository names.
//!
//! Cloud Build names a mirrored Bitbucket repository `<prefix>_<owner>_<repo>`
//! (for example `bitbucket_acme_widgets`). The prefix is discarded and any
//! segments after the repository slug are ignored.

use crate::errors::RepoNameError;
use crate::identifiers::{OwnerSlug, RepoSlug};

/// Separator between the segments of a mirrored repository name.
const SEGMENT_SEPARATOR: char = '_';

/// Owner and repository slugs extracted from a mirrored repository name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCoordinates {
    /// Workspace (owner) slug, segment 1 of the name.
    pub owner: OwnerSlug,
    /// Repository slug, segment 2 of the name.
    pub repo: RepoSlug,
}

impl RepoCoordinates {
    /// Parses `<prefix>_<owner>_<repo>[_...]` into owner and repository slugs.
    ///
    /// # Errors
    ///
    /// - [`RepoNameError::TooFewSegments`] when the name has fewer than three
    ///   `_`-separated segments.
    /// - [`RepoNameError::EmptySegment`] when the owner or repository segment
    ///   is empty (e.g. `x__widgets`).
    pub fn parse(repo_name: &str) -> Result<Self, RepoNameError> {
        let segments: Vec<&str> = repo_name.split(SEGMENT_SEPARATOR).collect();
        if segments.len() < 3 {
            return Err(RepoNameError::TooFewSegments {
                repo_name: repo_name.to_string(),
                segments: segments.len(),
            });
        }

        let owner = OwnerSlug::new(segments[1]).ok_or_else(|| RepoNameError::EmptySegment {
            repo_name: repo_name.to_string(),
            position: 1,
        })?;
        let repo = RepoSlug::new(segments[2]).ok_or_else(|| RepoNameError::EmptySegment {
            repo_name: repo_name.to_string(),
            position: 2,
        })?;

        Ok(Self { owner, repo })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_owner_and_repo_from_positions_one_and_two() {
        let coords = RepoCoordinates::parse("x_ownerA_repoB").unwrap();
        assert_eq!(coords.owner.as_str(), "ownerA");
        assert_eq!(coords.repo.as_str(), "repoB");
    }

    #[test]
    fn trailing_segments_are_ignored() {
        let coords = RepoCoordinates::parse("bitbucket_acme_widgets_legacy").unwrap();
        assert_eq!(coords.owner.as_str(), "acme");
        assert_eq!(coords.repo.as_str(), "widgets");
    }

    #[test]
    fn single_segment_is_rejected() {
        let err = RepoCoordinates::parse("onlyone").unwrap_err();
        assert_eq!(
            err,
            RepoNameError::TooFewSegments {
                repo_name: "onlyone".to_string(),
                segments: 1,
            }
        );
    }

    #[test]
    fn two_segments_are_rejected() {
        assert!(matches!(
            RepoCoordinates::parse("bitbucket_acme"),
            Err(RepoNameError::TooFewSegments { segments: 2, .. })
        ));
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(matches!(
            RepoCoordinates::parse(""),
            Err(RepoNameError::TooFewSegments { segments: 1, .. })
        ));
    }

    #[test]
    fn empty_owner_segment_is_rejected() {
        assert!(matches!(
            RepoCoordinates::parse("x__widgets"),
            Err(RepoNameError::EmptySegment { position: 1, .. })
        ));
    }

    #[test]
    fn empty_repo_segment_is_rejected() {
        assert!(matches!(
            RepoCoordinates::parse("x_acme_"),
            Err(RepoNameError::EmptySegment { position: 2, .. })
        ));
    }
}
