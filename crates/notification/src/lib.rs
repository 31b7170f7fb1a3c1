//! Core domain of the build notifier.
//!
//! Receives a Cloud Build result carried in a Pub/Sub message, translates it
//! into a Bitbucket commit-status update, and hands the serialised update to a
//! [`StatusPublisher`]. Infrastructure crates implement the publisher; they
//! never add translation rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is sent and where; the `bitbucket` crate defines *how*.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`event`] | Inbound shapes (`PubSubMessage`, `BuildResult`, `BuildStatus`) |
//! | [`identifiers`] | Newtype slugs (`OwnerSlug`, `RepoSlug`) |
//! | [`repository`] | Mirrored repository-name parsing |
//! | [`status`] | Outbound shapes (`StatusState`, `StatusUpdate`) and endpoint formatting |
//! | [`publisher`] | The `StatusPublisher` port |
//! | [`notifier`] | The `Notifier` invocation entry point |
//! | [`errors`] | Error taxonomy |

pub mod errors;
pub mod event;
pub mod identifiers;
pub mod notifier;
pub mod publisher;
pub mod repository;
pub mod status;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{NotifyError, PublishError, RepoNameError};
pub use event::{
    BuildResult, BuildStatus, PubSubMessage, RepoSource, ResolvedRepoSource, Source,
    SourceProvenance,
};
pub use identifiers::{OwnerSlug, RepoSlug};
pub use notifier::{ErrorStatusPolicy, Notifier};
pub use publisher::{PublishReceipt, StatusPublisher, StatusRequest};
pub use repository::RepoCoordinates;
pub use status::{status_endpoint, StatusState, StatusUpdate, DEFAULT_API_BASE, STATUS_KEY};
