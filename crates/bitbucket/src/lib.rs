//! Build notifier Bitbucket adapter.
//!
//! Implements the [`notification::StatusPublisher`] trait for the Bitbucket
//! Cloud commit build-status API
//! (`POST /2.0/repositories/{workspace}/{repo}/commit/{sha}/statuses/build`).
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, authentication, and header handling live
//! here. The [`notification`] crate sees only
//! [`notification::StatusPublisher`].
//!
//! ## Delivery semantics
//!
//! One request per update. No timeout, no retry, no redirect-policy override:
//! the client is built with `reqwest` defaults. The response body is never
//! read.

mod client;
mod credentials;

pub use client::{BitbucketClient, ClientError};
pub use credentials::Credentials;
