//! Build notifier trigger event source infrastructure.
//!
//! Cloud Build publishes build updates to the `cloud-builds` Pub/Sub topic. A
//! push subscription delivers each message as an HTTP `POST` carrying a
//! [`PushEnvelope`]; this crate receives those requests and hands the inner
//! [`notification::PubSubMessage`] to a [`notification::Notifier`].
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Transport details and envelope decoding live here. The
//! [`notification`] crate sees only [`notification::PubSubMessage`].
//!
//! ## Response codes
//!
//! Pub/Sub treats any non-2xx push response as a nack and redelivers the
//! message according to the subscription's retry policy. Events that can
//! never succeed are acknowledged and dropped with a `warn` log. Downstream
//! failures are nacked, which hands any retry to the subscription policy; the
//! receiver itself never retries.
//!
//! | Outcome | Status |
//! |---------|--------|
//! | Status posted (any downstream status code under the default policy) | 204 |
//! | Envelope, base64, or build result undecodable; bad repository name (dropped) | 204 |
//! | Transport failure or rejected update | 502 |
//! | Status update could not be encoded | 500 |

mod envelope;
mod server;

pub use envelope::PushEnvelope;
pub use server::{router, serve, ListenerError};
