use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use notification::{Notifier, NotifyError};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::envelope::PushEnvelope;

/// Errors running the push listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that failed to bind.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The server failed while running.
    #[error("push listener stopped with an error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Builds the push receiver routes.
///
/// - `POST /`: Pub/Sub push delivery.
/// - `GET /healthz`: liveness probe.
pub fn router(notifier: Arc<Notifier>) -> Router {
    Router::new()
        .route("/", post(receive_push))
        .route("/healthz", get(healthz))
        .with_state(notifier)
}

/// Binds `addr` and serves the push receiver until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// [`ListenerError::Bind`] if the address cannot be bound,
/// [`ListenerError::Serve`] if the server fails while running.
pub async fn serve(addr: SocketAddr, notifier: Arc<Notifier>) -> Result<(), ListenerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ListenerError::Bind { addr, source })?;
    info!(%addr, "Listening for Pub/Sub push deliveries");

    axum::serve(listener, router(notifier))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ListenerError::Serve)?;

    info!("Push listener stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn receive_push(State(notifier): State<Arc<Notifier>>, body: Bytes) -> Response {
    let envelope = match PushEnvelope::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(err) => {
            // Redelivery cannot fix the body; acknowledge so it is dropped.
            warn!(error = %err, "Dropped undecodable push request");
            return StatusCode::NO_CONTENT.into_response();
        }
    };

    let message = &envelope.message;
    info!(
        subscription = %envelope.subscription,
        message_id = message.message_id.as_deref().unwrap_or_default(),
        attr_build_id = message.attributes.get("buildId").map(String::as_str).unwrap_or_default(),
        attr_status = message.attributes.get("status").map(String::as_str).unwrap_or_default(),
        "Received build notification"
    );

    match notifier.notify(message).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) if err.is_bad_event() => {
            warn!(error = %err, "Dropped build notification with a bad event");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => {
            let status = status_for(&err);
            warn!(error = %err, status = status.as_u16(), "Build notification failed");
            (status, err.to_string()).into_response()
        }
    }
}

fn status_for(err: &NotifyError) -> StatusCode {
    match err {
        NotifyError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_GATEWAY,
    }
}
