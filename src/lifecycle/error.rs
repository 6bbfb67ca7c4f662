//! Errors surfaced by a lifecycle run.

use thiserror::Error;

use crate::transport::ServeError;

/// The single failure outcome of [`LifecycleController::run`](super::LifecycleController::run).
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Binding the listener failed; nothing was started.
    #[error("failed to create listener on {protocol}/{port}")]
    ListenerCreation {
        protocol: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// Termination signal handlers could not be installed; the listener was released.
    #[error("failed to subscribe to termination signals")]
    SignalSubscription(#[source] std::io::Error),

    /// The serve loop reported an error, observed once shutdown had settled.
    #[error("server returned an error after it was done serving")]
    ServeFailedAfterShutdown(#[source] ServeError),
}
