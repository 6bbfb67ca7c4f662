//! Transport subsystem.
//!
//! # Data Flow
//! ```text
//! Transport::builder()
//!     → registrations (in order, each attaching its services)
//!     → Transport::from_builder()
//!     → serve(listener)          (accept loop, one outcome)
//!     → graceful_stop()          (drain in-flight work)
//!     → force_stop()             (abort whatever is left)
//! ```
//!
//! # Design Decisions
//! - The lifecycle controller only sees this trait, never the HTTP stack
//! - Stops are requested through `&self` so they can race the serve loop
//! - `force_stop` is synchronous and idempotent

use std::future::Future;

use thiserror::Error;
use tokio::net::TcpListener;

pub mod http;

pub use http::HttpTransport;

/// Attaches one unit of request-handling capability to a server builder.
pub type Registration<B> = Box<dyn FnOnce(B) -> B + Send>;

/// Terminal failure of a serve loop.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The listener failed in a way the accept loop cannot recover from.
    #[error("failed to accept connection: {0}")]
    Accept(#[source] std::io::Error),

    /// The serve task panicked or was cancelled.
    #[error("serve task did not complete: {0}")]
    Panicked(String),
}

/// The capabilities the lifecycle controller needs from a server framework.
pub trait Transport: Send + Sync + Sized + 'static {
    /// What registrations attach their services to.
    type Builder: Send;

    /// A fresh builder with nothing registered.
    fn builder() -> Self::Builder;

    /// Finish the server once every registration has been applied.
    fn from_builder(builder: Self::Builder) -> Self;

    /// Accept and dispatch connections until stopped.
    ///
    /// Resolves `Ok(())` once a graceful or forced stop has completed and
    /// `Err` if the listener fails for good.
    fn serve(&self, listener: TcpListener) -> impl Future<Output = Result<(), ServeError>> + Send;

    /// Stop accepting and wait for in-flight work to finish.
    ///
    /// Returns early if [`Transport::force_stop`] is called meanwhile or the
    /// serve loop has already exited.
    fn graceful_stop(&self) -> impl Future<Output = ()> + Send;

    /// Abort all in-flight work immediately.
    fn force_stop(&self);
}
