//! HTTP transport built on Axum and hyper.
//!
//! # Responsibilities
//! - Serve HTTP/1.1 and HTTP/2 connections for the registered router
//! - Track every connection so stops can drain or abort them
//! - Count accepted connections
//!
//! # Design Decisions
//! - Own accept loop instead of `axum::serve`: forced stop must be able to
//!   abort connection tasks, which `axum::serve` does not expose
//! - Stop requests travel over a watch channel (Running → Draining → Halted)
//! - Per-connection accept errors are skipped, resource exhaustion backs off
//!   and retries, only an unusable listener ends the loop

use std::time::Duration;

use axum::{body::Body, Router};
use hyper::{body::Incoming, Request};
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::{conn::auto, graceful::GracefulShutdown},
    service::TowerToHyperService,
};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tower::ServiceExt;

use crate::observability::metrics;
use crate::transport::{ServeError, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum StopState {
    Running,
    Draining,
    Halted,
}

/// Serves an Axum [`Router`] assembled from registrations.
pub struct HttpTransport {
    router: Router,
    stop: watch::Sender<StopState>,
    finished: watch::Sender<bool>,
}

/// Marks the serve loop finished even if it unwinds.
struct FinishedGuard<'a>(&'a watch::Sender<bool>);

impl Drop for FinishedGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(true);
    }
}

impl HttpTransport {
    async fn accept_loop(&self, listener: TcpListener) -> Result<(), ServeError> {
        let mut stop = self.stop.subscribe();
        let builder = auto::Builder::new(TokioExecutor::new());
        let graceful = GracefulShutdown::new();
        let mut connections = JoinSet::new();

        let mut backoff = AcceptBackoff::default();
        let outcome = loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer_addr) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => match classify_accept_error(&e) {
                            AcceptFailure::Connection => {
                                tracing::debug!(error = %e, "Transient accept error");
                                continue;
                            }
                            AcceptFailure::Retry => {
                                let delay = backoff.next_delay();
                                tracing::warn!(error = %e, retry_in = ?delay, "Accept failed, retrying");
                                if stopped_during(&mut stop, delay).await {
                                    break Ok(());
                                }
                                continue;
                            }
                            AcceptFailure::Fatal => {
                                tracing::error!(error = %e, "Listener failed");
                                break Err(ServeError::Accept(e));
                            }
                        },
                    };
                    backoff.reset();
                    metrics::record_connection_accepted();

                    let service = TowerToHyperService::new(
                        self.router
                            .clone()
                            .map_request(|req: Request<Incoming>| req.map(Body::new)),
                    );
                    let conn = builder
                        .serve_connection(TokioIo::new(stream), service)
                        .into_owned();
                    let conn = graceful.watch(conn);
                    connections.spawn(async move {
                        if let Err(e) = conn.await {
                            tracing::debug!(peer_addr = %peer_addr, error = %e, "Connection ended with error");
                        }
                    });
                }
                Some(_) = connections.join_next() => {}
                _ = reached(&mut stop, StopState::Draining) => break Ok(()),
            }
        };

        // No new connections past this point.
        drop(listener);
        if outcome.is_err() {
            // Existing connections keep being served until a stop is requested.
            reached(&mut stop, StopState::Draining).await;
        }
        tracing::debug!(in_flight = connections.len(), "Draining connections");

        let halted = tokio::select! {
            _ = graceful.shutdown() => false,
            _ = reached(&mut stop, StopState::Halted) => true,
        };
        if halted {
            tracing::debug!(aborted = connections.len(), "Aborting connections");
            connections.abort_all();
        }
        while connections.join_next().await.is_some() {}

        outcome
    }
}

impl Transport for HttpTransport {
    type Builder = Router;

    fn builder() -> Router {
        Router::new()
    }

    fn from_builder(router: Router) -> Self {
        let (stop, _) = watch::channel(StopState::Running);
        let (finished, _) = watch::channel(false);
        Self {
            router,
            stop,
            finished,
        }
    }

    async fn serve(&self, listener: TcpListener) -> Result<(), ServeError> {
        let _finished = FinishedGuard(&self.finished);
        self.accept_loop(listener).await
    }

    async fn graceful_stop(&self) {
        self.stop.send_if_modified(|state| {
            if *state == StopState::Running {
                *state = StopState::Draining;
                true
            } else {
                false
            }
        });
        let mut finished = self.finished.subscribe();
        let _ = finished.wait_for(|done| *done).await;
    }

    fn force_stop(&self) {
        self.stop.send_replace(StopState::Halted);
    }
}

async fn reached(stop: &mut watch::Receiver<StopState>, target: StopState) -> bool {
    stop.wait_for(|state| *state >= target).await.is_ok()
}

/// Sleep for `delay` unless a stop arrives first. Returns whether it did.
async fn stopped_during(stop: &mut watch::Receiver<StopState>, delay: Duration) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        _ = reached(stop, StopState::Draining) => true,
    }
}

/// What to do about a failed `accept`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AcceptFailure {
    /// The peer went away before the handshake finished; accept the next one.
    Connection,
    /// Resource pressure (EMFILE, ENFILE, ENOBUFS, ...); back off and retry.
    Retry,
    /// The listener itself is unusable.
    Fatal,
}

fn classify_accept_error(e: &std::io::Error) -> AcceptFailure {
    use std::io::ErrorKind;
    match e.kind() {
        ErrorKind::ConnectionRefused | ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset => {
            AcceptFailure::Connection
        }
        // EINVAL: the socket is no longer listening.
        ErrorKind::InvalidInput => AcceptFailure::Fatal,
        _ => AcceptFailure::Retry,
    }
}

/// Retry delay for accept failures: 5ms doubling up to 1s.
#[derive(Debug, Default)]
struct AcceptBackoff {
    current: Option<Duration>,
}

impl AcceptBackoff {
    const INITIAL: Duration = Duration::from_millis(5);
    const MAX: Duration = Duration::from_secs(1);

    fn next_delay(&mut self) -> Duration {
        let delay = match self.current {
            None => Self::INITIAL,
            Some(previous) => (previous * 2).min(Self::MAX),
        };
        self.current = Some(delay);
        delay
    }

    fn reset(&mut self) {
        self.current = None;
    }
}
