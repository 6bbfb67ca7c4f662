//! Lifecycle controller: serve until told to stop, then stop within a grace period.
//!
//! ```text
//! Idle → ListenerBound → Serving → ShutdownRequested
//!      → ShutdownConfirmed | ShutdownForced → Done
//! ```
//!
//! The serve loop's outcome is only read once the shutdown has settled, so a
//! serve failure and the shutdown result are never reported out of order.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::shutdown::ShutdownTrigger;
use crate::lifecycle::signals::OsSignals;
use crate::observability::metrics::{self, ShutdownMode};
use crate::transport::{HttpTransport, Registration, ServeError, Transport};

/// Runs one server instance from registration to full stop.
pub struct LifecycleController<T: Transport = HttpTransport> {
    config: ServerConfig,
    registrations: Vec<Registration<T::Builder>>,
}

impl<T: Transport> LifecycleController<T> {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            registrations: Vec::new(),
        }
    }

    /// Add a registration. Registrations run in the order they were added.
    pub fn register<F>(mut self, registration: F) -> Self
    where
        F: FnOnce(T::Builder) -> T::Builder + Send + 'static,
    {
        self.registrations.push(Box::new(registration));
        self
    }

    /// Serve until SIGINT, SIGTERM or SIGQUIT arrives, then shut down.
    pub async fn run(self) -> Result<(), LifecycleError> {
        self.run_until(OsSignals).await
    }

    /// Serve until `trigger` fires, then shut down.
    ///
    /// Returns once the server has stopped and every task this call spawned
    /// has been joined.
    pub async fn run_until<S: ShutdownTrigger>(self, trigger: S) -> Result<(), LifecycleError> {
        let grace_period = self.config.stop_grace_period();

        let mut builder = T::builder();
        for registration in self.registrations {
            builder = registration(builder);
        }
        let server = Arc::new(T::from_builder(builder));

        let listener = bind_listener(&self.config).await?;
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, protocol = %self.config.listen_protocol, "Listener bound");
        }

        let shutdown_requested = trigger.arm().map_err(LifecycleError::SignalSubscription)?;

        let serving = Arc::clone(&server);
        let serve_task = tokio::spawn(async move { serving.serve(listener).await });

        shutdown_requested.await;
        tracing::info!(grace_period = ?grace_period, "Shutdown requested, stopping server");

        let draining = Arc::clone(&server);
        let mut drain_task = tokio::spawn(async move { draining.graceful_stop().await });

        let mode = tokio::select! {
            _ = &mut drain_task => ShutdownMode::Graceful,
            _ = tokio::time::sleep(grace_period) => ShutdownMode::Forced,
        };
        match mode {
            ShutdownMode::Graceful => {
                tracing::debug!("Server has exited gracefully");
            }
            ShutdownMode::Forced => {
                tracing::warn!(
                    grace_period = ?grace_period,
                    "Server failed to stop gracefully after {:?}; hard-stopping now",
                    grace_period
                );
                server.force_stop();
                // Superseded; its result no longer matters.
                drain_task.abort();
                let _ = drain_task.await;
                tracing::debug!("Server was forcefully stopped");
            }
        }
        metrics::record_shutdown(mode);

        let outcome = match serve_task.await {
            Ok(result) => result,
            Err(e) => Err(ServeError::Panicked(e.to_string())),
        };
        outcome.map_err(|e| {
            tracing::error!(error = %e, "Server returned an error after it was done serving");
            LifecycleError::ServeFailedAfterShutdown(e)
        })
    }
}

async fn bind_listener(config: &ServerConfig) -> Result<TcpListener, LifecycleError> {
    let bind = async {
        let addr = listen_address(&config.listen_protocol, config.listen_port)?;
        TcpListener::bind(addr).await
    };
    bind.await.map_err(|source| LifecycleError::ListenerCreation {
        protocol: config.listen_protocol.clone(),
        port: config.listen_port,
        source,
    })
}

/// Wildcard address for a protocol name.
fn listen_address(protocol: &str, port: u16) -> io::Result<SocketAddr> {
    match protocol {
        "tcp" | "tcp4" => Ok(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))),
        "tcp6" => Ok(SocketAddr::from((Ipv6Addr::UNSPECIFIED, port))),
        other => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unknown network {other}"),
        )),
    }
}
