//! OS signal handling.
//!
//! # Responsibilities
//! - Subscribe to SIGINT, SIGTERM and SIGQUIT for the duration of one run
//! - Translate the first of them into a shutdown event
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - The subscription is scoped: dropping it stops listening
//! - Signals after the first are not observed by the run

use std::fmt;

use futures_util::future::{BoxFuture, FutureExt};
use tokio::signal::unix::{signal, Signal, SignalKind};

use crate::lifecycle::shutdown::ShutdownTrigger;

/// A signal that asks the process to terminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    Interrupt,
    Terminate,
    Quit,
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TerminationSignal::Interrupt => "SIGINT",
            TerminationSignal::Terminate => "SIGTERM",
            TerminationSignal::Quit => "SIGQUIT",
        };
        f.write_str(name)
    }
}

/// Live subscription to the termination signals.
pub struct TerminationSignals {
    interrupt: Signal,
    terminate: Signal,
    quit: Signal,
}

impl TerminationSignals {
    pub fn subscribe() -> std::io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            quit: signal(SignalKind::quit())?,
        })
    }

    /// Wait for the next termination signal.
    pub async fn recv(&mut self) -> TerminationSignal {
        tokio::select! {
            _ = self.interrupt.recv() => TerminationSignal::Interrupt,
            _ = self.terminate.recv() => TerminationSignal::Terminate,
            _ = self.quit.recv() => TerminationSignal::Quit,
        }
    }
}

/// Trigger that fires on the first OS termination signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsSignals;

impl ShutdownTrigger for OsSignals {
    fn arm(self) -> std::io::Result<BoxFuture<'static, ()>> {
        let mut signals = TerminationSignals::subscribe()?;
        Ok(async move {
            let received = signals.recv().await;
            tracing::info!(signal = %received, "Termination signal received");
        }
        .boxed())
    }
}
