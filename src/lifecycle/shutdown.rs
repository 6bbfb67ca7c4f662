//! Shutdown triggers.
//!
//! A trigger is armed once per run, after the listener is bound, and yields
//! a future that resolves when shutdown should begin.

use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use tokio::sync::watch;

/// Source of the one event that starts a shutdown.
pub trait ShutdownTrigger {
    /// Subscribe to the event.
    ///
    /// The returned future resolves once; dropping it releases the subscription.
    fn arm(self) -> std::io::Result<BoxFuture<'static, ()>>;
}

/// In-process shutdown trigger.
///
/// Cloned handles share one latch: only the first [`Shutdown::trigger`] has an
/// effect, and a trigger fired before the run arms it is not lost.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    /// Create a new, untriggered shutdown handle.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request shutdown. Returns `true` only for the call that flipped the latch.
    pub fn trigger(&self) -> bool {
        !self.tx.send_replace(true)
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownTrigger for Shutdown {
    fn arm(self) -> std::io::Result<BoxFuture<'static, ()>> {
        let mut rx = self.tx.subscribe();
        Ok(async move {
            // Keeps the channel open: an untriggered run waits indefinitely.
            let _handle = self;
            let _ = rx.wait_for(|triggered| *triggered).await;
        }
        .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn only_first_trigger_counts() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_triggered());
        assert!(shutdown.trigger());
        assert!(!shutdown.clone().trigger());
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn trigger_before_arm_is_observed() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        let armed = shutdown.arm().unwrap();
        tokio::time::timeout(Duration::from_millis(100), armed)
            .await
            .expect("latched trigger should resolve immediately");
    }

    #[tokio::test]
    async fn untriggered_waits_even_when_other_handles_drop() {
        let shutdown = Shutdown::new();
        let armed = shutdown.arm().unwrap();
        let result = tokio::time::timeout(Duration::from_millis(100), armed).await;
        assert!(result.is_err());
    }
}
