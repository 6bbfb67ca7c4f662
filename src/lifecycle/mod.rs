//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Controller (controller.rs):
//!     Apply registrations → Bind listener → Arm trigger → Serve in background
//!
//! Trigger (signals.rs, shutdown.rs):
//!     SIGINT/SIGTERM/SIGQUIT or Shutdown::trigger → shutdown requested
//!
//! Shutdown (controller.rs):
//!     Graceful stop ⟷ grace period timer → [force stop] → read serve outcome
//! ```
//!
//! # Design Decisions
//! - Registrations all run before the listener opens
//! - Bind failure is fatal and starts nothing
//! - Shutdown has a deadline: forced stop once the grace period elapses
//! - Forced vs graceful only changes what is logged, never the result

pub mod controller;
pub mod error;
pub mod shutdown;
pub mod signals;

pub use controller::LifecycleController;
pub use error::LifecycleError;
pub use shutdown::{Shutdown, ShutdownTrigger};
pub use signals::{OsSignals, TerminationSignal, TerminationSignals};
