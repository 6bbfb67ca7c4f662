//! Minimal server lifecycle: register services, serve, stop on signal.

pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod service;
pub mod transport;

pub use config::{AppConfig, ServerConfig};
pub use lifecycle::{LifecycleController, LifecycleError, Shutdown, ShutdownTrigger};
pub use transport::{HttpTransport, Registration, ServeError, Transport};
