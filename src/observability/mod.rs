//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Lifecycle controller and transport produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging via `tracing` fields, not formatted strings
//! - Metrics are cheap (atomic increments) and never affect control flow

pub mod logging;
pub mod metrics;
