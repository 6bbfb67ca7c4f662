//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every field has a default so an empty file is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Protocols the listener knows how to bind.
pub const SUPPORTED_PROTOCOLS: &[&str] = &["tcp", "tcp4", "tcp6"];

/// Root configuration for the server binary.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener and shutdown settings.
    pub server: ServerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener and shutdown settings for one server run.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on.
    pub listen_port: u16,

    /// Listener protocol ("tcp", "tcp4" or "tcp6").
    pub listen_protocol: String,

    /// How long a graceful stop may take before the server is hard-stopped.
    pub stop_grace_period_ms: u64,
}

impl ServerConfig {
    pub fn new(listen_port: u16, listen_protocol: impl Into<String>, stop_grace_period: Duration) -> Self {
        Self {
            listen_port,
            listen_protocol: listen_protocol.into(),
            stop_grace_period_ms: u64::try_from(stop_grace_period.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn stop_grace_period(&self) -> Duration {
        Duration::from_millis(self.stop_grace_period_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_port: 9710,
            listen_protocol: "tcp".to_string(),
            stop_grace_period_ms: 10_000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.server, ServerConfig::default());
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn partial_server_section_keeps_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            listen_port = 50051
            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.listen_port, 50051);
        assert_eq!(config.server.listen_protocol, "tcp");
        assert_eq!(config.server.stop_grace_period(), Duration::from_secs(10));
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn grace_period_round_trips_through_millis() {
        let config = ServerConfig::new(1, "tcp6", Duration::from_millis(1500));
        assert_eq!(config.stop_grace_period_ms, 1500);
        assert_eq!(config.stop_grace_period(), Duration::from_millis(1500));
    }

    #[test]
    fn oversized_grace_period_saturates() {
        let config = ServerConfig::new(1, "tcp", Duration::MAX);
        assert_eq!(config.stop_grace_period_ms, u64::MAX);
    }
}
