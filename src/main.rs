//! Minimal server (v1)
//!
//! Binds a listener, registers the built-in services and serves until
//! SIGINT, SIGTERM or SIGQUIT arrives.
//!
//! ```text
//!   config file + flags
//!          │
//!          ▼
//!   ┌──────────────┐   registrations   ┌───────────────┐
//!   │  lifecycle   │──────────────────▶│   transport   │◀── connections
//!   │  controller  │  serve / stop     │ (axum+hyper)  │
//!   └──────┬───────┘                   └───────────────┘
//!          │ signal → graceful stop ⟷ grace period → force stop
//!          ▼
//!     exit status
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use minimal_server::config::validation::validate_config;
use minimal_server::config::{load_config, AppConfig, ConfigError};
use minimal_server::observability::{logging, metrics};
use minimal_server::service::register_status;
use minimal_server::{HttpTransport, LifecycleController};

#[derive(Parser, Debug)]
#[command(name = "minimal-server", about = "Serve registered services until terminated")]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen port.
    #[arg(long)]
    port: Option<u16>,

    /// Override the listen protocol (tcp, tcp4, tcp6).
    #[arg(long)]
    protocol: Option<String>,

    /// Override the stop grace period in milliseconds.
    #[arg(long)]
    grace_period_ms: Option<u64>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(port) = self.port {
            config.server.listen_port = port;
        }
        if let Some(protocol) = &self.protocol {
            config.server.listen_protocol = protocol.clone();
        }
        if let Some(grace) = self.grace_period_ms {
            config.server.stop_grace_period_ms = grace;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    cli.apply_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability)?;

    tracing::info!(
        listen_port = config.server.listen_port,
        listen_protocol = %config.server.listen_protocol,
        stop_grace_period_ms = config.server.stop_grace_period_ms,
        "minimal-server v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let result = LifecycleController::<HttpTransport>::new(config.server)
        .register(register_status)
        .run()
        .await;

    if let Err(e) = &result {
        tracing::error!(error = %e, "Server run failed");
    } else {
        tracing::info!("Shutdown complete");
    }
    result.map_err(Into::into)
}
