//! Liveness and status endpoints.
//!
//! - `GET /ping` → `pong`
//! - `GET /status` → version and uptime as JSON

use std::time::Instant;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
}

/// Registration that mounts the status endpoints.
pub fn register_status(router: Router) -> Router {
    let started = Instant::now();
    router.merge(
        Router::new()
            .route("/ping", get(ping))
            .route("/status", get(get_status))
            .with_state(started),
    )
}

async fn ping() -> &'static str {
    "pong"
}

async fn get_status(State(started): State<Instant>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "serving",
        uptime_secs: started.elapsed().as_secs(),
    })
}
