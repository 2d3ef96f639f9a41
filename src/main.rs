//! Orchids Arena · Debug-the-Code Challenge Backend
//!
//! - Axum HTTP + WebSocket API (registration, challenge arena, admin)
//! - Optional identity-provider integration (via environment variables)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                 : u16 (default 3000)
//!   ARENA_CONFIG_PATH    : path to TOML config (data dir + optional challenge bank)
//!   ARENA_DATA_DIR       : file-backed store directory (in-memory if unset)
//!   ADMIN_TOKEN          : shared secret for the admin API (disabled if unset)
//!   IDENTITY_SERVICE_KEY : enables the identity provider if present
//!   IDENTITY_URL         : default "http://localhost:54321"
//!   LOG_LEVEL            : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT           : "pretty" (default) or "json"

mod catalog;
mod config;
mod domain;
mod error;
mod identity;
mod logic;
mod protocol;
mod routes;
mod session;
mod state;
mod store;
mod telemetry;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (catalog, store, sessions, identity client).
  let state = Arc::new(AppState::new());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "arena", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
