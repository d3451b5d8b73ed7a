//! HTTP server module.
//!
//! Exposes the vegetation map service as a small REST API: two map
//! endpoints returning tile URL templates, the tile endpoint those templates
//! point to, and a health check.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  HTTP Layer (axum handlers)                               │
//! │  - Query parsing with defaults                            │
//! │  - Timeout, JSON envelopes, CORS, compression             │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Service Layer (services/)                                │
//! │  - Composite, mask and publish per map variant            │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Compute Backend (compute/)                               │
//! │  - Collections, assets, tile registry                     │
//! │  - LocalBackend                                           │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;

use tokio::net::TcpListener;

use crate::config::ServerSettings;

/// Bind the configured listener. `host` may be an IP literal or a hostname.
pub async fn bind(settings: &ServerSettings) -> std::io::Result<TcpListener> {
    TcpListener::bind((settings.host.as_str(), settings.port)).await
}
