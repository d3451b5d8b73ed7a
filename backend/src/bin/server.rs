//! BloomWatch HTTP Server Binary
//!
//! Loads the configuration, prepares the compute backend and the agricultural
//! mask, then serves the map API.
//!
//! # Usage
//!
//! ```bash
//! # Built-in defaults, empty collections
//! cargo run --bin bloomwatch-server
//!
//! # With a configuration file and imagery catalog
//! BLOOMWATCH_CONFIG=bloomwatch.toml cargo run --bin bloomwatch-server
//! ```
//!
//! # Environment Variables
//!
//! - `BLOOMWATCH_CONFIG`: Path to the TOML configuration file
//! - `HOST`, `PORT`: Bind address (default: 0.0.0.0:8080)
//! - `PUBLIC_BASE_URL`: Prefix of issued tile URLs
//! - `CATALOG_PATH`: JSON catalog loaded into the local backend
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::sync::Arc;

use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use bloomwatch::compute::{Catalog, LocalBackend};
use bloomwatch::config::ServiceConfig;
use bloomwatch::http::{self, create_router, AppState};
use bloomwatch::services::VegetationService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting BloomWatch HTTP Server");

    let config = ServiceConfig::load()?;

    let backend = match &config.backend.catalog_path {
        Some(path) => {
            let catalog = Catalog::from_file(path)?;
            info!("Loaded catalog {}", path.display());
            LocalBackend::from_catalog(catalog, config.server.public_base_url.clone())
                .with_max_layers(config.backend.max_layers)
        }
        None => {
            warn!("No catalog configured; imagery collections start empty");
            LocalBackend::new(config.server.public_base_url.clone())
                .with_max_layers(config.backend.max_layers)
        }
    };

    let aoi = config.region.area_of_interest()?;
    info!("Area of interest '{}' ready", aoi.name());
    let vegetation = VegetationService::new(Arc::new(backend), aoi, &config);

    // The agricultural map is unavailable without a mask; a configured mask
    // that fails to build is fatal.
    match &config.mask {
        Some(settings) => {
            vegetation.build_mask(settings).await?;
            info!("Agricultural mask initialized from '{}'", settings.asset);
        }
        None => warn!("No mask configured; /getAgaveMap will report an error"),
    }

    let state = AppState::new(vegetation, &config);
    let app = create_router(state);

    let listener = http::bind(&config.server).await?;
    info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
