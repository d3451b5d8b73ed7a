//! Compute backend abstraction.
//!
//! The pipeline is expressed against a small set of backend primitives:
//! image collections addressable by id, vector assets addressable by path,
//! and tile issuance for rendered layers.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Services (vegetation maps, map facade)                 │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  ComputeBackend trait                                   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────▼──────────────────────────────┐
//!     │  LocalBackend (in-memory catalog + tiles)    │
//!     └──────────────────────────────────────────────┘
//! ```

#[cfg(not(feature = "local-backend"))]
compile_error!("Enable at least one compute backend feature.");

pub mod error;

#[cfg(feature = "local-backend")]
pub mod catalog;
#[cfg(feature = "local-backend")]
pub mod local;
#[cfg(feature = "local-backend")]
pub mod tiles;

pub use error::{ComputeError, ComputeResult};

#[cfg(feature = "local-backend")]
pub use catalog::Catalog;
#[cfg(feature = "local-backend")]
pub use local::LocalBackend;

use async_trait::async_trait;

use crate::models::{TileCoord, TileUrlTemplate, VectorLayer};
use crate::pipeline::{ImageCollection, RenderedLayer};

/// Primitives the pipeline needs from a geospatial compute service.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to be shared across handlers.
#[async_trait]
pub trait ComputeBackend: Send + Sync {
    /// Short backend name reported by the health endpoint.
    fn name(&self) -> &'static str;

    /// Image collection by id (e.g. `COPERNICUS/S2_SR_HARMONIZED`).
    async fn image_collection(&self, collection_id: &str) -> ComputeResult<ImageCollection>;

    /// Vector asset by path.
    async fn feature_collection(&self, asset_path: &str) -> ComputeResult<VectorLayer>;

    /// Register a rendered layer and return a URL template resolving to its tiles.
    async fn issue_tiles(&self, layer: RenderedLayer) -> ComputeResult<TileUrlTemplate>;

    /// PNG bytes of one tile of a previously issued layer.
    async fn render_tile(&self, map_id: &str, tile: TileCoord) -> ComputeResult<Vec<u8>>;

    async fn health_check(&self) -> ComputeResult<bool>;
}
