//! Service layer for business logic and orchestration.
//!
//! Services sit between the HTTP handlers and the compute backend: they pull
//! collections and assets from the backend, run the pipeline on the blocking
//! pool and publish the results as tile templates.

pub mod map_facade;
pub mod vegetation;

pub use map_facade::MapServiceFacade;
pub use vegetation::{AgaveMapUrls, IndexMapUrls, VegetationService};

use crate::error::{PipelineError, PipelineResult};

/// Run CPU-bound pipeline work on tokio's blocking pool.
pub(crate) async fn run_blocking<F, T>(f: F) -> PipelineResult<T>
where
    F: FnOnce() -> PipelineResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PipelineError::Internal(format!("Task join error: {}", e)))?
}
