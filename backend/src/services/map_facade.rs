//! Map Service Facade: styled rasters to tile URL templates.

use std::sync::Arc;

use log::debug;

use super::run_blocking;
use crate::compute::ComputeBackend;
use crate::error::PipelineResult;
use crate::models::{SpectralIndex, TileUrlTemplate, VisualizationStyle};
use crate::pipeline::{render, Composite};

/// Publishes composite bands through the compute backend's tile service.
#[derive(Clone)]
pub struct MapServiceFacade {
    backend: Arc<dyn ComputeBackend>,
}

impl MapServiceFacade {
    pub fn new(backend: Arc<dyn ComputeBackend>) -> Self {
        Self { backend }
    }

    /// Render one index band of `composite` with `style` and issue tiles.
    ///
    /// An all-no-data composite renders as a transparent layer and still
    /// yields a valid template.
    pub async fn publish(
        &self,
        composite: Arc<Composite>,
        index: SpectralIndex,
        style: VisualizationStyle,
    ) -> PipelineResult<TileUrlTemplate> {
        let layer = run_blocking(move || {
            let band = composite.require_band(index.band_name())?;
            render(band, composite.grid(), &style)
        })
        .await?;
        debug!(
            "Publishing {} layer {} (transparent: {})",
            index.band_name(),
            layer.id(),
            layer.is_transparent()
        );
        Ok(self.backend.issue_tiles(layer).await?)
    }
}
