//! # BloomWatch
//!
//! Monthly vegetation index maps for the Tequila agave region.
//!
//! The crate composites multispectral imagery from two sensors into monthly
//! median images, derives NDVI and NDRE, optionally masks the result to
//! agricultural land, and publishes colorized layers as XYZ tile URL
//! templates. An axum server exposes the maps over HTTP.
//!
//! ## Architecture
//!
//! - [`models`]: grids, imagery records, sensors, date ranges, styles, vector layers
//! - [`pipeline`]: harmonization, spectral indices, median compositing, masking, rendering
//! - [`compute`]: the [`compute::ComputeBackend`] trait and the in-memory local backend
//! - [`services`]: map variants built on top of the pipeline and the backend
//! - [`config`]: TOML configuration with environment overrides
//! - [`http`]: Axum-based HTTP server and request handlers
//!
//! ## Performance
//!
//! Compositing and rendering run on tokio's blocking pool; per-pixel work is
//! spread across rows with rayon.

pub mod compute;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;

pub use error::{PipelineError, PipelineResult};
