//! Error types for the composition pipeline.
//!
//! An empty period (no imagery for the month and region) is not represented
//! here: the compositor returns an all-no-data [`Composite`](crate::pipeline::Composite)
//! instead.

use crate::compute::ComputeError;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Error type for pipeline operations
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Harmonization requested for a platform with no known band mapping.
    #[error("Unsupported sensor: {0}")]
    UnsupportedSensor(String),

    /// The (year, month) pair does not name a calendar month.
    #[error("Invalid date range: year={year}, month={month} ({reason})")]
    InvalidDateRange {
        year: i32,
        month: i32,
        reason: String,
    },

    /// A record lacks a band required by the current step.
    #[error("Band '{band}' missing from record {record}")]
    MissingBand { band: String, record: String },

    /// Band arrays do not match the grid they were declared on.
    #[error("Shape mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    ShapeMismatch {
        er: usize,
        ec: usize,
        ar: usize,
        ac: usize,
    },

    /// Two rasters that must share a grid do not.
    #[error("Grid mismatch: {0}")]
    GridMismatch(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid visualization style: {0}")]
    InvalidStyle(String),

    /// Process-wide state was read before startup finished building it.
    #[error("{0} not yet initialized")]
    NotInitialized(&'static str),

    /// Startup-time asset loading failed.
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// The compute backend rejected or failed a request.
    #[error(transparent)]
    Upstream(#[from] ComputeError),

    /// Request limit in milliseconds.
    #[error("Pipeline timed out after {0} ms")]
    Timeout(u64),

    #[error("Internal pipeline error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// True for errors caused by the caller's parameters rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidDateRange { .. })
    }
}
