//! Errors raised by compute backends.

/// Result type for compute backend operations
pub type ComputeResult<T> = Result<T, ComputeError>;

#[derive(Debug, thiserror::Error)]
pub enum ComputeError {
    /// No collection, asset or map layer is registered under `id`.
    #[error("Unknown {kind} '{id}'")]
    NotFound { kind: &'static str, id: String },

    /// Catalog data the backend cannot load. `origin` names the catalog file,
    /// record or asset at fault.
    #[error("Invalid {origin}: {message}")]
    Configuration { origin: String, message: String },

    #[error("Internal compute error: {0}")]
    Internal(String),
}

impl ComputeError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn configuration(origin: impl Into<String>, message: impl ToString) -> Self {
        Self::Configuration {
            origin: origin.into(),
            message: message.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
