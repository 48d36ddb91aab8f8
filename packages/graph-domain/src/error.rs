//! The single error taxonomy shared by every adapter and the HTTP layer.
//!
//! Adapters translate back-end-specific failures into one of these variants;
//! nothing above this module ever inspects a driver's own error type.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

/// Language-neutral error kinds from spec §7.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("engine '{0}' is not available")]
    EngineNotAvailable(String),

    #[error("operation not supported on this engine: {0}")]
    NotSupported(String),

    #[error("impact depth {0} is outside the allowed range [1,20]")]
    DepthLimitExceeded(i64),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("internal error")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl GraphError {
    /// Short machine-readable kind, used verbatim as the `error` field of the
    /// JSON error body and for log grouping.
    pub fn kind(&self) -> &'static str {
        match self {
            GraphError::Invalid(_) => "Invalid",
            GraphError::NotFound(_) => "NotFound",
            GraphError::Conflict(_) => "Conflict",
            GraphError::EngineNotAvailable(_) => "EngineNotAvailable",
            GraphError::NotSupported(_) => "NotSupported",
            GraphError::DepthLimitExceeded(_) => "DepthLimitExceeded",
            GraphError::StoreUnavailable(_) => "StoreUnavailable",
            GraphError::Internal(_) => "Internal",
        }
    }

    /// HTTP status code for this error, per spec §7.
    pub fn status_code(&self) -> u16 {
        match self {
            GraphError::Invalid(_)
            | GraphError::EngineNotAvailable(_)
            | GraphError::NotSupported(_)
            | GraphError::DepthLimitExceeded(_) => 400,
            GraphError::NotFound(_) => 404,
            GraphError::Conflict(_) => 409,
            GraphError::StoreUnavailable(_) => 503,
            GraphError::Internal(_) => 500,
        }
    }

    /// Whether a response for this error is safe to cache. Invalid/NotFound
    /// results are not cached (the input might be retried differently);
    /// StoreUnavailable is not cached so recovery stays cheap, per spec §7.
    pub fn is_cacheable_failure(&self) -> bool {
        false
    }

    pub fn internal(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        GraphError::Internal(Box::new(err))
    }
}
