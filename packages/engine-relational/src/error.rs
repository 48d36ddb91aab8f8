use graph_domain::GraphError;

/// Translate a `sqlx` failure into the shared taxonomy. Pool exhaustion and
/// connection failures become `StoreUnavailable` (503, retryable); a
/// constraint violation on create becomes `Conflict`; everything else is
/// `Internal` and logged with full detail server-side only.
pub fn map_driver_error(err: sqlx::Error) -> GraphError {
    match &err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            GraphError::StoreUnavailable("postgres connection unavailable".to_string())
        }
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            GraphError::Conflict(db_err.message().to_string())
        }
        sqlx::Error::Database(db_err)
            if db_err.code().is_some_and(|c| c.starts_with("42")) =>
        {
            // SQLSTATE class 42 (syntax error / access rule violation) — the
            // caller's own query text is malformed, not a server fault.
            GraphError::Invalid(format!("invalid query: {}", db_err.message()))
        }
        other => GraphError::internal(DriverError(other.to_string())),
    }
}

#[derive(Debug, thiserror::Error)]
#[error("postgres driver error: {0}")]
struct DriverError(String);
