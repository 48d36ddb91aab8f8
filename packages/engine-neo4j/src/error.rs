use graph_domain::GraphError;

/// Translate a driver-level failure into the shared taxonomy. Connection and
/// pool-acquire failures become `StoreUnavailable` so the HTTP layer reports
/// 503 (retryable) rather than 500; everything else is `Internal` and gets
/// logged with its full detail server-side, never echoed to the client.
pub fn map_driver_error(err: neo4rs::Error) -> GraphError {
    match &err {
        neo4rs::Error::ConnectionError => {
            GraphError::StoreUnavailable("neo4j connection failed".to_string())
        }
        neo4rs::Error::UnexpectedMessage(msg) | neo4rs::Error::UnsupportedVersion(msg) => {
            GraphError::internal(DriverError(msg.clone()))
        }
        other => GraphError::internal(DriverError(other.to_string())),
    }
}

#[derive(Debug, thiserror::Error)]
#[error("neo4j driver error: {0}")]
struct DriverError(String);
