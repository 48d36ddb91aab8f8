//! Maps the shared `GraphError` taxonomy onto HTTP responses. This is the
//! only place in the workspace that knows about status codes — adapters and
//! the cache only ever construct `GraphError` values (spec §7's propagation
//! policy).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use graph_domain::GraphError;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

/// Newtype so we can implement `IntoResponse` for a foreign error type.
pub struct ApiError(pub GraphError);

impl From<GraphError> for ApiError {
    fn from(err: GraphError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = ?self.0, "internal error");
        }

        let body = ErrorBody {
            error: self.0.kind(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
