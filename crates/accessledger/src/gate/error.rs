use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Errors surfaced to HTTP callers.
///
/// Hidden, unauthorized and missing paths all map to [`GateError::NotFound`]
/// so callers cannot tell them apart.
#[derive(Debug, Error)]
pub enum GateError {
    /// Identity is not in the permission table.
    #[error("user '{0}' is forbidden")]
    Forbidden(String),

    /// Path does not exist or may not be disclosed.
    #[error("not found")]
    NotFound,

    /// Filesystem failure while serving an authorized path.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Io(e) => {
                error!("failed to serve request: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        status.into_response()
    }
}
