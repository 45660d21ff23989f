//! Structured errors for the sheetview HTTP surface.
//!
//! Sheet loading failures never reach this layer; they are rendered as a
//! banner on the page. Only request validation and template failures do.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Structured errors for the sheetview server.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// Invalid request parameters (e.g., oversized search query).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The page template failed to render.
    #[error("RENDER_FAILED: {0}")]
    Render(#[from] minijinja::Error),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            WebError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, self.to_string()).into_response()
    }
}
