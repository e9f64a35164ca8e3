//! Mapping of workflow errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ragcurate_shared::RagCurateError;

/// Error returned by request handlers.
#[derive(Debug)]
pub enum WebError {
    /// A workflow or storage failure.
    Curation(RagCurateError),
    /// A required form field was missing or malformed.
    BadRequest(String),
}

impl From<RagCurateError> for WebError {
    fn from(err: RagCurateError) -> Self {
        Self::Curation(err)
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            Self::Curation(err) if err.is_not_found() => {
                tracing::warn!(error = %err, "lookup failed");
                (StatusCode::NOT_FOUND, err.to_string()).into_response()
            }
            Self::Curation(err) => {
                tracing::error!(error = %err, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            Self::BadRequest(message) => {
                tracing::warn!(%message, "bad request");
                (StatusCode::BAD_REQUEST, message).into_response()
            }
        }
    }
}

pub type WebResult<T> = std::result::Result<T, WebError>;
