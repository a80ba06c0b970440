//! Errors surfaced to HTTP clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use vidrelay_core::Error;

#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// The `url` query parameter was absent or empty.
    #[error("Missing video URL")]
    MissingUrl,

    /// The upstream media could not be reached.
    #[error("Stream failed: {0}")]
    StreamFailed(String),
}

impl From<Error> for WebError {
    fn from(err: Error) -> Self {
        match err {
            Error::RelayFailed(msg) => WebError::StreamFailed(msg),
            other => WebError::StreamFailed(other.to_string()),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebError::MissingUrl => StatusCode::BAD_REQUEST,
            WebError::StreamFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
