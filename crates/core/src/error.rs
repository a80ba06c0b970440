//! Unified error types for vidrelay.
//!
//! Display strings carry a stable upper-case code prefix so log lines and
//! diagnostic bodies stay greppable.

/// Unified error types for the vidrelay components.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., missing page URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Network failure or non-success HTTP status from upstream.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// Upstream did not answer within the configured timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Markup extraction failed.
    #[error("EXTRACT_FAILED: {0}")]
    ExtractFailed(String),

    /// The relay could not reach the upstream resource.
    #[error("RELAY_FAILED: {0}")]
    RelayFailed(String),

    /// Work was cancelled before it produced a value.
    #[error("CANCELLED")]
    Cancelled,
}

impl Error {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::HttpError(_) => "HTTP_ERROR",
            Error::FetchTimeout(_) => "FETCH_TIMEOUT",
            Error::ExtractFailed(_) => "EXTRACT_FAILED",
            Error::RelayFailed(_) => "RELAY_FAILED",
            Error::Cancelled => "CANCELLED",
        }
    }

    /// Whether the failure came from talking to the upstream origin.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Error::HttpError(_) | Error::FetchTimeout(_) | Error::RelayFailed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::HttpError("status 503".to_string());
        assert!(err.to_string().contains("HTTP_ERROR"));
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_error_code_matches_prefix() {
        let errors = [
            Error::InvalidInput("x".into()),
            Error::InvalidUrl("x".into()),
            Error::HttpError("x".into()),
            Error::FetchTimeout("x".into()),
            Error::ExtractFailed("x".into()),
            Error::RelayFailed("x".into()),
            Error::Cancelled,
        ];
        for err in errors {
            assert!(err.to_string().starts_with(err.code()));
        }
    }

    #[test]
    fn test_is_upstream() {
        assert!(Error::FetchTimeout("8s".into()).is_upstream());
        assert!(Error::RelayFailed("refused".into()).is_upstream());
        assert!(!Error::Cancelled.is_upstream());
        assert!(!Error::InvalidInput("url".into()).is_upstream());
    }
}
