use serde::Deserialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Failures talking to the junction service.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// The request was refused locally before anything was sent.
    #[error("{0}")]
    Validation(String),

    /// The request never produced a response (connect, DNS, timeout).
    #[error("request failed: {0}")]
    Transport(String),

    /// The service answered with a non-2xx status.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// The service answered 2xx with a body that could not be decoded.
    #[error("invalid response format: {0}")]
    Parse(String),
}

impl ApiError {
    /// Builds a [`ApiError::Server`] from a failed response body, preferring
    /// the service's own `error` message over `fallback`.
    pub fn from_body(status: u16, body: &str, fallback: &str) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody {
            error: Option<String>,
        }

        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.error)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());

        ApiError::Server { status, message }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Server { status: 404, .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Parse(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}
