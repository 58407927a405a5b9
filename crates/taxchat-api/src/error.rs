use taxchat_types::ERROR_BODY_MAX_CHARS;
use thiserror::Error;

/// Failure talking to the assistant backend
#[derive(Debug, Error)]
pub enum ApiError {
    /// Backend answered with a non-success status
    #[error("HTTP {status}: {}", body_excerpt(.body))]
    Http { status: u16, body: String },

    /// Request never produced a response (DNS, refused connection, timeout)
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Base URL cannot be combined with an endpoint path
    #[error("invalid API URL {0}")]
    InvalidUrl(String),

    /// Operation not offered by this client
    #[error("{0} is not supported by this client")]
    Unsupported(&'static str),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

fn body_excerpt(body: &str) -> String {
    body.chars().take(ERROR_BODY_MAX_CHARS).collect()
}

/// Convenience alias used across the client
pub type ApiResult<T> = Result<T, ApiError>;
