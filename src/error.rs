use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing OPENROUTER_API_KEY (or pass --token)")]
    MissingToken,
    #[error("invalid API URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("token contains characters not allowed in an HTTP header")]
    InvalidToken,
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request failed: {0}")]
    Network(#[source] reqwest::Error),
    #[error("authentication failed ({status}): {body}")]
    Unauthorized { status: StatusCode, body: String },
    #[error("API request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("response is not valid JSON: {source}; body: {body}")]
    Parse {
        #[source]
        source: serde_json::Error,
        body: String,
    },
}

impl FetchError {
    /// Stable short code, suitable for logs and scripts.
    pub fn code(&self) -> &'static str {
        match self {
            FetchError::InvalidToken => "invalid_token",
            FetchError::Client(_) => "client_error",
            FetchError::Network(_) => "upstream_error",
            FetchError::Unauthorized { .. } => "unauthorized",
            FetchError::Status { status, .. } => match *status {
                StatusCode::BAD_REQUEST => "bad_request",
                StatusCode::NOT_FOUND => "not_found",
                StatusCode::TOO_MANY_REQUESTS => "rate_limited",
                s if s.is_server_error() => "upstream_error",
                _ => "server_error",
            },
            FetchError::Parse { .. } => "parse_error",
        }
    }

    pub fn retriable(&self) -> bool {
        match self {
            FetchError::Network(_) => true,
            FetchError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }
}
