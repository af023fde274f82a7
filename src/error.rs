use thiserror::Error;

pub type Result<T> = std::result::Result<T, GenError>;

#[derive(Debug, Error)]
pub enum GenError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to send HTTP request: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API request failed with status {status}: {message}")]
    Service { status: u16, message: String },

    #[error("Malformed API response: {0}")]
    MalformedResponse(String),
}

impl GenError {
    /// Whether a caller could reasonably retry the same request.
    ///
    /// Timeouts, refused connections, rate limiting and server-side failures
    /// count as transient; bad credentials, rejected requests and unparseable
    /// replies do not.
    pub fn is_transient(&self) -> bool {
        match self {
            GenError::Network(e) => e.is_timeout() || e.is_connect(),
            GenError::Service { status, .. } => *status == 429 || *status >= 500,
            GenError::Config(_) | GenError::MalformedResponse(_) => false,
        }
    }
}
