use reqwest::StatusCode;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out, please check your connection")]
    Timeout,

    #[error("Device not found: {0}")]
    NotFound(String),

    #[error("Backend failure: {0}")]
    Backend(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("No data received for device {0}")]
    EmptyResult(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, FetchError>;

impl FetchError {
    /// Maps a non-success HTTP status and the server's explanation onto the
    /// error taxonomy.
    pub fn from_status(status: StatusCode, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match status {
            StatusCode::NOT_FOUND => FetchError::NotFound(detail),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => FetchError::Validation(detail),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => FetchError::Timeout,
            _ => FetchError::Backend(format!("HTTP error! status: {} {}", status.as_u16(), detail).trim_end().to_string()),
        }
    }

    /// Whether the failure happened before the backend answered.
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Network(_) | FetchError::Timeout)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_decode() {
            FetchError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::from_status(status, String::new())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Malformed(err.to_string())
    }
}
