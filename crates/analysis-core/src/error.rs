use thiserror::Error;

/// Every way a call to the analysis service can fail below the envelope level.
///
/// Network errors, timeouts, non-2xx statuses and undecodable bodies all end up
/// here so callers only ever see one error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("API Request Failed: {0}")]
    Network(String),

    #[error("API Request Failed: request timed out after {0} ms")]
    Timeout(u64),

    #[error("API Request Failed: {message}")]
    Status { status: u16, message: String },

    #[error("API Request Failed: invalid JSON response: {0}")]
    Decode(String),

    #[error("API Request Failed: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// HTTP status code, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout(_))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
