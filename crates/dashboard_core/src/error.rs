use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

/// Failure of one dashboard API call.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("authentication required (status {status})")]
    Unauthorized { status: u16 },
    #[error("HTTP error! status: {status}")]
    Status {
        status: u16,
        message: Option<String>,
    },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl FetchError {
    /// Maps a non-success status: 401 and any redirect mean the session is gone.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        if status == 401 || (300..400).contains(&status) {
            FetchError::Unauthorized { status }
        } else {
            FetchError::Status { status, message }
        }
    }

    pub fn requires_reauth(&self) -> bool {
        matches!(self, FetchError::Unauthorized { .. })
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            FetchError::Unauthorized { .. } => ErrorCode::Unauthorized,
            FetchError::Status { .. } => ErrorCode::Http,
            FetchError::Transport(_) => ErrorCode::Transport,
            FetchError::Decode(_) => ErrorCode::Decode,
        }
    }
}

impl From<&FetchError> for ApiError {
    fn from(value: &FetchError) -> Self {
        let message = match value {
            FetchError::Status {
                status,
                message: Some(detail),
            } => format!("HTTP error! status: {status} ({detail})"),
            other => other.to_string(),
        };
        ApiError::new(value.code(), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_and_redirects_require_reauth() {
        assert!(FetchError::from_status(401, None).requires_reauth());
        assert!(FetchError::from_status(302, None).requires_reauth());
        assert!(FetchError::from_status(307, None).requires_reauth());
        assert!(!FetchError::from_status(403, None).requires_reauth());
        assert!(!FetchError::from_status(500, None).requires_reauth());
    }

    #[test]
    fn status_detail_is_carried_into_api_error() {
        let err = FetchError::from_status(500, Some("bigquery timeout".into()));
        let api: ApiError = (&err).into();
        assert_eq!(api.code, ErrorCode::Http);
        assert_eq!(api.message, "HTTP error! status: 500 (bigquery timeout)");
    }
}
