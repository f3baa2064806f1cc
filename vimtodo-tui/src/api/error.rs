use reqwest::StatusCode;

/// Failure of a call against vimtodo-api, reduced to what the UI reports.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Session expired or invalid. Run `vimtodo login` to authenticate.")]
    Unauthorized,

    #[error("Task not found. It may have been deleted elsewhere.")]
    NotFound,

    #[error("Server returned HTTP {0}")]
    Status(u16),

    #[error("Unexpected response from server: {0}")]
    Decode(String),
}

impl ClientError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized,
            StatusCode::NOT_FOUND => Self::NotFound,
            other => Self::Status(other.as_u16()),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_status(status)
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_map_to_the_error_taxonomy() {
        assert_eq!(
            ClientError::from_status(StatusCode::UNAUTHORIZED),
            ClientError::Unauthorized
        );
        assert_eq!(
            ClientError::from_status(StatusCode::NOT_FOUND),
            ClientError::NotFound
        );
        assert_eq!(
            ClientError::from_status(StatusCode::INTERNAL_SERVER_ERROR),
            ClientError::Status(500)
        );
        assert_eq!(
            ClientError::Status(502).to_string(),
            "Server returned HTTP 502"
        );
    }
}
