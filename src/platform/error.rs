//! Errors from the platform API client

pub type Result<T> = std::result::Result<T, PlatformError>;

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// HTTP request failed.
    #[error("platform request failed: {message}")]
    Http {
        message: String,
        status: Option<u16>,
    },

    /// Invalid response body.
    #[error("invalid platform response: {0}")]
    InvalidResponse(String),

    /// A paged listing could not be completed.
    #[error(transparent)]
    Paging(#[from] reconcile::Error),
}

impl PlatformError {
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Http {
            message: message.into(),
            status,
        }
    }

    /// HTTP status of the failed request, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => *status,
            _ => None,
        }
    }

    /// Transport failures and 5xx answers are worth retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status: None, .. } => true,
            Self::Http {
                status: Some(code), ..
            } => *code >= 500,
            _ => false,
        }
    }
}

impl From<ureq::Error> for PlatformError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Http {
                message: format!("HTTP {code}"),
                status: Some(code),
            },
            other => Self::Http {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for PlatformError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
