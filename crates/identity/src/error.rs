//! Error types for identity-service operations.
//!
//! Errors are categorized so callers can tell a rejected account (bad input,
//! skip it) from an unreachable service (fatal for the run).

use std::fmt;

/// Result type alias for identity operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of identity errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network-related errors (transient, retryable).
    Network,
    /// The request itself was invalid.
    Validation,
    /// The service answered with something unexpected.
    Format,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Identity service unreachable",
            Self::Validation => "Invalid account data",
            Self::Format => "Unexpected identity service response",
            Self::Other => "Unexpected error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur during identity-service operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required account field was empty.
    #[error("cannot create account {username:?}: {field} is required")]
    MissingField {
        /// Empty field name.
        field: &'static str,
        /// Account being created.
        username: String,
    },

    /// HTTP request failed.
    #[error("identity service request failed: {message}")]
    Http {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// The service refused to create the account.
    #[error("identity service rejected account {username}: {message}")]
    Rejected {
        /// Account being created.
        username: String,
        /// Reason given.
        message: String,
    },

    /// Invalid response from the service.
    #[error("invalid identity service response: {0}")]
    InvalidResponse(String),

    /// Listing could not be completed.
    #[error(transparent)]
    Paging(#[from] reconcile::Error),
}

impl Error {
    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Http {
            message: message.into(),
            status,
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::MissingField { .. } | Error::Rejected { .. } => ErrorCategory::Validation,
            Error::Http {
                status: Some(400..=499),
                ..
            } => ErrorCategory::Validation,
            Error::Http { .. } => ErrorCategory::Network,
            Error::InvalidResponse(_) => ErrorCategory::Format,
            Error::Paging(_) => ErrorCategory::Other,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

impl From<ureq::Error> for Error {
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

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_display() {
        let err = Error::MissingField {
            field: "email",
            username: "alice".into(),
        };
        assert_eq!(
            err.to_string(),
            "cannot create account \"alice\": email is required"
        );
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_http_category_by_status() {
        assert_eq!(
            Error::http("conflict", Some(409)).category(),
            ErrorCategory::Validation
        );
        assert!(Error::http("bad gateway", Some(502)).is_retryable());
        assert!(Error::http("connection reset", None).is_retryable());
    }

    #[test]
    fn test_from_serde_error() {
        let err: Error = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert_eq!(err.category(), ErrorCategory::Format);
    }
}
