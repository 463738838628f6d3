//! Error types for the `AeroFeedback` client

use thiserror::Error;

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while talking to the backend
#[derive(Error, Debug)]
pub enum ClientError {
    /// The backend answered with a non-2xx status
    #[error("{message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Server-supplied message, or the call's fallback
        message: String,
    },

    /// The request did not complete in time
    #[error("Request timed out")]
    Timeout,

    /// The backend could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// A retried deletion approval gave up
    #[error(transparent)]
    Approval(#[from] ApprovalFailure),

    /// A successful response lacked the expected payload field
    #[error("Response is missing the `{field}` field")]
    MissingField {
        /// Field name
        field: &'static str,
    },

    /// No session token is stored
    #[error("Not logged in")]
    Unauthenticated,

    /// The caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,

    /// Reading or writing the session token failed
    #[error("Token storage error: {0}")]
    TokenStore(String),

    /// Other HTTP client error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error from the core crate (validation, export, configuration)
    #[error(transparent)]
    Core(#[from] aerofeedback_core::Error),
}

/// Terminal outcomes of a deletion approval that ran out of options.
///
/// Each carries a fixed message meant to be shown to the user as-is.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalFailure {
    /// Every attempt timed out
    #[error("The server is taking too long to respond. Please try again later.")]
    TimedOut,

    /// Every attempt ended in HTTP 500
    #[error(
        "The server encountered an error while approving the deletion request. Please try again later."
    )]
    ServerError,

    /// The health probe or the connection failed
    #[error("Unable to connect to the server. Please check your network connection and try again.")]
    NetworkUnreachable,
}

impl ClientError {
    /// Create an API error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Classify a transport-level `reqwest` failure
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Network(err.to_string())
        } else {
            Self::Http(err)
        }
    }

    /// HTTP status for API errors
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the deletion-approval loop may try again after this error.
    /// Only timeouts and HTTP 500 qualify.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Api { status: 500, .. })
    }

    /// Text suitable for showing to an end user
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => ApprovalFailure::NetworkUnreachable.to_string(),
            Self::Timeout => ApprovalFailure::TimedOut.to_string(),
            Self::Http(_) | Self::Json(_) => {
                "An unexpected error occurred. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_api_error_displays_server_message_verbatim() {
        let err = ClientError::api(403, "Only administrators can approve deletions");
        assert_eq!(err.to_string(), "Only administrators can approve deletions");
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn test_error_retryable() {
        assert!(ClientError::Timeout.is_retryable());
        assert!(ClientError::api(500, "boom").is_retryable());

        assert!(!ClientError::api(502, "bad gateway").is_retryable());
        assert!(!ClientError::api(404, "missing").is_retryable());
        assert!(!ClientError::Network("refused".to_string()).is_retryable());
        assert!(!ClientError::Unauthenticated.is_retryable());
    }

    #[test]
    fn test_approval_messages_are_distinct() {
        let messages = [
            ClientError::from(ApprovalFailure::TimedOut).to_string(),
            ClientError::from(ApprovalFailure::ServerError).to_string(),
            ClientError::from(ApprovalFailure::NetworkUnreachable).to_string(),
        ];

        assert!(messages[0].contains("taking too long"));
        assert!(messages[1].contains("encountered an error"));
        assert!(messages[2].contains("network connection"));
        assert_ne!(messages[0], messages[1]);
        assert_ne!(messages[1], messages[2]);
    }

    #[test]
    fn test_user_message() {
        assert_eq!(
            ClientError::api(409, "Form already has a pending deletion request").user_message(),
            "Form already has a pending deletion request"
        );
        assert!(
            ClientError::Network("connection refused".to_string())
                .user_message()
                .contains("network connection")
        );
        assert_eq!(ClientError::Unauthenticated.user_message(), "Not logged in");
    }

    #[test]
    fn test_core_error_is_transparent() {
        let err = ClientError::from(aerofeedback_core::Error::NoResponses);
        assert_eq!(err.to_string(), "No responses available to export");
    }
}
