use std::time::Duration;

use thiserror::Error;

/// Session and token lifecycle error types
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No access token available")]
    NoToken,

    #[error("Access token expired and no refresh token is stored")]
    MissingRefreshToken,

    #[error("Token refresh failed: {reason}")]
    RefreshFailed {
        status: Option<reqwest::StatusCode>,
        reason: String,
    },

    #[error("Token expired or invalid (401)")]
    Unauthorized,

    #[error("HTTP error {status}: {body_snippet}")]
    Http {
        status: reqwest::StatusCode,
        body_snippet: String,
    },

    #[error("Login rejected ({status}): {message}")]
    LoginRejected {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("JSON serialization/deserialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Token store is corrupted or the passphrase is wrong")]
    CorruptedStore,

    #[error("Token store is locked by another process")]
    LockTimeout,

    #[error("No passphrase available to unlock the token store")]
    PassphraseUnavailable,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl AuthError {
    /// Whether this error means the server no longer accepts the session.
    ///
    /// A refresh rejected with 401 counts: the refresh token itself is dead.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Unauthorized => true,
            Self::RefreshFailed { status, .. } => {
                *status == Some(reqwest::StatusCode::UNAUTHORIZED)
            }
            _ => false,
        }
    }

    /// Remote error with the body cut down to a snippet
    pub fn http(status: reqwest::StatusCode, body: &str) -> Self {
        Self::Http {
            status,
            body_snippet: snippet(body),
        }
    }
}

/// First 200 characters of a response body, for error messages.
pub(crate) fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}

pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_classification() {
        assert!(AuthError::Unauthorized.is_unauthorized());
        assert!(
            AuthError::RefreshFailed {
                status: Some(reqwest::StatusCode::UNAUTHORIZED),
                reason: "token_not_valid".to_string(),
            }
            .is_unauthorized()
        );
        assert!(
            !AuthError::RefreshFailed {
                status: None,
                reason: "connection refused".to_string(),
            }
            .is_unauthorized()
        );
        assert!(!AuthError::NoToken.is_unauthorized());
        assert!(!AuthError::http(reqwest::StatusCode::BAD_GATEWAY, "oops").is_unauthorized());
    }

    #[test]
    fn test_http_error_truncates_body() {
        let body = "x".repeat(500);
        match AuthError::http(reqwest::StatusCode::INTERNAL_SERVER_ERROR, &body) {
            AuthError::Http { body_snippet, .. } => assert_eq!(body_snippet.len(), 200),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
