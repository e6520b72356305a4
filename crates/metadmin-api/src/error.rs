use thiserror::Error;

/// Top-level error type for the `metadmin-api` crate.
///
/// Covers the four failure kinds a backend call can end in: transport
/// failures, non-2xx responses with or without a structured body, logical
/// failures reported inside a successful envelope, and local failures
/// (bad URLs, undecodable bodies, unencodable query values).
/// `metadmin-core` collapses all of them into a single display string.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The session token could not be turned into a header, or the
    /// authenticate endpoint answered without a token.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Backend ─────────────────────────────────────────────────────
    /// Non-2xx response. `message` is the body's `error` field when the
    /// backend sent one.
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("no error body"))]
    HttpStatus { status: u16, message: Option<String> },

    /// The envelope carried a non-empty `error`, regardless of HTTP status.
    #[error("Backend error: {message}")]
    Envelope {
        message: String,
        status_code: Option<u16>,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// A query parameter value could not be JSON-encoded.
    #[error("Failed to encode query parameter '{key}': {source}")]
    QueryEncoding {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A request body could not be serialized.
    #[error("Failed to encode request body: {0}")]
    BodyEncoding(#[source] serde_json::Error),
}

impl Error {
    /// The single human-readable string surfaced to callers.
    ///
    /// Structured backend messages are passed through verbatim; a non-2xx
    /// response without one falls back to a generic status message; every
    /// other failure uses its display form.
    pub fn user_message(&self) -> String {
        match self {
            Self::Envelope { message, .. }
            | Self::HttpStatus {
                message: Some(message),
                ..
            } => message.clone(),
            Self::HttpStatus {
                status,
                message: None,
            } => format!("Request failed with status code {status}"),
            Self::Transport(e) => e.to_string(),
            other => other.to_string(),
        }
    }

    /// Returns `true` for a 401-style failure. There is no automatic
    /// re-login; callers surface this like any other failure.
    pub fn is_auth_expired(&self) -> bool {
        match self {
            Self::Authentication { .. } => true,
            Self::HttpStatus { status, .. } => *status == 401,
            Self::Envelope { status_code, .. } => *status_code == Some(401),
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::UNAUTHORIZED),
            _ => false,
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::HttpStatus { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::HttpStatus { status: 404, .. } => true,
            Self::Envelope { status_code, .. } => *status_code == Some(404),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_http_error_passes_message_through() {
        let err = Error::HttpStatus {
            status: 500,
            message: Some("x".into()),
        };
        assert_eq!(err.user_message(), "x");
    }

    #[test]
    fn bare_http_error_falls_back_to_status_message() {
        let err = Error::HttpStatus {
            status: 502,
            message: None,
        };
        assert_eq!(err.user_message(), "Request failed with status code 502");
        assert!(err.is_transient());
    }

    #[test]
    fn envelope_error_is_verbatim() {
        let err = Error::Envelope {
            message: "x".into(),
            status_code: Some(200),
        };
        assert_eq!(err.user_message(), "x");
        assert!(!err.is_auth_expired());
    }

    #[test]
    fn unauthorized_is_auth_expired() {
        let err = Error::HttpStatus {
            status: 401,
            message: Some("token expired".into()),
        };
        assert!(err.is_auth_expired());
        assert!(!err.is_not_found());
    }
}
