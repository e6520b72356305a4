// ── Core error types ──
//
// Errors raised while building the metadata registry, resolving routes,
// persisting sessions, and rendering views. Backend call failures are
// normalized through `From<metadmin_api::Error>` so view code only ever
// sees a display message.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Metadata errors ──────────────────────────────────────────────
    #[error("Unknown field kind '{name}'")]
    UnknownFieldKind { name: String },

    #[error("Field '{field}' does not exist on entity '{entity}'")]
    MissingField { entity: String, field: String },

    #[error("Invalid list column '{column}' for entity '{entity}': no such field")]
    InvalidColumn { entity: String, column: String },

    #[error("Primary key of entity '{entity}' cannot be {action}")]
    PrimaryKey { entity: String, action: &'static str },

    #[error("Service '{name}' is already registered")]
    DuplicateService { name: String },

    #[error("Entity '{entity}' is already registered in service '{service}'")]
    DuplicateEntity { service: String, entity: String },

    #[error("Unknown entity '{entity}' in service '{service}'")]
    UnknownEntity { service: String, entity: String },

    #[error("Invalid metadata: {message}")]
    Metadata { message: String },

    // ── Session errors ───────────────────────────────────────────────
    #[error("Session storage error: {message}")]
    SessionStorage { message: String },

    // ── Form errors ──────────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    // ── Backend errors (normalized to a display message) ─────────────
    #[error("{message}")]
    Request {
        message: String,
        /// HTTP or envelope status code, when the backend supplied one.
        status: Option<u16>,
    },
}

impl CoreError {
    /// The text a view shows the user for this failure.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<metadmin_api::Error> for CoreError {
    fn from(err: metadmin_api::Error) -> Self {
        let status = match &err {
            metadmin_api::Error::HttpStatus { status, .. } => Some(*status),
            metadmin_api::Error::Envelope { status_code, .. } => *status_code,
            metadmin_api::Error::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
        .or_else(|| err.is_auth_expired().then_some(401));
        CoreError::Request {
            message: err.user_message(),
            status,
        }
    }
}

impl From<toml::de::Error> for CoreError {
    fn from(err: toml::de::Error) -> Self {
        CoreError::Metadata {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Metadata {
            message: err.to_string(),
        }
    }
}
