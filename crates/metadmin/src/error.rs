//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and process exit codes.

use miette::Diagnostic;
use thiserror::Error;

use metadmin_config::ConfigError;
use metadmin_core::{CoreError, FailureKind, FieldError};

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Backend ──────────────────────────────────────────────────────

    #[error("Something went wrong: {message}")]
    #[diagnostic(
        code(metadmin::request_failed),
        help("Check that the backend is reachable (--host/--port) and try again.")
    )]
    RequestFailed { message: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(metadmin::auth_failed),
        help("Sign in again with: metadmin login")
    )]
    AuthFailed { message: String },

    #[error("Not signed in")]
    #[diagnostic(
        code(metadmin::not_authenticated),
        help("Run: metadmin login --profile {profile}")
    )]
    NotAuthenticated { profile: String },

    // ── Navigation ───────────────────────────────────────────────────

    #[error("{message}")]
    #[diagnostic(
        code(metadmin::not_recognized),
        help("Run: metadmin services to see available services and entities")
    )]
    NotRecognized { message: String },

    #[error("{entity} '{id}' not found")]
    #[diagnostic(
        code(metadmin::not_found),
        help("Run: metadmin list {service} {entity_name} to see available records")
    )]
    NotFound {
        entity: String,
        service: String,
        entity_name: String,
        id: String,
    },

    // ── Validation ───────────────────────────────────────────────────

    #[error("{count} field(s) rejected:\n{details}")]
    #[diagnostic(
        code(metadmin::invalid_form),
        help("Run: metadmin fields {service} {entity} to see field kinds and requirements")
    )]
    InvalidForm {
        count: usize,
        details: String,
        service: String,
        entity: String,
    },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(metadmin::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("No metadata file configured for profile '{profile}'")]
    #[diagnostic(
        code(metadmin::no_metadata),
        help(
            "Pass --metadata <PATH>, or run:\n\
             metadmin config set metadata /path/to/app.json"
        )
    )]
    NoMetadata { profile: String },

    #[error("Invalid metadata: {message}")]
    #[diagnostic(
        code(metadmin::metadata),
        help("Check the metadata file and the profile's overrides.")
    )]
    Metadata { message: String },

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(metadmin::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: metadmin config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Session storage failed: {message}")]
    #[diagnostic(code(metadmin::session_storage))]
    SessionStorage { message: String },

    #[error(transparent)]
    #[diagnostic(code(metadmin::config))]
    Config(Box<ConfigError>),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(metadmin::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthFailed { .. } | Self::NotAuthenticated { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::NotRecognized { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::InvalidForm { .. } | Self::NoMetadata { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }

    /// A view's error panel. An expired session is an auth failure.
    pub fn request_failed(message: String, failure: Option<FailureKind>) -> Self {
        match failure {
            Some(FailureKind::AuthExpired) => Self::AuthFailed { message },
            _ => Self::RequestFailed { message },
        }
    }

    /// Error for a form rejected before any request was issued.
    pub fn invalid_form(service: &str, entity: &str, errors: &[FieldError]) -> Self {
        Self::InvalidForm {
            count: errors.len(),
            details: errors
                .iter()
                .map(|e| format!("  {}: {e}", e.field))
                .collect::<Vec<_>>()
                .join("\n"),
            service: service.into(),
            entity: entity.into(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Request {
                message,
                status: Some(401),
            } => Self::AuthFailed { message },
            CoreError::Request { message, .. } => Self::RequestFailed { message },
            CoreError::UnknownEntity { service, entity } => Self::NotRecognized {
                message: format!("Entity '{entity}' not recognized in service '{service}'"),
            },
            CoreError::Validation { message } => Self::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::SessionStorage { message } => Self::SessionStorage { message },
            other => Self::Metadata {
                message: other.to_string(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Core(core) => core.into(),
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(Box::new(other)),
        }
    }
}
