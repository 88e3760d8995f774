//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use marquee_config::ConfigError;
use marquee_core::{CoreError, FieldErrors};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the catalog API at {url}")]
    #[diagnostic(
        code(marquee::connection_failed),
        help(
            "Check that the API is running and the URL is right.\n\
             Reason: {reason}\n\
             Self-signed staging backends need --insecure (-k)."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(marquee::timeout),
        help("Increase the timeout with --timeout or check API responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(marquee::auth_failed),
        help(
            "Verify the profile's API key or password.\n\
             Run: marquee config set-token"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(marquee::no_credentials),
        help(
            "Configure credentials with: marquee config init\n\
             Or set the MARQUEE_API_KEY environment variable."
        )
    )]
    NoCredentials { profile: String },

    #[error("You do not have permission to {action} {resource}")]
    #[diagnostic(
        code(marquee::permission_denied),
        help("Run: marquee whoami to see the grants of the signed-in account.")
    )]
    PermissionDenied { action: String, resource: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource} not found: {identifier}")]
    #[diagnostic(
        code(marquee::not_found),
        help("Run: marquee {resource}s list to see available records.")
    )]
    NotFound {
        resource: String,
        identifier: String,
    },

    #[error("API error: {message}")]
    #[diagnostic(code(marquee::api_error))]
    ApiError { message: String },

    #[error("Upload failed: {message}")]
    #[diagnostic(code(marquee::upload_failed))]
    UploadFailed { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(marquee::validation))]
    Validation { field: String, reason: String },

    #[error("Invalid input: {0}")]
    #[diagnostic(
        code(marquee::invalid_input),
        help("Fix the listed fields and try again.")
    )]
    InvalidFields(FieldErrors),

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(marquee::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: marquee config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(marquee::no_config),
        help(
            "Create one with: marquee config init\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(marquee::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(marquee::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    #[error("Cancelled")]
    Cancelled,

    // ── IO / Internal ────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::PermissionDenied { .. } => exit_code::PERMISSION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. }
            | Self::InvalidFields(_)
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::NotSignedIn => Self::AuthFailed {
                message: "not signed in".into(),
            },
            CoreError::Timeout => Self::Timeout,
            CoreError::NotFound {
                resource,
                identifier,
            } => Self::NotFound {
                resource,
                identifier,
            },
            CoreError::Validation(errors) => Self::InvalidFields(errors),
            CoreError::UnsupportedMediaType { file, mime } => Self::Validation {
                field: file,
                reason: format!("file type '{mime}' is not accepted"),
            },
            CoreError::UploadFailed { file, message } => Self::UploadFailed {
                message: format!("{file}: {message}"),
            },
            CoreError::Api { message, .. } => Self::ApiError { message },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Io(e) => Self::Io(e),
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(other),
        }
    }
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}
