// ── Core error types ──
//
// User-facing errors from marquee-core. Consumers never see HTTP status
// codes or JSON parse failures directly; `From<marquee_api::Error>`
// translates transport-layer failures into domain variants.

use thiserror::Error;

use crate::validate::FieldErrors;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach catalog API at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{resource} not found: {identifier}")]
    NotFound {
        resource: String,
        identifier: String,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Unsupported file type '{mime}' for {file}")]
    UnsupportedMediaType { file: String, mime: String },

    #[error("Upload failed for {file}: {message}")]
    UploadFailed { file: String, message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("{message}")]
    Api {
        message: String,
        /// The API-specific error code (e.g. "conflict").
        code: Option<String>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether signing in again could clear this error.
    pub fn requires_sign_in(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. } | Self::NotSignedIn)
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<marquee_api::Error> for CoreError {
    fn from(err: marquee_api::Error) -> Self {
        match err {
            marquee_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            marquee_api::Error::SessionExpired => CoreError::AuthenticationFailed {
                message: "Session expired -- sign in again".into(),
            },
            marquee_api::Error::InvalidApiKey => CoreError::AuthenticationFailed {
                message: "Invalid API key".into(),
            },
            marquee_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            marquee_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            marquee_api::Error::InvalidRecordId { id } => CoreError::NotFound {
                resource: "record".into(),
                identifier: id,
            },
            marquee_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            marquee_api::Error::Api {
                message,
                code,
                status: 404,
            } => CoreError::NotFound {
                resource: code.unwrap_or_else(|| "resource".into()),
                identifier: message,
            },
            marquee_api::Error::Api {
                message,
                code,
                status,
            } => CoreError::Api {
                message,
                code,
                status: Some(status),
            },
            marquee_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
