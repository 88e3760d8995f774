// ── Runtime connection configuration ──
//
// These types describe *how* to reach the catalog API and how the
// orchestration layer behaves. They carry credential data and tuning but
// never touch disk; the CLI builds a `DashboardConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// How to authenticate with the catalog API.
#[derive(Debug, Clone)]
pub enum AuthCredentials {
    /// Static service key (`X-API-KEY`). No token rotation.
    ApiKey(SecretString),
    /// Email + password exchanged for rotating bearer tokens.
    Password {
        email: String,
        password: SecretString,
    },
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (local staging backends).
    DangerAcceptInvalid,
}

/// Configuration for one dashboard connection.
///
/// Built by the CLI, passed to [`Dashboard`](crate::Dashboard) -- core
/// never reads config files.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// API root (e.g. `https://catalog.example.com/api`).
    pub url: Url,
    /// Authentication method and credentials.
    pub auth: AuthCredentials,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// Rows per page when the URL does not say otherwise.
    pub default_page_size: u64,
    /// Largest page size a URL may request.
    pub max_page_size: u64,
    /// How often the session (and bearer token) is refreshed. Zero disables
    /// the background refresh.
    pub session_refresh_interval: Duration,
    /// MIME types accepted by the upload pipeline (`image/*` style
    /// wildcards allowed).
    pub upload_accept: Vec<String>,
}

impl DashboardConfig {
    /// Config with library defaults for everything but the endpoint and
    /// credentials.
    pub fn new(url: Url, auth: AuthCredentials) -> Self {
        Self {
            url,
            auth,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            default_page_size: 10,
            max_page_size: 100,
            session_refresh_interval: Duration::from_secs(15 * 60),
            upload_accept: vec!["image/*".into(), "video/*".into()],
        }
    }
}
