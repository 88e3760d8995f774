//! Configuration for the marquee CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation to `marquee_core::DashboardConfig`. The CLI layers its
//! global flags on top of what this crate resolves.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use marquee_core::{AuthCredentials, DashboardConfig, TlsVerification};

/// Keyring service name under which secrets are stored.
pub const KEYRING_SERVICE: &str = "marquee";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named API profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            page_size: default_page_size(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_page_size() -> u64 {
    10
}

/// A named API profile.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// API root (e.g. "https://catalog.example.com/api").
    pub api: String,

    /// Auth mode: "api-key" or "password".
    #[serde(default = "default_auth_mode")]
    pub auth_mode: String,

    /// API key (plaintext; prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Sign-in email for password auth.
    pub email: Option<String>,

    /// Password (plaintext; prefer keyring).
    pub password: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Skip TLS verification.
    pub insecure: Option<bool>,

    /// Request timeout in seconds.
    pub timeout: Option<u64>,

    /// Rows per page when a listing does not say otherwise.
    pub page_size: Option<u64>,

    /// Largest page size a listing may request.
    pub max_page_size: Option<u64>,

    /// Session refresh interval in seconds (0 disables).
    pub session_refresh_secs: Option<u64>,

    /// MIME allow-list for uploads (`image/*` style wildcards).
    pub upload_accept: Option<Vec<String>>,
}

fn default_auth_mode() -> String {
    "api-key".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "marquee", "marquee").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("marquee");
    p
}

// ── Loading & saving ────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load defaults → `path` → `MARQUEE_*` environment, later layers winning.
///
/// Nested keys use a double underscore:
/// `MARQUEE_PROFILES__DEFAULT__API=https://...`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("MARQUEE_").split("__"));

    Ok(figment.extract()?)
}

/// Load config, returning a default if it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Write config as TOML to the canonical path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(cfg)?)?;
    Ok(())
}

/// Pick a profile: the explicit name, else `default_profile`, else
/// `"default"`.
pub fn select_profile<'a>(
    cfg: &'a Config,
    name: Option<&str>,
) -> Result<(String, &'a Profile), ConfigError> {
    let name = name
        .map(str::to_owned)
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into());
    cfg.profiles
        .get(&name)
        .map(|p| (name.clone(), p))
        .ok_or(ConfigError::UnknownProfile { name })
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(profile_name: &str, kind: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/{kind}"))
}

/// Store a secret (`api-key` or `password`) in the system keyring.
pub fn store_secret(profile_name: &str, kind: &str, secret: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name, kind)?.set_password(secret)?;
    Ok(())
}

/// API key: profile env var → `MARQUEE_API_KEY` → keyring → plaintext.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = profile.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Ok(val) = std::env::var("MARQUEE_API_KEY") {
        return Ok(SecretString::from(val));
    }

    if let Ok(entry) = keyring_entry(profile_name, "api-key") {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    if let Some(ref key) = profile.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Email + password: `MARQUEE_EMAIL`/`MARQUEE_PASSWORD` → keyring →
/// plaintext.
pub fn resolve_password_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<(String, SecretString), ConfigError> {
    let email = profile
        .email
        .clone()
        .or_else(|| std::env::var("MARQUEE_EMAIL").ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;

    if let Ok(pw) = std::env::var("MARQUEE_PASSWORD") {
        return Ok((email, SecretString::from(pw)));
    }

    if let Ok(entry) = keyring_entry(profile_name, "password") {
        if let Ok(pw) = entry.get_password() {
            return Ok((email, SecretString::from(pw)));
        }
    }

    if let Some(ref pw) = profile.password {
        return Ok((email, SecretString::from(pw.clone())));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Resolve `AuthCredentials` from the profile's `auth_mode`.
pub fn resolve_auth(profile: &Profile, profile_name: &str) -> Result<AuthCredentials, ConfigError> {
    match profile.auth_mode.as_str() {
        "" | "api-key" => Ok(AuthCredentials::ApiKey(resolve_api_key(profile, profile_name)?)),
        "password" => {
            let (email, password) = resolve_password_credentials(profile, profile_name)?;
            Ok(AuthCredentials::Password { email, password })
        }
        other => Err(ConfigError::Validation {
            field: "auth_mode".into(),
            reason: format!("expected 'api-key' or 'password', got '{other}'"),
        }),
    }
}

/// Build a `DashboardConfig` from a profile, no CLI overrides.
pub fn profile_to_dashboard_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<DashboardConfig, ConfigError> {
    let url: url::Url = profile.api.parse().map_err(|_| ConfigError::Validation {
        field: "api".into(),
        reason: format!("invalid URL: {}", profile.api),
    })?;

    let auth = resolve_auth(profile, profile_name)?;
    let mut config = DashboardConfig::new(url, auth);

    config.tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.default_page_size = profile.page_size.unwrap_or(defaults.page_size).max(1);
    if let Some(max) = profile.max_page_size {
        config.max_page_size = max.max(config.default_page_size);
    }
    if let Some(secs) = profile.session_refresh_secs {
        config.session_refresh_interval = Duration::from_secs(secs);
    }
    if let Some(ref accept) = profile.upload_accept {
        config.upload_accept.clone_from(accept);
    }
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    fn staging_profile() -> Profile {
        Profile {
            api: "https://staging.example.com/api".into(),
            auth_mode: "password".into(),
            email: Some("ops@example.com".into()),
            password: Some("plaintext-pw".into()),
            insecure: Some(true),
            page_size: Some(25),
            upload_accept: Some(vec!["image/png".into()]),
            ..Profile::default()
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert("staging".into(), staging_profile());
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profiles.get("staging"), Some(&staging_profile()));
        assert_eq!(loaded.defaults.output, "table");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn profile_maps_to_dashboard_config() {
        let config =
            profile_to_dashboard_config(&staging_profile(), "staging", &Defaults::default())
                .unwrap();
        assert_eq!(config.url.as_str(), "https://staging.example.com/api");
        assert_eq!(config.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(config.default_page_size, 25);
        assert_eq!(config.upload_accept, vec!["image/png".to_string()]);
        match config.auth {
            AuthCredentials::Password { email, .. } => assert_eq!(email, "ops@example.com"),
            AuthCredentials::ApiKey(_) => panic!("expected password auth"),
        }
    }

    #[test]
    fn plaintext_api_key_is_last_resort() {
        let profile = Profile {
            api: "https://catalog.example.com/api".into(),
            api_key: Some("plain-key".into()),
            api_key_env: Some("MARQUEE_TEST_UNSET_KEY_VAR".into()),
            ..Profile::default()
        };
        // Only meaningful when neither MARQUEE_API_KEY nor a keyring entry
        // exists, which holds on CI.
        if std::env::var("MARQUEE_API_KEY").is_err() {
            let key = resolve_api_key(&profile, "ci-only-profile").unwrap();
            assert_eq!(key.expose_secret(), "plain-key");
        }
    }

    #[test]
    fn unknown_auth_mode_is_rejected() {
        let profile = Profile {
            api: "https://catalog.example.com/api".into(),
            auth_mode: "oauth".into(),
            ..Profile::default()
        };
        assert!(matches!(
            resolve_auth(&profile, "x"),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn invalid_url_is_a_validation_error() {
        let profile = Profile {
            api: "not a url".into(),
            api_key: Some("k".into()),
            ..Profile::default()
        };
        let err = profile_to_dashboard_config(&profile, "x", &Defaults::default()).unwrap_err();
        assert!(err.to_string().starts_with("invalid api"));
    }

    #[test]
    fn select_profile_falls_back_to_default_name() {
        let mut cfg = Config::default();
        cfg.profiles.insert("default".into(), staging_profile());
        let (name, _) = select_profile(&cfg, None).unwrap();
        assert_eq!(name, "default");
        assert!(matches!(
            select_profile(&cfg, Some("prod")),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }
}
