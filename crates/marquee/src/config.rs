//! CLI configuration: thin wrapper around `marquee_config`.
//!
//! Re-exports the shared types and layers `GlobalOpts` flag overrides
//! (--api, --api-key, --insecure, --timeout) on top of the active profile.

use secrecy::SecretString;

use marquee_core::{AuthCredentials, DashboardConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use marquee_config::{Config, Defaults, Profile, config_path, load_config_or_default};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names for help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Build a `DashboardConfig` from the config file, profile, and CLI
/// overrides. Flags win over profile values.
pub fn build_dashboard_config(global: &GlobalOpts) -> Result<DashboardConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.api.is_some() => Profile::default(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    apply_overrides(&mut profile, global);
    if profile.api.is_empty() {
        return Err(CliError::Validation {
            field: "api".into(),
            reason: format!("profile '{profile_name}' has no API URL; pass --api or set it"),
        });
    }

    let mut config =
        marquee_config::profile_to_dashboard_config(&profile, &profile_name, &cfg.defaults)?;
    if let Some(ref key) = global.api_key {
        config.auth = AuthCredentials::ApiKey(SecretString::from(key.clone()));
    }
    Ok(config)
}

fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref api) = global.api {
        profile.api.clone_from(api);
    }
    if let Some(ref key) = global.api_key {
        profile.auth_mode = "api-key".into();
        profile.api_key = Some(key.clone());
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
}
