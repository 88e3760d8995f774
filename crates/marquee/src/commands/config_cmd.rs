//! Config subcommand handlers.

use std::collections::HashMap;
use std::fmt::Write as _;

use dialoguer::{Input, Select};

use marquee_config::{KEYRING_SERVICE, save_config, store_secret};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Defaults, Profile};
use crate::error::{CliError, prompt_err};
use crate::output;

const MASK: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of `cfg` with plaintext secrets masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for p in cfg.profiles.values_mut() {
        if p.api_key.is_some() {
            p.api_key = Some(MASK.into());
        }
        if p.password.is_some() {
            p.password = Some(MASK.into());
        }
    }
    cfg
}

/// TOML-ish listing for `--output table`.
fn format_config(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "page_size = {}", cfg.defaults.page_size);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "api = \"{}\"", p.api);
        let _ = writeln!(out, "auth_mode = \"{}\"", p.auth_mode);
        if let Some(ref key) = p.api_key {
            let _ = writeln!(out, "api_key = \"{key}\"");
        }
        if let Some(ref env) = p.api_key_env {
            let _ = writeln!(out, "api_key_env = \"{env}\"");
        }
        if let Some(ref email) = p.email {
            let _ = writeln!(out, "email = \"{email}\"");
        }
        if let Some(ref pw) = p.password {
            let _ = writeln!(out, "password = \"{pw}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(size) = p.page_size {
            let _ = writeln!(out, "page_size = {size}");
        }
        if let Some(max) = p.max_page_size {
            let _ = writeln!(out, "max_page_size = {max}");
        }
        if let Some(secs) = p.session_refresh_secs {
            let _ = writeln!(out, "session_refresh_secs = {secs}");
        }
        if let Some(ref accept) = p.upload_accept {
            let _ = writeln!(out, "upload_accept = {accept:?}");
        }
    }

    out
}

fn parse_num<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: "must be a whole number".into(),
    })
}

/// Apply one `config set` assignment to a profile.
fn set_profile_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "api" => {
            value.parse::<url::Url>().map_err(|_| CliError::Validation {
                field: "api".into(),
                reason: format!("invalid URL: {value}"),
            })?;
            profile.api = value;
        }
        "auth_mode" | "auth-mode" => {
            if !matches!(value.as_str(), "api-key" | "password") {
                return Err(CliError::Validation {
                    field: "auth_mode".into(),
                    reason: "must be 'api-key' or 'password'".into(),
                });
            }
            profile.auth_mode = value;
        }
        "api_key" | "api-key" => profile.api_key = Some(value),
        "api_key_env" | "api-key-env" => profile.api_key_env = Some(value),
        "email" => profile.email = Some(value),
        "insecure" => {
            profile.insecure = Some(value.parse().map_err(|_| CliError::Validation {
                field: "insecure".into(),
                reason: "must be 'true' or 'false'".into(),
            })?);
        }
        "timeout" => profile.timeout = Some(parse_num("timeout", &value)?),
        "page_size" | "page-size" => profile.page_size = Some(parse_num("page_size", &value)?),
        "max_page_size" | "max-page-size" => {
            profile.max_page_size = Some(parse_num("max_page_size", &value)?);
        }
        "session_refresh_secs" | "session-refresh-secs" => {
            profile.session_refresh_secs = Some(parse_num("session_refresh_secs", &value)?);
        }
        "upload_accept" | "upload-accept" => {
            profile.upload_accept = Some(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect(),
            );
        }
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: api, auth_mode, api_key, \
                     api_key_env, email, insecure, timeout, page_size, max_page_size, \
                     session_refresh_secs, upload_accept, ca_cert"
                ),
            });
        }
    }
    Ok(())
}

fn prompt_secret(label: &str) -> Result<String, CliError> {
    let secret = rpassword::prompt_password(label).map_err(prompt_err)?;
    if secret.is_empty() {
        return Err(CliError::Validation {
            field: "secret".into(),
            reason: "value cannot be empty".into(),
        });
    }
    Ok(secret)
}

/// Offer to store a secret in the system keyring or return it for plaintext config.
///
/// Returns `Some(secret)` if the user chose plaintext, `None` if stored in keyring.
fn prompt_keyring_storage(
    secret: &str,
    profile_name: &str,
    kind: &str,
    label: &str,
) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt(format!("Where to store the {label}?"))
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        store_secret(profile_name, kind, secret)?;
        eprintln!("   ✓ {label} stored in system keyring ({KEYRING_SERVICE})");
        Ok(None)
    } else {
        Ok(Some(secret.to_owned()))
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(&global.output, &cfg, format_config, |_| {
                config::config_path().display().to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            if profile.auth_mode.is_empty() {
                profile.auth_mode = "api-key".into();
            }
            set_profile_key(profile, &key, value)?;
            save_config(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        ConfigCommand::SetToken { profile } => {
            let cfg = config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            let prof = cfg
                .profiles
                .get(&profile_name)
                .ok_or_else(|| CliError::ProfileNotFound {
                    name: profile_name.clone(),
                    available: config::available_profiles(&cfg),
                })?;

            if prof.auth_mode == "password" {
                store_secret(&profile_name, "password", &prompt_secret("Password: ")?)?;
            } else {
                store_secret(&profile_name, "api-key", &prompt_secret("API key: ")?)?;
            }
            eprintln!("✓ Secret stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("marquee: configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let api: String = Input::new()
        .with_prompt("Catalog API URL")
        .default("http://localhost:3000/api".into())
        .validate_with(|s: &String| s.parse::<url::Url>().map(|_| ()).map_err(|e| e.to_string()))
        .interact_text()
        .map_err(prompt_err)?;

    let auth_selection = Select::new()
        .with_prompt("Authentication method")
        .items(&["Service API key", "Email and password"])
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let mut profile = Profile {
        api,
        ..Profile::default()
    };
    if auth_selection == 0 {
        let key = prompt_secret("API key: ")?;
        profile.auth_mode = "api-key".into();
        profile.api_key = prompt_keyring_storage(&key, &profile_name, "api-key", "API key")?;
    } else {
        let email: String = Input::new()
            .with_prompt("Email")
            .interact_text()
            .map_err(prompt_err)?;
        let pass = prompt_secret("Password: ")?;
        profile.auth_mode = "password".into();
        profile.email = Some(email);
        profile.password = prompt_keyring_storage(&pass, &profile_name, "password", "Password")?;
    }

    let mut profiles = HashMap::new();
    profiles.insert(profile_name.clone(), profile);
    let cfg = Config {
        default_profile: Some(profile_name.clone()),
        defaults: Defaults::default(),
        profiles,
    };
    let path = save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: marquee whoami");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_validates_values() {
        let mut profile = Profile::default();
        set_profile_key(&mut profile, "page_size", "25".into()).unwrap();
        set_profile_key(&mut profile, "upload_accept", "image/*, video/mp4,".into()).unwrap();
        assert_eq!(profile.page_size, Some(25));
        assert_eq!(
            profile.upload_accept,
            Some(vec!["image/*".to_string(), "video/mp4".to_string()])
        );

        assert!(set_profile_key(&mut profile, "auth_mode", "oauth".into()).is_err());
        assert!(set_profile_key(&mut profile, "api", "nope".into()).is_err());
        assert!(set_profile_key(&mut profile, "shoe_size", "9".into()).is_err());
    }

    #[test]
    fn show_masks_plaintext_secrets() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                api: "https://catalog.example.com/api".into(),
                api_key: Some("sk-live-123".into()),
                ..Profile::default()
            },
        );
        let text = format_config(&redacted(&cfg));
        assert!(text.contains("api_key = \"****\""));
        assert!(!text.contains("sk-live-123"));
    }
}
