//! Configuration for nbload.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation to `nbload_core::DirectoryConfig`. The CLI layers its
//! flag overrides on top.

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

use nbload_core::{DirectoryConfig, TlsVerification};

/// Keyring service name for stored tokens.
pub const KEYRING_SERVICE: &str = "nbload";

/// Variables read from a legacy `.env` (`server=...`, `token=...`).
pub const LEGACY_URL_VAR: &str = "server";
pub const LEGACY_TOKEN_VAR: &str = "token";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API token configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(String),

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
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named server profiles.
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

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub import: ImportDefaults,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: default_timeout(),
            import: ImportDefaults::default(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}

/// Defaults for `nbload import` flags.
#[derive(Debug, Deserialize, Serialize)]
pub struct ImportDefaults {
    /// Interface the IP is bound to.
    #[serde(default = "default_interface")]
    pub interface: String,

    /// `row` or `device-name`.
    #[serde(default = "default_dns_name")]
    pub dns_name: String,

    #[serde(default)]
    pub link_assets: bool,

    #[serde(default = "default_failed_file")]
    pub failed_file: PathBuf,

    #[serde(default = "default_skipped_file")]
    pub skipped_file: PathBuf,
}

impl Default for ImportDefaults {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            dns_name: default_dns_name(),
            link_assets: false,
            failed_file: default_failed_file(),
            skipped_file: default_skipped_file(),
        }
    }
}

fn default_interface() -> String {
    "LAN".into()
}
fn default_dns_name() -> String {
    "row".into()
}
fn default_failed_file() -> PathBuf {
    PathBuf::from("failed_devices.csv")
}
fn default_skipped_file() -> PathBuf {
    PathBuf::from("skipped_devices.csv")
}

/// A named server profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Server base URL (e.g., "https://netbox.example.com").
    pub url: String,

    /// API token (plaintext -- prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable name containing the token.
    pub token_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "nbload", "nbload").map_or_else(
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
    p.push("nbload");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path` + `NBLOAD_`-prefixed environment.
///
/// Nested keys use a double underscore: `NBLOAD_DEFAULTS__TIMEOUT=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("NBLOAD_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/token"))
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

/// Store a profile's token in the system keyring.
pub fn store_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?
        .set_password(token)
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

/// Resolve a token from the credential chain (no CLI flag step).
///
/// Order: the profile's `token_env` variable, the system keyring, the
/// plaintext `token` field.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's token_env → env var lookup
    if let Some(ref env_name) = profile.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref token) = profile.token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// URL and token from legacy `server` / `token` environment variables.
pub fn legacy_env() -> (Option<String>, Option<SecretString>) {
    let url = std::env::var(LEGACY_URL_VAR).ok().filter(|v| !v.is_empty());
    let token = std::env::var(LEGACY_TOKEN_VAR)
        .ok()
        .filter(|v| !v.is_empty())
        .map(SecretString::from);
    (url, token)
}

/// Parse a server URL, naming the offending field on failure.
pub fn parse_url(raw: &str) -> Result<url::Url, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// Build a `DirectoryConfig` from a profile -- no CLI flag overrides.
pub fn profile_to_directory_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<DirectoryConfig, ConfigError> {
    let url = parse_url(&profile.url)?;
    let token = resolve_token(profile, profile_name)?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    Ok(DirectoryConfig {
        url,
        token,
        tls,
        timeout,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn defaults_without_file() {
        Jail::expect_with(|jail| {
            let cfg = load_config_from(&jail.directory().join("missing.toml")).unwrap();
            assert_eq!(cfg.default_profile.as_deref(), Some("default"));
            assert_eq!(cfg.defaults.timeout, 30);
            assert_eq!(cfg.defaults.import.interface, "LAN");
            assert_eq!(cfg.defaults.import.dns_name, "row");
            assert_eq!(
                cfg.defaults.import.failed_file,
                PathBuf::from("failed_devices.csv")
            );
            assert!(cfg.profiles.is_empty());
            Ok(())
        });
    }

    #[test]
    fn file_profiles_and_env_overlay() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                default_profile = "lab"

                [defaults.import]
                interface = "WAN"
                link_assets = true

                [profiles.lab]
                url = "https://netbox.lab"
                token_env = "LAB_TOKEN"
                timeout = 5
                "#,
            )?;
            jail.set_env("NBLOAD_DEFAULTS__TIMEOUT", "90");

            let cfg = load_config_from(&jail.directory().join("config.toml")).unwrap();
            assert_eq!(cfg.default_profile.as_deref(), Some("lab"));
            assert_eq!(cfg.defaults.timeout, 90);
            assert_eq!(cfg.defaults.import.interface, "WAN");
            assert!(cfg.defaults.import.link_assets);

            let lab = &cfg.profiles["lab"];
            assert_eq!(lab.url, "https://netbox.lab");
            assert_eq!(lab.timeout, Some(5));
            Ok(())
        });
    }

    #[test]
    fn token_env_wins_over_plaintext() {
        Jail::expect_with(|jail| {
            jail.set_env("LAB_TOKEN", "from-env");
            let profile = Profile {
                url: "https://netbox.lab".into(),
                token: Some("plaintext".into()),
                token_env: Some("LAB_TOKEN".into()),
                ..Profile::default()
            };
            let token = resolve_token(&profile, "nbload-test-token-env").unwrap();
            assert_eq!(token.expose_secret(), "from-env");
            Ok(())
        });
    }

    #[test]
    fn profile_translation_applies_defaults() {
        let profile = Profile {
            url: "https://netbox.lab".into(),
            token: Some("plaintext".into()),
            insecure: Some(true),
            ..Profile::default()
        };
        let cfg =
            profile_to_directory_config(&profile, "nbload-test-translate", &Defaults::default())
                .unwrap();
        assert_eq!(cfg.url.as_str(), "https://netbox.lab/");
        assert_eq!(cfg.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(cfg.timeout, Duration::from_secs(30));
    }

    #[test]
    fn invalid_url_is_a_validation_error() {
        let profile = Profile {
            url: "netbox.lab without scheme".into(),
            token: Some("t".into()),
            ..Profile::default()
        };
        let err =
            profile_to_directory_config(&profile, "nbload-test-bad-url", &Defaults::default())
                .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "url"));
    }

    #[test]
    fn save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                url: "https://netbox.example.com".into(),
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("https://netbox.example.com"));
    }
}
