//! Resolution of the active connection: config file profile, CLI flag
//! overrides, and the legacy `.env` variables, in that order of weakness.
//!
//! This is the single boundary where CLI options cross into core types.

use std::time::Duration;

use secrecy::SecretString;

use nbload_config::{Config, ConfigError, Profile};
use nbload_core::{DirectoryConfig, NetboxClient, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `DirectoryConfig` from the loaded config and global flags.
///
/// URL: `--url` > profile `url` > legacy `server`.
/// Token: `--token` > profile chain (token_env, keyring, plaintext) > legacy `token`.
pub fn build_directory_config(
    global: &GlobalOpts,
    config: &Config,
) -> Result<DirectoryConfig, CliError> {
    let profile_name = active_profile_name(global, config);
    let profile = config.profiles.get(&profile_name);

    // An explicitly requested profile must exist.
    if profile.is_none() && global.profile.is_some() {
        let mut available: Vec<_> = config.profiles.keys().cloned().collect();
        available.sort();
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
        });
    }

    let (legacy_url, legacy_token) = nbload_config::legacy_env();

    // 1. URL
    let url_str = global
        .url
        .clone()
        .or_else(|| {
            profile
                .map(|p| p.url.clone())
                .filter(|u| !u.is_empty())
        })
        .or(legacy_url)
        .ok_or_else(|| CliError::NoConfig {
            path: nbload_config::config_path().display().to_string(),
        })?;
    let url = nbload_config::parse_url(&url_str)?;

    // 2. Token
    let token = match (&global.token, profile) {
        (Some(token), _) => SecretString::from(token.clone()),
        (None, Some(profile)) => match nbload_config::resolve_token(profile, &profile_name) {
            Ok(token) => token,
            Err(ConfigError::NoCredentials { .. }) => legacy_token.ok_or_else(|| {
                CliError::NoCredentials {
                    profile: profile_name.clone(),
                }
            })?,
            Err(e) => return Err(e.into()),
        },
        (None, None) => legacy_token.ok_or_else(|| CliError::NoCredentials {
            profile: profile_name.clone(),
        })?,
    };

    // 3. TLS verification
    let tls = tls_for(global, profile, config);

    // 4. Timeout (flag > profile > defaults)
    let timeout = Duration::from_secs(
        global
            .timeout
            .or_else(|| profile.and_then(|p| p.timeout))
            .unwrap_or(config.defaults.timeout),
    );

    Ok(DirectoryConfig {
        url,
        token,
        tls,
        timeout,
    })
}

fn tls_for(global: &GlobalOpts, profile: Option<&Profile>, config: &Config) -> TlsVerification {
    let insecure = global.insecure
        || profile
            .and_then(|p| p.insecure)
            .unwrap_or(config.defaults.insecure);
    if insecure {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ca_path) = profile.and_then(|p| p.ca_cert.clone()) {
        TlsVerification::CustomCa(ca_path)
    } else {
        TlsVerification::SystemDefaults
    }
}

/// Resolve configuration and build a REST client.
pub fn connect(global: &GlobalOpts, config: &Config) -> Result<NetboxClient, CliError> {
    let directory_config = build_directory_config(global, config)?;
    tracing::debug!(url = %directory_config.url, "connecting");
    Ok(nbload_core::connect(&directory_config)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;
    use secrecy::ExposeSecret;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["nbload"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["completions", "bash"]);
        Cli::try_parse_from(argv).unwrap().global
    }

    fn config_with(name: &str, profile: Profile) -> Config {
        let mut cfg = Config::default();
        cfg.default_profile = Some(name.into());
        cfg.profiles.insert(name.into(), profile);
        cfg
    }

    #[test]
    fn flags_override_profile() {
        let cfg = config_with(
            "lab",
            Profile {
                url: "https://netbox.lab".into(),
                token: Some("from-profile".into()),
                timeout: Some(5),
                ..Profile::default()
            },
        );
        let global = global(&[
            "--url",
            "https://override.lab",
            "--token",
            "from-flag",
            "--timeout",
            "9",
            "-k",
        ]);

        let resolved = build_directory_config(&global, &cfg).unwrap();
        assert_eq!(resolved.url.as_str(), "https://override.lab/");
        assert_eq!(resolved.token.expose_secret(), "from-flag");
        assert_eq!(resolved.timeout, Duration::from_secs(9));
        assert_eq!(resolved.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn profile_values_are_used_without_flags() {
        let cfg = config_with(
            "lab",
            Profile {
                url: "https://netbox.lab".into(),
                token: Some("from-profile".into()),
                ca_cert: Some("/etc/ssl/lab.pem".into()),
                timeout: Some(5),
                ..Profile::default()
            },
        );

        let resolved = build_directory_config(&global(&[]), &cfg).unwrap();
        assert_eq!(resolved.url.as_str(), "https://netbox.lab/");
        assert_eq!(resolved.token.expose_secret(), "from-profile");
        assert_eq!(resolved.timeout, Duration::from_secs(5));
        assert_eq!(
            resolved.tls,
            TlsVerification::CustomCa("/etc/ssl/lab.pem".into())
        );
    }

    #[test]
    fn unknown_explicit_profile_is_rejected() {
        let cfg = config_with("lab", Profile::default());
        let err = build_directory_config(&global(&["--profile", "prod"]), &cfg).unwrap_err();
        assert!(
            matches!(err, CliError::ProfileNotFound { ref name, ref available } if name == "prod" && available == "lab")
        );
    }
}
