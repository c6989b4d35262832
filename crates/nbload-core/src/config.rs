// ── Runtime connection configuration ──
//
// These types describe *how* to reach the remote directory. They carry
// the token and connection tuning but never touch disk: the CLI builds a
// `DirectoryConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for connecting to one API endpoint.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Server URL (e.g., `https://netbox.example.com`).
    pub url: Url,
    /// API token.
    pub token: SecretString,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl DirectoryConfig {
    pub fn new(url: Url, token: SecretString) -> Self {
        Self {
            url,
            token,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }
}
