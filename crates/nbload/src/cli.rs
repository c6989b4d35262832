//! Clap derive structures for the `nbload` CLI.
//!
//! Defines the command tree, global flags, and shared value enums. Kept
//! free of crate-internal imports so `build.rs` can include it for man
//! page generation.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// nbload -- bulk device import for NetBox
#[derive(Debug, Parser)]
#[command(
    name = "nbload",
    version,
    about = "Bulk-import devices, interfaces and IP addresses into NetBox",
    long_about = "Reads a CSV file of devices and reconciles each row against a \
        NetBox-style REST API.\n\n\
        Existing objects are reused, missing ones are created, and every row \
        that cannot be applied is written to a failed or skipped CSV with its reason.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "NBLOAD_PROFILE", global = true)]
    pub profile: Option<String>,

    /// NetBox URL (overrides profile)
    #[arg(long, short = 'u', env = "NBLOAD_URL", global = true)]
    pub url: Option<String>,

    /// API token (overrides profile)
    #[arg(long, env = "NBLOAD_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "NBLOAD_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "NBLOAD_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "NBLOAD_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Also write logs to this file
    #[arg(long, env = "NBLOAD_LOG_FILE", global = true)]
    pub log_file: Option<PathBuf>,
}

// ── Output Format ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import devices from a CSV file
    #[command(alias = "i")]
    Import(ImportArgs),

    /// Manage device type interface templates
    #[command(alias = "tpl")]
    Template(TemplateArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  IMPORT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// CSV file with a header row (name, manufacturer, device_type, role, site, ...)
    pub file: PathBuf,

    /// Interface the IP address is bound to [default: LAN]
    #[arg(long)]
    pub interface: Option<String>,

    /// Source of the IP address dns_name [default: row]
    #[arg(long, value_enum)]
    pub dns_name: Option<DnsNameArg>,

    /// Link inventory-plugin assets to devices by serial number
    #[arg(long)]
    pub link_assets: bool,

    /// Where to write rows that failed [default: failed_devices.csv]
    #[arg(long)]
    pub failed_file: Option<PathBuf>,

    /// Where to write rows that were skipped [default: skipped_devices.csv]
    #[arg(long)]
    pub skipped_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DnsNameArg {
    /// The row's dns_name column
    Row,
    /// The device name
    DeviceName,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TEMPLATE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct TemplateArgs {
    #[command(subcommand)]
    pub command: TemplateCommand,
}

#[derive(Debug, Subcommand)]
pub enum TemplateCommand {
    /// Add an interface template to a device type (dry run unless --commit)
    Add {
        /// Device type model
        #[arg(long, short = 'd')]
        device_type: String,

        /// Manufacturer name, when the model is not unique
        #[arg(long, short = 'm')]
        manufacturer: Option<String>,

        /// Interface name
        #[arg(long, short = 'n')]
        name: String,

        /// Interface type slug
        #[arg(long = "type", short = 't', default_value = "1000base-t")]
        kind: String,

        /// Create the template disabled
        #[arg(long)]
        disabled: bool,

        /// Apply the change instead of reporting it
        #[arg(long)]
        commit: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration (tokens redacted)
    Show,

    /// Print the config file path
    Path,

    /// Set a profile value
    Set {
        /// Profile key (url, token_env, insecure, timeout, ca_cert)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store an API token in the system keyring
    SetToken {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
