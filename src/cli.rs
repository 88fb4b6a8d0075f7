//! CLI definitions for VaultBridge.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// VaultBridge CLI.
///
/// Run without a subcommand to act as the native-messaging host, which is
/// how the browser launches it.
#[derive(Parser)]
#[command(name = "vaultbridge")]
#[command(about = "Bridge between browser pages and the local VaultZero vault")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.vaultbridge/config.toml)
    #[arg(short, long, global = true, env = "VAULTBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Arguments the browser passes when launching the host (caller origin)
    #[arg(hide = true, num_args = 0..)]
    pub launch_args: Vec<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Check that the vault answers through the native host
    Ping,

    /// List stored logins for a site
    Credentials {
        /// Page URL or hostname
        url: String,

        /// Print the raw response
        #[arg(long)]
        json: bool,
    },

    /// List stored credit cards (numbers masked)
    Cards {
        /// Print the raw response
        #[arg(long)]
        json: bool,
    },

    /// Store a login in the vault
    Save {
        /// Page URL the login belongs to
        url: String,

        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "VAULTBRIDGE_PASSWORD", hide_env_values = true)]
        password: String,

        /// Service name (default: the URL's hostname)
        #[arg(long)]
        service: Option<String>,
    },

    /// Detect login and payment fields in a page snapshot
    Scan {
        /// Snapshot JSON file
        snapshot: PathBuf,
    },

    /// Fill a stored login into a page snapshot and print the filled fields
    Fill {
        /// Snapshot JSON file
        snapshot: PathBuf,

        /// Pick the login with this username instead of the first
        #[arg(short, long)]
        username: Option<String>,
    },

    /// Run the native-messaging host relay on stdin/stdout
    Host,

    /// Validate and print the effective configuration
    Config,
}
