//! Configuration schema definitions.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub native: NativeConfig,

    #[serde(default)]
    pub autofill: AutofillConfig,

    #[serde(default)]
    pub watcher: WatcherConfig,

    #[serde(default)]
    pub host: HostConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Native messaging channel configuration (browser side).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NativeConfig {
    /// Registered native-messaging host name.
    #[serde(default = "default_host_name")]
    pub host_name: String,

    /// Explicit host executable; skips manifest lookup when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_path: Option<PathBuf>,

    /// Extra arguments passed to the host executable.
    #[serde(default)]
    pub host_args: Vec<String>,

    /// Directory holding `<host_name>.json` manifests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_dir: Option<PathBuf>,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Largest inbound frame accepted from the host.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl Default for NativeConfig {
    fn default() -> Self {
        Self {
            host_name: default_host_name(),
            host_path: None,
            host_args: Vec::new(),
            manifest_dir: None,
            request_timeout_ms: default_request_timeout_ms(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

impl NativeConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Manifest directory to search, falling back to the Chrome per-user
    /// location for the current platform.
    pub fn resolved_manifest_dir(&self) -> Option<PathBuf> {
        self.manifest_dir.clone().or_else(default_manifest_dir)
    }
}

fn default_host_name() -> String {
    "com.vaultzero.host".to_string()
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_max_frame_bytes() -> usize {
    1024 * 1024
}

#[cfg(target_os = "macos")]
fn default_manifest_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| {
        h.join("Library/Application Support/Google/Chrome/NativeMessagingHosts")
    })
}

#[cfg(not(target_os = "macos"))]
fn default_manifest_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|c| c.join("google-chrome").join("NativeMessagingHosts"))
}

/// Timings of the page-side autofill controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutofillConfig {
    /// Delay between deciding to offer a save and showing the prompt.
    #[serde(default = "default_save_offer_delay_ms")]
    pub save_offer_delay_ms: u64,

    /// How long filled values must stay non-empty before offering a save.
    #[serde(default = "default_stability_check_ms")]
    pub stability_check_ms: u64,

    /// Quiet period after a dismissed prompt.
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Prompt lifetime when the user ignores it.
    #[serde(default = "default_auto_dismiss_ms")]
    pub auto_dismiss_ms: u64,

    /// Delay before reading fields after a submit click, and before a new
    /// menu starts listening for outside clicks.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    #[serde(default = "default_notification_ms")]
    pub notification_ms: u64,
}

impl Default for AutofillConfig {
    fn default() -> Self {
        Self {
            save_offer_delay_ms: default_save_offer_delay_ms(),
            stability_check_ms: default_stability_check_ms(),
            cooldown_ms: default_cooldown_ms(),
            auto_dismiss_ms: default_auto_dismiss_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            notification_ms: default_notification_ms(),
        }
    }
}

impl AutofillConfig {
    pub fn save_offer_delay(&self) -> Duration {
        Duration::from_millis(self.save_offer_delay_ms)
    }

    pub fn stability_check(&self) -> Duration {
        Duration::from_millis(self.stability_check_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn auto_dismiss(&self) -> Duration {
        Duration::from_millis(self.auto_dismiss_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn notification(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }
}

fn default_save_offer_delay_ms() -> u64 {
    1500
}

fn default_stability_check_ms() -> u64 {
    2000
}

fn default_cooldown_ms() -> u64 {
    5000
}

fn default_auto_dismiss_ms() -> u64 {
    10_000
}

fn default_settle_delay_ms() -> u64 {
    100
}

fn default_notification_ms() -> u64 {
    3000
}

/// DOM mutation watcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Window in which mutation batches are merged into one re-scan.
    /// Zero re-scans on every batch.
    #[serde(default = "default_coalesce_ms")]
    pub coalesce_ms: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            coalesce_ms: default_coalesce_ms(),
        }
    }
}

impl WatcherConfig {
    pub fn coalesce_window(&self) -> Duration {
        Duration::from_millis(self.coalesce_ms)
    }
}

fn default_true() -> bool {
    true
}

fn default_coalesce_ms() -> u64 {
    50
}

/// Native host relay configuration (host side).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Vault IPC endpoint: a named pipe on Windows, a Unix socket elsewhere.
    #[serde(default = "default_vault_endpoint")]
    pub vault_endpoint: String,

    /// Give up connecting to the vault after this long.
    #[serde(default = "default_connect_deadline_ms")]
    pub connect_deadline_ms: u64,

    /// Pause between connection attempts.
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    /// Largest vault reply accepted.
    #[serde(default = "default_max_reply_bytes")]
    pub max_reply_bytes: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            vault_endpoint: default_vault_endpoint(),
            connect_deadline_ms: default_connect_deadline_ms(),
            retry_interval_ms: default_retry_interval_ms(),
            max_reply_bytes: default_max_reply_bytes(),
        }
    }
}

impl HostConfig {
    pub fn connect_deadline(&self) -> Duration {
        Duration::from_millis(self.connect_deadline_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

#[cfg(windows)]
fn default_vault_endpoint() -> String {
    r"\\.\pipe\vaultzero".to_string()
}

#[cfg(not(windows))]
fn default_vault_endpoint() -> String {
    "~/.vaultzero/vault.sock".to_string()
}

fn default_connect_deadline_ms() -> u64 {
    2000
}

fn default_retry_interval_ms() -> u64 {
    100
}

fn default_max_reply_bytes() -> usize {
    64 * 1024
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Also write daily-rotated log files.
    #[serde(default)]
    pub file: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: false,
            dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
