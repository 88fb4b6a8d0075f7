//! VaultBridge - browser extension bridge to the VaultZero vault
//!
//! Main entry point for the VaultBridge CLI and native host.

mod cli;
mod cmd_host;
mod cmd_page;
mod cmd_vault;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::{debug, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use vaultbridge_config::{Config, ConfigLoader, ConfigValidator, LoggingConfig};

use crate::cli::{Cli, Commands};

/// Get the .vaultbridge directory path.
fn vaultbridge_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".vaultbridge"))
        .unwrap_or_else(|| PathBuf::from(".vaultbridge"))
}

/// Initialize tracing on stderr, plus daily-rotated files when enabled.
///
/// Stdout carries native-messaging frames in host mode, so nothing else may
/// write to it.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let (file_layer, guard) = if logging.file {
        let log_dir = match &logging.dir {
            Some(dir) => PathBuf::from(ConfigLoader::expand_path(&dir.to_string_lossy())),
            None => vaultbridge_dir().join("logs"),
        };
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("creating log directory {}", log_dir.display()))?;

        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("vaultbridge")
            .filename_suffix("log")
            .max_log_files(14)
            .build(&log_dir)?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        (
            Some(fmt::layer().with_writer(non_blocking).with_ansi(false)),
            Some(guard),
        )
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| vaultbridge_dir().join("config.toml"));
    let config = ConfigLoader::load_or_default(&path)
        .with_context(|| format!("loading {}", path.display()))?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let warnings = ConfigValidator::validate(&config)?.into_result()?;

    // Keep the file writer alive for the whole run.
    let _guard = init_tracing(&config.logging)?;
    for warning in &warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }

    match cli.command {
        None => {
            debug!(args = ?cli.launch_args, "Launched by browser");
            cmd_host::run_host(&config).await
        }
        Some(Commands::Host) => cmd_host::run_host(&config).await,
        Some(Commands::Config) => {
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        Some(Commands::Ping) => cmd_vault::ping(&config).await,
        Some(Commands::Credentials { url, json }) => {
            cmd_vault::credentials(&config, &url, json).await
        }
        Some(Commands::Cards { json }) => cmd_vault::cards(&config, json).await,
        Some(Commands::Save {
            url,
            username,
            password,
            service,
        }) => cmd_vault::save(&config, &url, &username, &password, service.as_deref()).await,
        Some(Commands::Scan { snapshot }) => cmd_page::scan(&snapshot),
        Some(Commands::Fill { snapshot, username }) => {
            cmd_page::fill(&config, &snapshot, username.as_deref()).await
        }
    }
}
