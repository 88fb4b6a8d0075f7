//! Vault subcommands, sent through the message bus and native host exactly
//! as a page agent would send them.

use std::sync::Arc;

use anyhow::bail;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use vaultbridge_bus::{BusClient, ExtensionMessageBus, spawn_bus};
use vaultbridge_config::Config;
use vaultbridge_native::RequestCorrelator;
use vaultbridge_protocols::{NativeResponse, SaveCredentialRequest, VaultBridge};

/// A running message bus backed by a host process.
pub(crate) struct Bridge {
    pub bus: Arc<ExtensionMessageBus>,
    pub client: BusClient,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl Bridge {
    pub(crate) fn start(config: &Config) -> Self {
        let correlator = Arc::new(RequestCorrelator::from_config(&config.native));
        let bus = Arc::new(ExtensionMessageBus::new(correlator));
        let shutdown = CancellationToken::new();
        let (client, task) = spawn_bus(bus.clone(), shutdown.clone());
        debug!(host = %config.native.host_name, "Message bus ready");
        Self {
            bus,
            client,
            shutdown,
            task,
        }
    }

    pub(crate) async fn stop(self) {
        self.shutdown.cancel();
        self.bus.correlator().channel().disconnect();
        let _ = self.task.await;
    }
}

/// Fail with the vault's error message unless the response succeeded.
pub(crate) fn require_success(response: &NativeResponse) -> anyhow::Result<()> {
    if !response.success {
        bail!(
            "{}",
            response.error.as_deref().unwrap_or("request failed without an error message")
        );
    }
    Ok(())
}

pub(crate) async fn ping(config: &Config) -> anyhow::Result<()> {
    let bridge = Bridge::start(config);
    let response = bridge.client.ping().await;
    bridge.stop().await;

    require_success(&response)?;
    println!("VaultZero is running");
    Ok(())
}

pub(crate) async fn credentials(config: &Config, url: &str, json: bool) -> anyhow::Result<()> {
    let bridge = Bridge::start(config);
    let response = bridge.client.get_credentials(url).await;
    bridge.stop().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }
    require_success(&response)?;
    let credentials = response.credentials().unwrap_or_default();
    if credentials.is_empty() {
        println!("No credentials found for {}", url);
        return Ok(());
    }
    for credential in &credentials {
        println!("{:<30} {}", credential.display_name(), credential.username);
    }
    Ok(())
}

pub(crate) async fn cards(config: &Config, json: bool) -> anyhow::Result<()> {
    let bridge = Bridge::start(config);
    let response = bridge.client.get_credit_cards().await;
    bridge.stop().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }
    require_success(&response)?;
    let cards = response.cards().unwrap_or_default();
    if cards.is_empty() {
        println!("No credit cards stored");
    }
    for card in &cards {
        println!(
            "{:<20} {}  {}",
            card.card_name,
            card.masked_number(),
            card.expiry_mm_yy()
        );
    }
    Ok(())
}

pub(crate) async fn save(
    config: &Config,
    url: &str,
    username: &str,
    password: &str,
    service: Option<&str>,
) -> anyhow::Result<()> {
    let service = match service {
        Some(service) => service.to_string(),
        None => url::Url::parse(url)?
            .host_str()
            .map(str::to_string)
            .unwrap_or_else(|| url.to_string()),
    };

    let bridge = Bridge::start(config);
    let request = SaveCredentialRequest::new(service.clone(), url, username, password);
    let response = bridge.client.save_credential(request).await;
    bridge.stop().await;

    require_success(&response)?;
    info!(service = %service, "Credential saved");
    println!("Saved {} for {}", username, service);
    Ok(())
}
