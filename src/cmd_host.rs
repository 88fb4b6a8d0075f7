//! Native-messaging host mode.

use std::sync::Arc;

use tracing::info;

use vaultbridge_config::Config;
use vaultbridge_native::host::{SocketVaultClient, VaultClient, run_relay};

/// Relay framed requests between the browser (stdin/stdout) and the vault.
pub(crate) async fn run_host(config: &Config) -> anyhow::Result<()> {
    let client = SocketVaultClient::from_config(&config.host);
    info!(
        "VaultBridge host v{} relaying to {}",
        env!("CARGO_PKG_VERSION"),
        client.endpoint()
    );

    let vault: Arc<dyn VaultClient> = Arc::new(client);
    run_relay(
        tokio::io::stdin(),
        tokio::io::stdout(),
        vault,
        config.native.max_frame_bytes,
    )
    .await?;
    Ok(())
}
