//! Page-snapshot subcommands.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use serde_json::json;
use tracing::info;

use vaultbridge_autofill::PageSession;
use vaultbridge_classifier::{ScanReport, detect_login_fields};
use vaultbridge_config::Config;
use vaultbridge_dom::{Document, SharedDocument};
use vaultbridge_protocols::VaultBridge;

use crate::cmd_vault::{Bridge, require_success};

/// Tab id the CLI registers its page session under.
const CLI_TAB: &str = "cli";

fn load_snapshot(path: &Path) -> anyhow::Result<Document> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    let doc = Document::from_json(&json)
        .with_context(|| format!("parsing snapshot {}", path.display()))?;
    Ok(doc)
}

/// Print the field sets detected in a snapshot as JSON.
pub(crate) fn scan(snapshot: &Path) -> anyhow::Result<()> {
    let doc = load_snapshot(snapshot)?;
    let report = ScanReport::scan(&doc);
    info!(
        login = report.login.len(),
        payment = report.payment.len(),
        "Scanned {}",
        report.url
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Fill a stored login into a snapshot through the bus's `fillCredential`
/// route, then print the filled login fields.
pub(crate) async fn fill(
    config: &Config,
    snapshot: &Path,
    username: Option<&str>,
) -> anyhow::Result<()> {
    let document = load_snapshot(snapshot)?.into_shared();
    let bridge = Bridge::start(config);
    let result = fill_with(&bridge, document.clone(), config, username).await;
    bridge.stop().await;
    result?;

    let doc = document.lock();
    let fields = detect_login_fields(&doc)
        .iter()
        .map(|set| {
            json!({
                "username": doc.value(set.username),
                "passwordLength": doc.value(set.password).chars().count(),
            })
        })
        .collect::<Vec<_>>();
    println!("{}", serde_json::to_string_pretty(&fields)?);
    Ok(())
}

async fn fill_with(
    bridge: &Bridge,
    document: SharedDocument,
    config: &Config,
    username: Option<&str>,
) -> anyhow::Result<()> {
    let session = PageSession::new(
        document,
        Arc::new(bridge.client.clone()),
        config.autofill.clone(),
    );
    if !session.init().await {
        bail!("VaultZero is not running or locked");
    }
    if session.active_login().is_none() {
        bail!("No login fields found in snapshot");
    }

    let hostname = session.document().lock().hostname();
    let response = bridge.client.get_credentials(&hostname).await;
    require_success(&response)?;
    let credentials = response.credentials().unwrap_or_default();
    let credential = match username {
        Some(username) => credentials.into_iter().find(|c| c.matches_username(username)),
        None => credentials.into_iter().next(),
    };
    let Some(credential) = credential else {
        bail!("No matching credential for {}", hostname);
    };

    bridge.bus.register_agent(CLI_TAB, session.clone());
    let response = bridge
        .client
        .request(json!({
            "action": "fillCredential",
            "tabId": CLI_TAB,
            "credential": credential,
        }))
        .await;
    bridge.bus.unregister_agent(CLI_TAB);
    session.shutdown();

    require_success(&response)
}
