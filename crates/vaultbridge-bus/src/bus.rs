//! Message routing.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info};
use vaultbridge_native::RequestCorrelator;
use vaultbridge_protocols::{
    Credential, NativeResponse, PageAgent, PageMessage, SaveCredentialRequest, VaultBridge,
};

const KNOWN_ACTIONS: &[&str] = &[
    "ping",
    "getCredentials",
    "saveCredential",
    "getCreditCards",
    "fillCredential",
];

/// Routes page messages to the native host or to page agents.
pub struct ExtensionMessageBus {
    correlator: Arc<RequestCorrelator>,
    agents: DashMap<String, Arc<dyn PageAgent>>,
    active_tab: RwLock<Option<String>>,
}

impl ExtensionMessageBus {
    pub fn new(correlator: Arc<RequestCorrelator>) -> Self {
        Self {
            correlator,
            agents: DashMap::new(),
            active_tab: RwLock::new(None),
        }
    }

    pub fn correlator(&self) -> &Arc<RequestCorrelator> {
        &self.correlator
    }

    /// Register the page agent of `tab_id`. The first registered tab becomes
    /// the active one.
    pub fn register_agent(&self, tab_id: impl Into<String>, agent: Arc<dyn PageAgent>) {
        let tab_id = tab_id.into();
        debug!(tab = %tab_id, "Page agent registered");
        self.agents.insert(tab_id.clone(), agent);

        let mut active = self.active_tab.write();
        if active.is_none() {
            *active = Some(tab_id);
        }
    }

    pub fn unregister_agent(&self, tab_id: &str) -> bool {
        let removed = self.agents.remove(tab_id).is_some();
        let mut active = self.active_tab.write();
        if active.as_deref() == Some(tab_id) {
            *active = None;
        }
        removed
    }

    /// Tab targeted by `fillCredential` messages that carry no tab id.
    pub fn set_active_tab(&self, tab_id: impl Into<String>) {
        *self.active_tab.write() = Some(tab_id.into());
    }

    pub fn active_tab(&self) -> Option<String> {
        self.active_tab.read().clone()
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Handle a raw `{action: ...}` object.
    pub async fn handle_value(&self, message: Value) -> NativeResponse {
        let action = match message.get("action").and_then(Value::as_str) {
            Some(action) => action.to_string(),
            None => return NativeResponse::failure("Missing action"),
        };

        match serde_json::from_value::<PageMessage>(message) {
            Ok(message) => self.dispatch(message).await,
            Err(e) if KNOWN_ACTIONS.contains(&action.as_str()) => {
                NativeResponse::failure(format!("Invalid {} message: {}", action, e))
            }
            Err(_) => {
                debug!(action = %action, "Rejecting unknown action");
                NativeResponse::failure(format!("Unknown action: {}", action))
            }
        }
    }

    /// Handle a typed page message.
    pub async fn dispatch(&self, message: PageMessage) -> NativeResponse {
        debug!(action = message.action(), "Bus message");

        if let PageMessage::FillCredential { tab_id, credential } = message {
            return self.fill(tab_id, credential).await;
        }

        match message.native_request() {
            Some((kind, data)) => self.correlator.call(kind, data).await,
            None => NativeResponse::failure(format!("Unknown action: {}", message.action())),
        }
    }

    async fn fill(&self, tab_id: Option<String>, credential: Credential) -> NativeResponse {
        let Some(tab_id) = tab_id.or_else(|| self.active_tab()) else {
            return NativeResponse::failure("No active page");
        };

        // Clone out of the map so no shard lock is held across the await.
        let agent = self.agents.get(&tab_id).map(|entry| entry.value().clone());
        let Some(agent) = agent else {
            return NativeResponse::failure(format!("No page agent for tab {}", tab_id));
        };

        if agent.fill_credential(credential).await {
            info!(tab = %tab_id, "Credential filled from command");
            NativeResponse::success(None)
        } else {
            NativeResponse::failure("No login fields to fill")
        }
    }
}

#[async_trait]
impl VaultBridge for ExtensionMessageBus {
    async fn ping(&self) -> NativeResponse {
        self.dispatch(PageMessage::Ping).await
    }

    async fn get_credentials(&self, url: &str) -> NativeResponse {
        self.dispatch(PageMessage::GetCredentials {
            url: url.to_string(),
        })
        .await
    }

    async fn save_credential(&self, request: SaveCredentialRequest) -> NativeResponse {
        self.dispatch(PageMessage::SaveCredential { data: request })
            .await
    }

    async fn get_credit_cards(&self) -> NativeResponse {
        self.dispatch(PageMessage::GetCreditCards).await
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
