//! Bus task and its client handle.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use vaultbridge_protocols::{NativeResponse, SaveCredentialRequest, VaultBridge};

use crate::bus::ExtensionMessageBus;

/// A message plus the slot its response goes to.
pub struct BusRequest {
    pub message: Value,
    pub reply: oneshot::Sender<NativeResponse>,
}

/// Cloneable sender side of a running bus.
#[derive(Clone)]
pub struct BusClient {
    tx: mpsc::Sender<BusRequest>,
}

impl BusClient {
    /// Send a raw `{action: ...}` message and wait for the answer.
    pub async fn request(&self, message: Value) -> NativeResponse {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(BusRequest { message, reply }).await.is_err() {
            return NativeResponse::failure("message bus closed");
        }
        rx.await
            .unwrap_or_else(|_| NativeResponse::failure("message bus closed"))
    }
}

#[async_trait]
impl VaultBridge for BusClient {
    async fn ping(&self) -> NativeResponse {
        self.request(json!({ "action": "ping" })).await
    }

    async fn get_credentials(&self, url: &str) -> NativeResponse {
        self.request(json!({ "action": "getCredentials", "url": url }))
            .await
    }

    async fn save_credential(&self, request: SaveCredentialRequest) -> NativeResponse {
        self.request(json!({ "action": "saveCredential", "data": request }))
            .await
    }

    async fn get_credit_cards(&self) -> NativeResponse {
        self.request(json!({ "action": "getCreditCards" })).await
    }
}

/// Run `bus` on its own task until `shutdown` fires or every client is gone.
///
/// Each message is handled on a separate task, so a slow host call never
/// blocks the messages queued behind it.
pub fn spawn_bus(
    bus: Arc<ExtensionMessageBus>,
    shutdown: CancellationToken,
) -> (BusClient, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<BusRequest>(64);

    let task = tokio::spawn(async move {
        info!("Extension message bus started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Message bus shutting down");
                    break;
                }
                request = rx.recv() => {
                    let Some(BusRequest { message, reply }) = request else {
                        break;
                    };
                    let bus = bus.clone();
                    tokio::spawn(async move {
                        let response = bus.handle_value(message).await;
                        let _ = reply.send(response);
                    });
                }
            }
        }
        info!("Extension message bus stopped");
    });

    (BusClient { tx }, task)
}
