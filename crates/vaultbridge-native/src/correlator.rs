//! Request/response correlation over the native channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, warn};
use vaultbridge_config::NativeConfig;
use vaultbridge_protocols::{
    BridgeError, BridgeResult, NativeRequest, NativeResponse, RequestType, SaveCredentialRequest,
    VaultBridge,
};

use crate::channel::{ChannelEvent, NativeChannel};
use crate::connector::{NativeConnector, ProcessConnector};
use crate::pending::PendingTable;

/// Turns the message-oriented host channel into awaitable calls.
///
/// Ids are allocated from 1 and never reused for the lifetime of the
/// correlator, across reconnects.
pub struct RequestCorrelator {
    channel: NativeChannel,
    next_id: AtomicU64,
    timeout: Duration,
}

impl RequestCorrelator {
    pub fn new(connector: Arc<dyn NativeConnector>, timeout: Duration, max_frame: usize) -> Self {
        Self {
            channel: NativeChannel::new(connector, max_frame),
            next_id: AtomicU64::new(1),
            timeout,
        }
    }

    /// Correlator that spawns the configured host process.
    pub fn from_config(config: &NativeConfig) -> Self {
        Self::new(
            Arc::new(ProcessConnector::from_config(config)),
            config.request_timeout(),
            config.max_frame_bytes,
        )
    }

    pub fn channel(&self) -> &NativeChannel {
        &self.channel
    }

    pub fn pending(&self) -> &PendingTable {
        self.channel.pending()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.channel.subscribe()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send a request and wait for its response.
    ///
    /// Never fails: every error becomes `{success: false, error}`.
    pub async fn call(&self, kind: RequestType, data: Option<Value>) -> NativeResponse {
        match self.try_call(kind, data).await {
            Ok(response) => response,
            Err(err) => {
                if err.is_unavailable() {
                    debug!(?kind, "Native call failed, host unavailable: {}", err);
                } else {
                    warn!(?kind, "Native call failed: {}", err);
                }
                NativeResponse::from(err)
            }
        }
    }

    /// Send a request and wait for its response, surfacing bridge errors.
    ///
    /// A response with `success: false` from the host is still `Ok`.
    pub async fn try_call(&self, kind: RequestType, data: Option<Value>) -> BridgeResult<NativeResponse> {
        let handle = match self.channel.connect_handle().await {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Native host unavailable: {}", e);
                return Err(BridgeError::ChannelUnavailable);
            }
        };

        let pending = self.channel.pending();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, mut rx) = oneshot::channel();
        pending.insert(id, handle.generation(), tx);

        // The channel may have dropped between connect and insert, after its
        // pending requests were already rejected.
        if handle.is_closed() && pending.remove(id) {
            return Err(BridgeError::HostDisconnected);
        }

        let request = NativeRequest::new(id, kind, data);
        if let Err(e) = handle.send(&request).await {
            if pending.remove(id) {
                debug!(id, "Native send failed: {}", e);
                return Err(e);
            }
        }

        match tokio::time::timeout(self.timeout, &mut rx).await {
            Ok(settled) => Self::settle(settled),
            Err(_) => {
                if pending.remove(id) {
                    debug!(id, kind = %kind, "Native request timed out");
                    Err(BridgeError::RequestTimeout)
                } else {
                    // Settled concurrently with the timer.
                    Self::settle(rx.await)
                }
            }
        }
    }

    fn settle(
        settled: Result<BridgeResult<NativeResponse>, oneshot::error::RecvError>,
    ) -> BridgeResult<NativeResponse> {
        match settled {
            Ok(result) => result,
            Err(_) => Err(BridgeError::HostDisconnected),
        }
    }

    pub async fn ping(&self) -> NativeResponse {
        self.call(RequestType::Ping, None).await
    }

    pub async fn get_credentials(&self, url: &str) -> NativeResponse {
        self.call(RequestType::GetCredentials, Some(json!({ "url": url })))
            .await
    }

    pub async fn save_credential(&self, request: &SaveCredentialRequest) -> NativeResponse {
        match serde_json::to_value(request) {
            Ok(data) => self.call(RequestType::SaveCredential, Some(data)).await,
            Err(e) => NativeResponse::from(BridgeError::from(e)),
        }
    }

    pub async fn get_credit_cards(&self) -> NativeResponse {
        self.call(RequestType::GetCreditCards, None).await
    }
}

#[async_trait]
impl VaultBridge for RequestCorrelator {
    async fn ping(&self) -> NativeResponse {
        RequestCorrelator::ping(self).await
    }

    async fn get_credentials(&self, url: &str) -> NativeResponse {
        RequestCorrelator::get_credentials(self, url).await
    }

    async fn save_credential(&self, request: SaveCredentialRequest) -> NativeResponse {
        RequestCorrelator::save_credential(self, &request).await
    }

    async fn get_credit_cards(&self) -> NativeResponse {
        RequestCorrelator::get_credit_cards(self).await
    }
}

#[cfg(test)]
#[path = "correlator_tests.rs"]
mod tests;
