//! Native host relay.
//!
//! Runs on the host side of the channel: reads framed requests from the
//! browser, forwards them to the vault application over local IPC, and
//! writes framed responses back.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, warn};
use vaultbridge_config::{ConfigLoader, HostConfig};
use vaultbridge_protocols::{BridgeResult, NativeResponse};

use crate::codec::{NativeCodec, encode_message};

/// Relay errors.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("VaultZero is not running: {0}")]
    VaultUnreachable(String),

    #[error("{0}")]
    Rejected(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Request understood by the vault's IPC endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum VaultRequest {
    Search { url: String },
    Save { data: Value },
    GetCreditCards,
}

/// Reply from the vault's IPC endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_cards: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VaultReply {
    fn into_checked(self, fallback: &str) -> Result<Self, RelayError> {
        if self.success {
            Ok(self)
        } else {
            Err(RelayError::Rejected(
                self.error.unwrap_or_else(|| fallback.to_string()),
            ))
        }
    }
}

/// Access to the vault application.
#[async_trait]
pub trait VaultClient: Send + Sync {
    /// Send one request and read its reply.
    async fn exchange(&self, request: &VaultRequest) -> Result<VaultReply, RelayError>;
}

/// Vault client over a Unix socket or, on Windows, a named pipe.
///
/// Each exchange opens its own connection, retried until the connect
/// deadline.
pub struct SocketVaultClient {
    endpoint: String,
    connect_deadline: Duration,
    retry_interval: Duration,
    dial_timeout: Duration,
    max_reply: usize,
}

impl SocketVaultClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::from_config(&HostConfig {
            vault_endpoint: endpoint.into(),
            ..Default::default()
        })
    }

    pub fn from_config(config: &HostConfig) -> Self {
        Self {
            endpoint: ConfigLoader::expand_path(&config.vault_endpoint),
            connect_deadline: config.connect_deadline(),
            retry_interval: config.retry_interval(),
            dial_timeout: Duration::from_secs(1),
            max_reply: config.max_reply_bytes,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn connect(&self) -> Result<IpcStream, RelayError> {
        let deadline = tokio::time::Instant::now() + self.connect_deadline;
        loop {
            match tokio::time::timeout(self.dial_timeout, dial(&self.endpoint)).await {
                Ok(Ok(stream)) => return Ok(stream),
                Ok(Err(e)) => debug!("Vault connection attempt failed: {}", e),
                Err(_) => debug!("Vault connection attempt timed out"),
            }
            if tokio::time::Instant::now() + self.retry_interval >= deadline {
                return Err(RelayError::VaultUnreachable(
                    "connection timeout - is VaultZero running and unlocked?".to_string(),
                ));
            }
            tokio::time::sleep(self.retry_interval).await;
        }
    }
}

#[async_trait]
impl VaultClient for SocketVaultClient {
    async fn exchange(&self, request: &VaultRequest) -> Result<VaultReply, RelayError> {
        let stream = self.connect().await?;
        let (reader, mut writer) = tokio::io::split(stream);

        let mut line = serde_json::to_vec(request)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;

        let mut reply = String::new();
        BufReader::new(reader.take(self.max_reply as u64))
            .read_line(&mut reply)
            .await?;
        Ok(serde_json::from_str(reply.trim())?)
    }
}

#[cfg(unix)]
type IpcStream = tokio::net::UnixStream;

#[cfg(unix)]
async fn dial(endpoint: &str) -> io::Result<IpcStream> {
    tokio::net::UnixStream::connect(endpoint).await
}

#[cfg(windows)]
type IpcStream = tokio::net::windows::named_pipe::NamedPipeClient;

#[cfg(windows)]
async fn dial(endpoint: &str) -> io::Result<IpcStream> {
    tokio::net::windows::named_pipe::ClientOptions::new().open(endpoint)
}

/// Message received from the browser.
#[derive(Debug, Deserialize)]
struct HostMessage {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    data: Option<Value>,
}

/// Answer one browser message.
pub async fn handle_message(message: &Value, vault: &dyn VaultClient) -> NativeResponse {
    let message: HostMessage = match serde_json::from_value(message.clone()) {
        Ok(message) => message,
        Err(e) => {
            return NativeResponse::failure(format!("Failed to read message: {}", e))
                .with_kind("error");
        }
    };

    let data_str = |key: &str| -> String {
        message
            .data
            .as_ref()
            .and_then(|d| d.get(key))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let response = match message.kind.as_str() {
        "ping" => NativeResponse::success(Some(json!({ "status": "alive" }))).with_kind("pong"),
        "getCredentials" => {
            let request = VaultRequest::Search { url: data_str("url") };
            let result = vault
                .exchange(&request)
                .await
                .and_then(|r| r.into_checked("search failed"));
            let response = match result {
                Ok(reply) => NativeResponse::success(Some(json!({
                    "credentials": reply.credentials.unwrap_or_default()
                }))),
                Err(e) => NativeResponse::failure(e.to_string()),
            };
            response.with_kind("credentials")
        }
        "saveCredential" => {
            let request = VaultRequest::Save {
                data: message.data.clone().unwrap_or_else(|| json!({})),
            };
            let result = vault
                .exchange(&request)
                .await
                .and_then(|r| r.into_checked("failed to save credential"));
            let response = match result {
                Ok(_) => NativeResponse::success(None),
                Err(e) => NativeResponse::failure(e.to_string()),
            };
            response.with_kind("saved")
        }
        "getCreditCards" => {
            let result = vault
                .exchange(&VaultRequest::GetCreditCards)
                .await
                .and_then(|r| r.into_checked("failed to load cards"));
            let response = match result {
                Ok(reply) => NativeResponse::success(Some(json!({
                    "cards": reply.credit_cards.unwrap_or_default()
                }))),
                Err(e) => NativeResponse::failure(e.to_string()),
            };
            response.with_kind("creditCards")
        }
        other => NativeResponse::failure(format!("Unknown message type: {}", other)).with_kind("error"),
    };

    match message.id {
        Some(id) => response.with_id(id),
        None => response,
    }
}

/// Serve framed requests from `input` until the browser closes it.
///
/// Requests are answered in arrival order.
pub async fn run_relay<R, W>(
    input: R,
    output: W,
    vault: Arc<dyn VaultClient>,
    max_frame: usize,
) -> BridgeResult<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = FramedRead::new(input, NativeCodec::new(max_frame));
    let mut writer = FramedWrite::new(output, NativeCodec::new(max_frame));

    info!("Native host relay started");

    while let Some(frame) = reader.next().await {
        let response = match frame {
            Ok(frame) => match serde_json::from_slice::<Value>(&frame) {
                Ok(message) => {
                    let kind = message.get("type").and_then(Value::as_str).unwrap_or("");
                    debug!(kind, "Relay received");
                    handle_message(&message, vault.as_ref()).await
                }
                Err(e) => NativeResponse::failure(format!("Failed to read message: {}", e))
                    .with_kind("error"),
            },
            Err(e) => {
                warn!("Relay read failed: {}", e);
                return Err(e);
            }
        };

        if let Err(e) = writer.send(encode_message(&response)?).await {
            warn!("Failed to send response: {}", e);
            return Err(e);
        }
    }

    info!("Browser closed the channel, relay exiting");
    Ok(())
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
