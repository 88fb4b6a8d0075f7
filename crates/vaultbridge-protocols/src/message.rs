//! Native-messaging envelopes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BridgeError;
use crate::vault::{Credential, CreditCard};

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;

/// Request types understood by the native host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestType {
    Ping,
    GetCredentials,
    SaveCredential,
    GetCreditCards,
}

impl RequestType {
    /// Wire name of the request type.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Ping => "ping",
            RequestType::GetCredentials => "getCredentials",
            RequestType::SaveCredential => "saveCredential",
            RequestType::GetCreditCards => "getCreditCards",
        }
    }
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request sent to the native host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NativeRequest {
    /// Correlation id, unique per channel lifetime.
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: RequestType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl NativeRequest {
    pub fn new(id: u64, kind: RequestType, data: Option<Value>) -> Self {
        Self { id, kind, data }
    }
}

/// Response from the native host, and the uniform result object every
/// bridge caller receives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NativeResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NativeResponse {
    /// Successful response carrying `data`.
    pub fn success(data: Option<Value>) -> Self {
        Self {
            success: true,
            data,
            ..Default::default()
        }
    }

    /// Failed response with an error message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Set the correlation id.
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the response type tag.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Look up a top-level key inside `data`.
    pub fn data_field(&self, key: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|d| d.get(key))
    }

    /// Credentials carried in `data.credentials`.
    ///
    /// Returns `None` when the response failed or carries no list; malformed
    /// entries are skipped rather than failing the whole list.
    pub fn credentials(&self) -> Option<Vec<Credential>> {
        if !self.success {
            return None;
        }
        self.data_field("credentials")
            .and_then(Value::as_array)
            .map(|items| parse_lenient(items))
    }

    /// Cards carried in `data.cards`.
    pub fn cards(&self) -> Option<Vec<CreditCard>> {
        if !self.success {
            return None;
        }
        self.data_field("cards")
            .and_then(Value::as_array)
            .map(|items| parse_lenient(items))
    }
}

impl From<BridgeError> for NativeResponse {
    fn from(err: BridgeError) -> Self {
        NativeResponse::failure(err.to_string())
    }
}

fn parse_lenient<T: serde::de::DeserializeOwned>(items: &[Value]) -> Vec<T> {
    items
        .iter()
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect()
}
