//! Page-context message surface.
//!
//! Page agents and the popup talk to the bridge with `{action: ...}` objects,
//! a local mirror of the native protocol plus the purely local
//! `fillCredential` command.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::RequestType;
use crate::vault::{Credential, SaveCredentialRequest};

/// A message addressed to the extension message bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PageMessage {
    Ping,
    GetCredentials {
        url: String,
    },
    SaveCredential {
        data: SaveCredentialRequest,
    },
    GetCreditCards,
    /// Fill a credential into a page without re-querying the host.
    #[serde(rename_all = "camelCase")]
    FillCredential {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tab_id: Option<String>,
        credential: Credential,
    },
}

impl PageMessage {
    /// Action name as it appears on the wire.
    pub fn action(&self) -> &'static str {
        match self {
            PageMessage::Ping => "ping",
            PageMessage::GetCredentials { .. } => "getCredentials",
            PageMessage::SaveCredential { .. } => "saveCredential",
            PageMessage::GetCreditCards => "getCreditCards",
            PageMessage::FillCredential { .. } => "fillCredential",
        }
    }

    /// Native request this message proxies to, if any.
    ///
    /// `fillCredential` is handled locally and has no native counterpart.
    pub fn native_request(&self) -> Option<(RequestType, Option<Value>)> {
        match self {
            PageMessage::Ping => Some((RequestType::Ping, None)),
            PageMessage::GetCredentials { url } => Some((
                RequestType::GetCredentials,
                Some(serde_json::json!({ "url": url })),
            )),
            PageMessage::SaveCredential { data } => Some((
                RequestType::SaveCredential,
                serde_json::to_value(data).ok(),
            )),
            PageMessage::GetCreditCards => Some((RequestType::GetCreditCards, None)),
            PageMessage::FillCredential { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_get_credentials() {
        let msg: PageMessage =
            serde_json::from_value(json!({"action": "getCredentials", "url": "github.com"})).unwrap();
        assert_eq!(
            msg,
            PageMessage::GetCredentials {
                url: "github.com".to_string()
            }
        );
        assert_eq!(msg.action(), "getCredentials");
    }

    #[test]
    fn test_parse_ping() {
        let msg: PageMessage = serde_json::from_value(json!({"action": "ping"})).unwrap();
        assert_eq!(msg, PageMessage::Ping);
    }

    #[test]
    fn test_parse_fill_credential() {
        let msg: PageMessage = serde_json::from_value(json!({
            "action": "fillCredential",
            "tabId": "tab-3",
            "credential": {"username": "bob", "password": "p@ss"}
        }))
        .unwrap();
        match msg {
            PageMessage::FillCredential { tab_id, credential } => {
                assert_eq!(tab_id.as_deref(), Some("tab-3"));
                assert_eq!(credential.username, "bob");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_action_rejected() {
        let result: Result<PageMessage, _> =
            serde_json::from_value(json!({"action": "exportVault"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_native_request_mapping() {
        let msg = PageMessage::GetCredentials {
            url: "example.com".to_string(),
        };
        let (kind, data) = msg.native_request().unwrap();
        assert_eq!(kind, RequestType::GetCredentials);
        assert_eq!(data.unwrap()["url"], "example.com");

        let save = PageMessage::SaveCredential {
            data: SaveCredentialRequest::new("example.com", "https://example.com", "alice", "pw"),
        };
        let (kind, data) = save.native_request().unwrap();
        assert_eq!(kind, RequestType::SaveCredential);
        assert_eq!(data.unwrap()["category"], "Other");
    }

    #[test]
    fn test_fill_has_no_native_request() {
        let msg = PageMessage::FillCredential {
            tab_id: None,
            credential: Credential::default(),
        };
        assert!(msg.native_request().is_none());
    }
}
