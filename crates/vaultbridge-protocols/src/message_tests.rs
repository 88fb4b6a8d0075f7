use super::*;
use serde_json::json;

#[test]
fn test_request_type_wire_names() {
    assert_eq!(RequestType::Ping.as_str(), "ping");
    assert_eq!(RequestType::GetCredentials.as_str(), "getCredentials");
    assert_eq!(RequestType::SaveCredential.as_str(), "saveCredential");
    assert_eq!(RequestType::GetCreditCards.as_str(), "getCreditCards");
}

#[test]
fn test_request_serialization() {
    let request = NativeRequest::new(
        7,
        RequestType::GetCredentials,
        Some(json!({"url": "github.com"})),
    );
    let value = serde_json::to_value(&request).unwrap();
    assert_eq!(value["id"], 7);
    assert_eq!(value["type"], "getCredentials");
    assert_eq!(value["data"]["url"], "github.com");
}

#[test]
fn test_request_without_data_omits_field() {
    let request = NativeRequest::new(1, RequestType::Ping, None);
    let json = serde_json::to_string(&request).unwrap();
    assert!(!json.contains("data"));
}

#[test]
fn test_response_deserialization_from_host() {
    let json = r#"{"type":"pong","id":3,"success":true,"data":{"status":"alive"}}"#;
    let response: NativeResponse = serde_json::from_str(json).unwrap();
    assert_eq!(response.id, Some(3));
    assert_eq!(response.kind.as_deref(), Some("pong"));
    assert!(response.success);
    assert_eq!(response.data_field("status"), Some(&json!("alive")));
}

#[test]
fn test_response_missing_success_defaults_false() {
    let response: NativeResponse = serde_json::from_str(r#"{"id":1}"#).unwrap();
    assert!(!response.success);
}

#[test]
fn test_failure_response() {
    let response = NativeResponse::failure("Request timeout");
    assert!(!response.success);
    assert_eq!(response.error.as_deref(), Some("Request timeout"));
    let json = serde_json::to_string(&response).unwrap();
    assert!(!json.contains("\"id\""));
}

#[test]
fn test_response_from_bridge_error() {
    let response = NativeResponse::from(BridgeError::ChannelUnavailable);
    assert!(!response.success);
    assert_eq!(response.error.as_deref(), Some("host not running"));
}

#[test]
fn test_credentials_extraction() {
    let response = NativeResponse::success(Some(json!({
        "credentials": [
            {"id": "1", "serviceName": "GitHub", "url": "https://github.com", "username": "alice", "password": "pw", "category": "Dev"},
            {"id": "2", "username": "bob"},
            "not-a-credential"
        ]
    })));
    let credentials = response.credentials().unwrap();
    assert_eq!(credentials.len(), 2);
    assert_eq!(credentials[0].service_name, "GitHub");
    assert_eq!(credentials[1].username, "bob");
    assert!(credentials[1].password.is_empty());
}

#[test]
fn test_credentials_none_on_failure() {
    let mut response = NativeResponse::failure("Vault is locked");
    response.data = Some(json!({"credentials": []}));
    assert!(response.credentials().is_none());
}

#[test]
fn test_cards_extraction() {
    let response = NativeResponse::success(Some(json!({
        "cards": [{
            "id": "c1",
            "cardName": "Personal Visa",
            "cardholderName": "Alice Smith",
            "cardNumber": "4111111111111111",
            "expiryMonth": "3",
            "expiryYear": "2027",
            "cvv": "123"
        }]
    })));
    let cards = response.cards().unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].cardholder_name, "Alice Smith");
    assert!(cards[0].billing_zip.is_none());
}
