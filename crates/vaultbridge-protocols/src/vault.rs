//! Vault records as exchanged with the native host.
//!
//! The extension never persists these; they live only as long as the menu
//! or fill operation that requested them.

use serde::{Deserialize, Serialize};

/// Category attached to credentials saved from the browser.
pub const DEFAULT_CATEGORY: &str = "Other";

/// A stored login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Credential {
    pub id: String,
    pub service_name: String,
    pub url: String,
    pub username: String,
    pub password: String,
    pub category: String,
}

impl Credential {
    /// Label shown in menus: the service name, or the URL when unnamed.
    pub fn display_name(&self) -> &str {
        if self.service_name.is_empty() {
            &self.url
        } else {
            &self.service_name
        }
    }

    /// Case-insensitive username comparison used for duplicate detection.
    pub fn matches_username(&self, username: &str) -> bool {
        self.username.to_lowercase() == username.to_lowercase()
    }
}

/// A stored payment card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreditCard {
    pub id: String,
    pub card_name: String,
    pub cardholder_name: String,
    pub card_number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub cvv: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_zip: Option<String>,
}

impl CreditCard {
    /// Card number reduced to its last four digits, e.g. `•••• •••• •••• 1111`.
    pub fn masked_number(&self) -> String {
        let digits: Vec<char> = self.card_number.chars().collect();
        let start = digits.len().saturating_sub(4);
        let last_four: String = digits[start..].iter().collect();
        format!("\u{2022}\u{2022}\u{2022}\u{2022} \u{2022}\u{2022}\u{2022}\u{2022} \u{2022}\u{2022}\u{2022}\u{2022} {last_four}")
    }

    /// Month padded to two digits (`3` -> `03`).
    pub fn padded_month(&self) -> String {
        format!("{:0>2}", self.expiry_month)
    }

    /// Last two digits of the expiry year (`2027` -> `27`).
    pub fn short_year(&self) -> String {
        let chars: Vec<char> = self.expiry_year.chars().collect();
        let start = chars.len().saturating_sub(2);
        chars[start..].iter().collect()
    }

    /// Combined `MM/YY` expiry string.
    pub fn expiry_mm_yy(&self) -> String {
        format!("{}/{}", self.padded_month(), self.short_year())
    }
}

/// Payload of a `saveCredential` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveCredentialRequest {
    pub service_name: String,
    pub url: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl SaveCredentialRequest {
    /// Build a save request for a login observed on `page_url`.
    ///
    /// `service_name` is the page hostname, matching what the vault uses to
    /// look the credential up again.
    pub fn new(
        service_name: impl Into<String>,
        page_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            url: page_url.into(),
            username: username.into(),
            password: password.into(),
            category: default_category(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> CreditCard {
        CreditCard {
            id: "c1".to_string(),
            card_name: "Personal Visa".to_string(),
            cardholder_name: "Alice Smith".to_string(),
            card_number: "4111111111111234".to_string(),
            expiry_month: "3".to_string(),
            expiry_year: "2027".to_string(),
            cvv: "123".to_string(),
            billing_zip: None,
        }
    }

    #[test]
    fn test_display_name_falls_back_to_url() {
        let cred = Credential {
            url: "https://example.com".to_string(),
            ..Default::default()
        };
        assert_eq!(cred.display_name(), "https://example.com");

        let named = Credential {
            service_name: "Example".to_string(),
            ..cred
        };
        assert_eq!(named.display_name(), "Example");
    }

    #[test]
    fn test_matches_username_case_insensitive() {
        let cred = Credential {
            username: "Alice@Example.com".to_string(),
            ..Default::default()
        };
        assert!(cred.matches_username("alice@example.com"));
        assert!(!cred.matches_username("bob@example.com"));
    }

    #[test]
    fn test_masked_number() {
        assert!(card().masked_number().ends_with(" 1234"));
        assert!(card().masked_number().starts_with('\u{2022}'));
    }

    #[test]
    fn test_masked_number_short_input() {
        let short = CreditCard {
            card_number: "12".to_string(),
            ..card()
        };
        assert!(short.masked_number().ends_with(" 12"));
    }

    #[test]
    fn test_expiry_formatting() {
        let card = card();
        assert_eq!(card.padded_month(), "03");
        assert_eq!(card.short_year(), "27");
        assert_eq!(card.expiry_mm_yy(), "03/27");
    }

    #[test]
    fn test_save_request_defaults_category() {
        let request = SaveCredentialRequest::new("github.com", "https://github.com/login", "alice", "pw");
        assert_eq!(request.category, "Other");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["serviceName"], "github.com");
        assert_eq!(value["url"], "https://github.com/login");
    }

    #[test]
    fn test_save_request_missing_category_deserializes() {
        let json = r#"{"serviceName":"a","url":"b","username":"c","password":"d"}"#;
        let request: SaveCredentialRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.category, DEFAULT_CATEGORY);
    }
}
