//! Human-readable scan results.

use serde::Serialize;
use vaultbridge_dom::{Document, NodeId};

use crate::login::{LoginFieldSet, detect_login_fields};
use crate::payment::{PaymentFieldSet, detect_payment_fields};

/// Detected field sets, with elements rendered as short descriptions.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub url: String,
    pub login: Vec<LoginReport>,
    pub payment: Vec<PaymentReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginReport {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentReport {
    pub card_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cardholder_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cvv: Option<String>,
}

impl ScanReport {
    /// Run both detectors over `doc`.
    pub fn scan(doc: &Document) -> Self {
        Self {
            url: doc.href().to_string(),
            login: detect_login_fields(doc)
                .iter()
                .map(|set| LoginReport::new(doc, set))
                .collect(),
            payment: detect_payment_fields(doc)
                .iter()
                .map(|set| PaymentReport::new(doc, set))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.login.is_empty() && self.payment.is_empty()
    }
}

fn describe(doc: &Document, id: NodeId) -> String {
    doc.element(id).describe()
}

impl LoginReport {
    fn new(doc: &Document, set: &LoginFieldSet) -> Self {
        Self {
            username: describe(doc, set.username),
            password: describe(doc, set.password),
            form: set.form.map(|f| describe(doc, f)),
        }
    }
}

impl PaymentReport {
    fn new(doc: &Document, set: &PaymentFieldSet) -> Self {
        let opt = |id: Option<NodeId>| id.map(|id| describe(doc, id));
        Self {
            card_number: describe(doc, set.card_number),
            cardholder_name: opt(set.cardholder_name),
            expiry_month: opt(set.expiry_month),
            expiry_year: opt(set.expiry_year),
            cvv: opt(set.cvv),
        }
    }
}
