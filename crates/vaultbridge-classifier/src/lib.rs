//! Field heuristics for the VaultZero bridge.
//!
//! Pure functions over a [`Document`](vaultbridge_dom::Document): every call
//! is a full re-scan, and no state is kept between passes.
//!
//! - [`detect_login_fields`] pairs each password field with a username
//!   companion.
//! - [`detect_payment_fields`] groups card-number fields with cardholder,
//!   expiry and CVV fields.

mod error;
mod login;
mod payment;
mod report;
mod selectors;

pub use error::ClassifyError;
pub use login::{LoginFieldSet, classify_password_field, detect_login_fields, submit_controls};
pub use payment::{CARD_MARKER, PaymentFieldSet, classify_card_field, detect_payment_fields};
pub use report::{LoginReport, PaymentReport, ScanReport};
