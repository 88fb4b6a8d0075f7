//! The bridge as seen from a page context.

use async_trait::async_trait;

use crate::message::NativeResponse;
use crate::vault::{Credential, SaveCredentialRequest};

/// Vault access required by the autofill controller.
///
/// Every method returns a response object, never an error: a vault that is
/// absent, locked or slow shows up as `success: false`.
#[async_trait]
pub trait VaultBridge: Send + Sync {
    /// Check whether the vault answers at all.
    async fn ping(&self) -> NativeResponse;

    /// Credentials stored for `url` (a hostname or full URL).
    async fn get_credentials(&self, url: &str) -> NativeResponse;

    /// Store a new credential.
    async fn save_credential(&self, request: SaveCredentialRequest) -> NativeResponse;

    /// All stored payment cards.
    async fn get_credit_cards(&self) -> NativeResponse;
}

/// A page context that accepts commands from other extension surfaces.
#[async_trait]
pub trait PageAgent: Send + Sync {
    /// Fill `credential` into the page's active login fields without
    /// querying the host. Returns false when there was nothing to fill.
    async fn fill_credential(&self, credential: Credential) -> bool;
}
