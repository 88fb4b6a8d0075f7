//! # VaultBridge Protocols
//!
//! Shared definitions for the VaultBridge workspace.
//! Contains wire types and trait seams only - no I/O.
//!
//! ## Contents
//!
//! - [`NativeRequest`] / [`NativeResponse`] - native-messaging envelopes
//! - [`Credential`] / [`CreditCard`] - vault records as the host returns them
//! - [`PageMessage`] - the action surface exposed to page agents and the popup
//! - [`VaultBridge`] - what the autofill controller needs from the bridge
//! - [`PageAgent`] - what the bridge can ask of a page context
//! - [`BridgeError`] - failure taxonomy of the native bridge

pub mod bridge;
pub mod error;
pub mod message;
pub mod page;
pub mod vault;

pub use bridge::{PageAgent, VaultBridge};
pub use error::{BridgeError, BridgeResult};
pub use message::{NativeRequest, NativeResponse, RequestType};
pub use page::PageMessage;
pub use vault::{Credential, CreditCard, SaveCredentialRequest, DEFAULT_CATEGORY};
