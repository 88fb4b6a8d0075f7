//! Extension message bus.
//!
//! Page agents and the popup send `{action: ...}` messages here. The four
//! vault actions are proxied 1:1 to the native host through the request
//! correlator; `fillCredential` is routed to the page agent registered for
//! the target tab.

mod bus;
mod service;

pub use bus::ExtensionMessageBus;
pub use service::{BusClient, BusRequest, spawn_bus};
