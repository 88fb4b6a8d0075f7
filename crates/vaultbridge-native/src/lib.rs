//! Native-messaging plumbing for VaultBridge.
//!
//! The browser side of the bridge keeps one persistent channel to the native
//! host ([`NativeChannel`]) and multiplexes concurrent calls over it by id
//! ([`RequestCorrelator`]). The host side ([`host`]) reads the same frames on
//! stdin and relays them to the vault over local IPC.

mod channel;
mod codec;
mod connector;
pub mod host;
mod pending;
mod correlator;

pub use channel::{ChannelEvent, NativeChannel};
pub use codec::{NativeCodec, decode_message, encode_message};
pub use connector::{DuplexConnector, HostManifest, NativeConnector, NativeStream, ProcessConnector};
pub use correlator::RequestCorrelator;
pub use pending::PendingTable;
