//! Bridge errors.

use thiserror::Error;

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors raised between the message bus and the native host.
///
/// Callers of the correlator never see these directly: they are flattened
/// into `{success: false, error: <Display>}` response objects.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No channel to the native host exists and none could be opened.
    #[error("host not running")]
    ChannelUnavailable,

    /// The host did not answer within the request deadline.
    #[error("Request timeout")]
    RequestTimeout,

    /// The channel dropped while the request was pending.
    #[error("host disconnected")]
    HostDisconnected,

    /// The host could not be located (manifest or executable missing).
    #[error("Native host not found: {0}")]
    HostNotFound(String),

    /// A frame exceeded the native-messaging size limit.
    #[error("Frame too large: {size} bytes, max {max} bytes")]
    FrameTooLarge { size: usize, max: usize },

    /// The peer sent something that is not a valid envelope.
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether the error means the vault should be treated as not running.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            BridgeError::ChannelUnavailable
                | BridgeError::HostDisconnected
                | BridgeError::HostNotFound(_)
        )
    }
}
