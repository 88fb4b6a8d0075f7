//! Chrome native-messaging framing.
//!
//! Every message is UTF-8 JSON preceded by its length as a 4-byte
//! little-endian integer.

use bytes::{Bytes, BytesMut};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};
use vaultbridge_protocols::{BridgeError, BridgeResult};

const HEADER_LEN: usize = 4;

/// Length-prefixed frame codec with a hard size ceiling.
///
/// A frame whose header announces more than `max_frame` bytes is rejected
/// with [`BridgeError::FrameTooLarge`] before any payload is buffered.
#[derive(Debug)]
pub struct NativeCodec {
    inner: LengthDelimitedCodec,
    max_frame: usize,
    /// The inner codec has consumed a header and is waiting for its payload.
    in_body: bool,
}

impl NativeCodec {
    pub fn new(max_frame: usize) -> Self {
        let inner = LengthDelimitedCodec::builder()
            .little_endian()
            .length_field_length(HEADER_LEN)
            .max_frame_length(max_frame)
            .new_codec();
        Self {
            inner,
            max_frame,
            in_body: false,
        }
    }
}

impl Decoder for NativeCodec {
    type Item = BytesMut;
    type Error = BridgeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let at_header = !self.in_body && src.len() >= HEADER_LEN;
        if at_header {
            let size = u32::from_le_bytes([src[0], src[1], src[2], src[3]]) as usize;
            if size > self.max_frame {
                return Err(BridgeError::FrameTooLarge {
                    size,
                    max: self.max_frame,
                });
            }
        }

        let frame = self.inner.decode(src)?;
        self.in_body = match frame {
            Some(_) => false,
            None => self.in_body || at_header,
        };
        Ok(frame)
    }
}

impl Encoder<Bytes> for NativeCodec {
    type Error = BridgeError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.len() > self.max_frame {
            return Err(BridgeError::FrameTooLarge {
                size: item.len(),
                max: self.max_frame,
            });
        }
        Ok(self.inner.encode(item, dst)?)
    }
}

/// Serialize a message into a frame payload.
pub fn encode_message<T: Serialize>(message: &T) -> BridgeResult<Bytes> {
    Ok(Bytes::from(serde_json::to_vec(message)?))
}

/// Parse a frame payload.
pub fn decode_message<T: DeserializeOwned>(payload: &[u8]) -> BridgeResult<T> {
    serde_json::from_slice(payload)
        .map_err(|e| BridgeError::Protocol(format!("invalid message: {}", e)))
}
