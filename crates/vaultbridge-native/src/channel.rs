//! Persistent channel to the native host.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::process::Child;
use tokio::sync::broadcast;
use tokio::task::AbortHandle;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, error, info, trace, warn};
use vaultbridge_protocols::{BridgeError, BridgeResult, NativeRequest, NativeResponse};

use crate::codec::{NativeCodec, decode_message, encode_message};
use crate::connector::{BoxedReader, BoxedWriter, NativeConnector};
use crate::pending::PendingTable;

type HostWriter = FramedWrite<BoxedWriter, NativeCodec>;
type HostReader = FramedRead<BoxedReader, NativeCodec>;
type Slot = Arc<Mutex<Option<Arc<ChannelHandle>>>>;

/// Channel lifecycle notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEvent {
    Connected { generation: u64 },
    Disconnected { generation: u64 },
}

/// One live connection. Replaced wholesale on reconnect.
pub(crate) struct ChannelHandle {
    generation: u64,
    writer: tokio::sync::Mutex<HostWriter>,
    closed: AtomicBool,
    reader: Mutex<Option<AbortHandle>>,
}

impl ChannelHandle {
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Write one framed request.
    pub(crate) async fn send(&self, request: &NativeRequest) -> BridgeResult<()> {
        if self.is_closed() {
            return Err(BridgeError::HostDisconnected);
        }
        let payload = encode_message(request)?;
        trace!(id = request.id, kind = %request.kind, "Native send");
        let mut writer = self.writer.lock().await;
        writer.send(payload).await
    }
}

/// Shared pieces the reader task needs after the channel is gone.
#[derive(Clone)]
struct Shared {
    current: Slot,
    pending: PendingTable,
    events: broadcast::Sender<ChannelEvent>,
}

impl Shared {
    /// Tear down `handle` once: clear the slot if it still points there and
    /// reject everything sent on it.
    fn disconnect(&self, handle: &Arc<ChannelHandle>, reason: &str) {
        if handle.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        {
            let mut current = self.current.lock();
            if current.as_ref().is_some_and(|c| Arc::ptr_eq(c, handle)) {
                *current = None;
            }
        }
        if let Some(reader) = handle.reader.lock().take() {
            reader.abort();
        }

        let rejected = self.pending.reject_generation(handle.generation);
        info!(
            generation = handle.generation,
            rejected, "Native host disconnected: {}", reason
        );
        let _ = self.events.send(ChannelEvent::Disconnected {
            generation: handle.generation,
        });
    }
}

/// Manager of the single persistent host channel.
///
/// `connect` is idempotent while a channel is live and concurrent connects
/// are serialized, so at most one host process exists at a time.
pub struct NativeChannel {
    connector: Arc<dyn NativeConnector>,
    max_frame: usize,
    shared: Shared,
    connect_lock: tokio::sync::Mutex<()>,
    generation: AtomicU64,
}

impl NativeChannel {
    pub fn new(connector: Arc<dyn NativeConnector>, max_frame: usize) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            connector,
            max_frame,
            shared: Shared {
                current: Arc::new(Mutex::new(None)),
                pending: PendingTable::new(),
                events,
            },
            connect_lock: tokio::sync::Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// Pending-request table shared with the reader task.
    pub fn pending(&self) -> &PendingTable {
        &self.shared.pending
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.shared.events.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.active().is_some()
    }

    /// Generation of the live channel, if any.
    pub fn generation(&self) -> Option<u64> {
        self.active().map(|h| h.generation)
    }

    fn active(&self) -> Option<Arc<ChannelHandle>> {
        self.shared
            .current
            .lock()
            .as_ref()
            .filter(|h| !h.is_closed())
            .cloned()
    }

    /// Connect, or return the live channel.
    pub(crate) async fn connect_handle(&self) -> BridgeResult<Arc<ChannelHandle>> {
        if let Some(handle) = self.active() {
            return Ok(handle);
        }

        let _guard = self.connect_lock.lock().await;
        if let Some(handle) = self.active() {
            return Ok(handle);
        }

        let stream = self.connector.connect().await?;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let handle = Arc::new(ChannelHandle {
            generation,
            writer: tokio::sync::Mutex::new(FramedWrite::new(
                stream.writer,
                NativeCodec::new(self.max_frame),
            )),
            closed: AtomicBool::new(false),
            reader: Mutex::new(None),
        });
        *self.shared.current.lock() = Some(handle.clone());

        let reader = FramedRead::new(stream.reader, NativeCodec::new(self.max_frame));
        let task = tokio::spawn(Self::receive_loop(
            reader,
            stream.child,
            handle.clone(),
            self.shared.clone(),
        ));
        *handle.reader.lock() = Some(task.abort_handle());

        info!(
            generation,
            host = %self.connector.describe(),
            "Native host connected"
        );
        let _ = self.shared.events.send(ChannelEvent::Connected { generation });
        Ok(handle)
    }

    /// Establish the channel if needed.
    pub async fn connect(&self) -> BridgeResult<()> {
        self.connect_handle().await.map(|_| ())
    }

    /// Write one message on the live channel.
    pub async fn send(&self, request: &NativeRequest) -> BridgeResult<()> {
        let handle = self.active().ok_or(BridgeError::ChannelUnavailable)?;
        handle.send(request).await
    }

    /// Drop the live channel, rejecting everything pending on it.
    pub fn disconnect(&self) {
        let handle = self.shared.current.lock().clone();
        if let Some(handle) = handle {
            self.shared.disconnect(&handle, "closed by bridge");
        }
    }

    async fn receive_loop(
        mut reader: HostReader,
        child: Option<Child>,
        handle: Arc<ChannelHandle>,
        shared: Shared,
    ) {
        let reason = loop {
            match reader.next().await {
                Some(Ok(frame)) => {
                    let response: NativeResponse = match decode_message(&frame) {
                        Ok(response) => response,
                        Err(e) => {
                            warn!("Discarding host message: {}", e);
                            continue;
                        }
                    };
                    match response.id {
                        Some(id) => {
                            if shared.pending.resolve(id, response) {
                                trace!(id, "Native response settled");
                            } else {
                                trace!(id, "Dropping response with unknown id");
                            }
                        }
                        None => trace!("Dropping response without id"),
                    }
                }
                Some(Err(e @ BridgeError::FrameTooLarge { .. })) => {
                    error!("Host protocol violation: {}", e);
                    break e.to_string();
                }
                Some(Err(e)) => break format!("read error: {}", e),
                None => break "host closed stdout".to_string(),
            }
        };

        // Ending on our own; nothing left to abort.
        handle.reader.lock().take();
        shared.disconnect(&handle, &reason);

        if let Some(mut child) = child {
            let _ = child.start_kill();
            match child.wait().await {
                Ok(status) => debug!("Native host exited: {}", status),
                Err(e) => debug!("Failed to reap native host: {}", e),
            }
        }
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
