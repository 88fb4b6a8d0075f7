//! Outstanding requests awaiting a host response.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use vaultbridge_protocols::{BridgeError, BridgeResult, NativeResponse};

pub(crate) type Settle = oneshot::Sender<BridgeResult<NativeResponse>>;

/// Pending request waiting for response.
struct PendingRequest {
    /// Channel generation the request was sent on.
    generation: u64,
    tx: Settle,
}

/// Table of in-flight requests keyed by correlation id.
///
/// Every settle path (response, timeout, disconnect) removes the entry under
/// the same lock, so whichever removes it first is the only one to settle.
#[derive(Clone, Default)]
pub struct PendingTable {
    inner: Arc<Mutex<HashMap<u64, PendingRequest>>>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, id: u64, generation: u64, tx: Settle) {
        self.inner
            .lock()
            .insert(id, PendingRequest { generation, tx });
    }

    /// Settle `id` with a host response. Returns false for unknown ids.
    pub fn resolve(&self, id: u64, response: NativeResponse) -> bool {
        let entry = self.inner.lock().remove(&id);
        match entry {
            Some(req) => {
                let _ = req.tx.send(Ok(response));
                true
            }
            None => false,
        }
    }

    /// Drop `id` without settling it. Returns false if it was already gone.
    pub fn remove(&self, id: u64) -> bool {
        self.inner.lock().remove(&id).is_some()
    }

    /// Reject every request sent on `generation` with `HostDisconnected`.
    pub fn reject_generation(&self, generation: u64) -> usize {
        let rejected: Vec<PendingRequest> = {
            let mut inner = self.inner.lock();
            let ids: Vec<u64> = inner
                .iter()
                .filter(|(_, req)| req.generation == generation)
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter().filter_map(|id| inner.remove(&id)).collect()
        };

        let count = rejected.len();
        for req in rejected {
            let _ = req.tx.send(Err(BridgeError::HostDisconnected));
        }
        count
    }

    pub fn contains(&self, id: u64) -> bool {
        self.inner.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
