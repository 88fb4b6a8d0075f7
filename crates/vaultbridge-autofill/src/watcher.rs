//! Re-scan the page when its structure changes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};
use vaultbridge_dom::MutationRecord;

use crate::session::PageSession;
use crate::ui;

/// Watches `<body>` child-list mutations and re-runs detection per batch.
///
/// Records arriving within the coalescing window of the first one are
/// handled as a single batch. Batches touching only the session's own
/// overlays are ignored.
pub struct MutationWatcher {
    session: Arc<PageSession>,
    coalesce: Duration,
}

impl MutationWatcher {
    pub fn new(session: Arc<PageSession>, coalesce: Duration) -> Self {
        Self { session, coalesce }
    }

    /// Subscribe now and process records on a background task until the
    /// session shuts down.
    pub fn spawn(self) -> JoinHandle<()> {
        let records = self.session.document().lock().observe_mutations();
        let shutdown = self.session.shutdown_token();
        tokio::spawn(self.run(records, shutdown))
    }

    async fn run(
        self,
        mut records: mpsc::UnboundedReceiver<MutationRecord>,
        shutdown: CancellationToken,
    ) {
        info!(coalesce_ms = self.coalesce.as_millis() as u64, "Mutation watcher started");

        'watch: loop {
            let first = tokio::select! {
                _ = shutdown.cancelled() => break,
                record = records.recv() => match record {
                    Some(record) => record,
                    None => break,
                },
            };

            let mut batch = vec![first];
            if !self.coalesce.is_zero() {
                let window = tokio::time::sleep(self.coalesce);
                tokio::pin!(window);
                loop {
                    tokio::select! {
                        _ = shutdown.cancelled() => break 'watch,
                        _ = &mut window => break,
                        record = records.recv() => match record {
                            Some(record) => batch.push(record),
                            None => break,
                        },
                    }
                }
            }
            while let Ok(record) = records.try_recv() {
                batch.push(record);
            }

            if self.only_overlays(&batch) {
                trace!(records = batch.len(), "Ignoring overlay mutations");
                continue;
            }

            let summary = self.session.scan();
            debug!(
                records = batch.len(),
                login = summary.login_sets,
                payment = summary.payment_sets,
                "Re-scanned after page mutation"
            );
        }

        info!("Mutation watcher stopped");
    }

    fn only_overlays(&self, batch: &[MutationRecord]) -> bool {
        let document = self.session.document();
        let doc = document.lock();
        batch.iter().all(|record| {
            ui::is_own_ui(&doc, record.target) || record.nodes().all(|n| ui::is_own_ui(&doc, n))
        })
    }
}
