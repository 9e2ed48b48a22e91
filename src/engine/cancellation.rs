//! Shared run state and the cancellation protocol
//!
//! Each queue owns one [`RunState`]: the cancel latch, the watch channel
//! executors observe, and the table of outstanding handles. Both trigger
//! points (an explicit cancel and the group discipline reacting to a
//! sibling failure) route through [`RunState::terminate_outstanding`],
//! which walks the table once and recurses depth-first into nested queues.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::engine::handle::HandleTable;
use crate::runner::TerminationSignal;

/// Run bookkeeping shared between a queue, its executor, and its clones.
pub(crate) struct RunState {
    cancelled: AtomicBool,
    cancel_tx: watch::Sender<bool>,
    handles: HandleTable,
}

impl RunState {
    pub(crate) fn new() -> Arc<Self> {
        let (cancel_tx, _) = watch::channel(false);
        Arc::new(Self {
            cancelled: AtomicBool::new(false),
            cancel_tx,
            handles: HandleTable::new(),
        })
    }

    /// The outstanding handles for the active batch.
    pub(crate) fn handles(&self) -> &HandleTable {
        &self.handles
    }

    /// Whether cancellation has been requested.
    ///
    /// The latch is sticky for the queue's lifetime; a fresh execution uses
    /// a fresh queue.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Observe the cancel latch; resolves to `true` at most once.
    pub(crate) fn subscribe(&self) -> watch::Receiver<bool> {
        self.cancel_tx.subscribe()
    }

    /// Drop all handles before a new run starts driving batches.
    pub(crate) fn reset_handles(&self) {
        self.handles.clear();
    }

    /// Request cancellation: latch, notify observers, terminate outstanding
    /// work.
    ///
    /// Idempotent; repeated calls find no running handles and change
    /// nothing. Handles registered by a racing executor after the first
    /// call are covered by the executor's own latch check.
    pub(crate) fn cancel(&self, signal: TerminationSignal) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            debug!("cancellation latched");
            // send_replace reaches receivers subscribed later, and works
            // even while none exist yet
            self.cancel_tx.send_replace(true);
        }
        self.terminate_outstanding(signal);
    }

    /// Terminate every outstanding handle, recursing into nested queues.
    ///
    /// Cancelling a nested queue uses the nested queue's own protocol, so
    /// the recursion is depth-first through arbitrarily deep trees.
    pub(crate) fn terminate_outstanding(&self, signal: TerminationSignal) {
        let children = self.handles.terminate_all(signal);
        for child in children {
            child.cancel(signal);
        }
    }
}

/// Resolve once the given receiver observes the latch set.
///
/// Never resolves if the latch is never set; the sender lives as long as
/// the run state, so a closed channel means the queue itself is gone.
pub(crate) async fn cancelled(mut rx: watch::Receiver<bool>) {
    if rx.wait_for(|latched| *latched).await.is_err() {
        std::future::pending::<()>().await;
    }
}
