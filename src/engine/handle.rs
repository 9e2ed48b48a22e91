//! Running handles for in-flight work
//!
//! Every unit a batch starts is tracked by a [`RunningHandle`] in the
//! queue's [`HandleTable`]. A handle moves `Running` to either `Closed`
//! (completion signal received) or `Terminated` (termination issued before
//! completion); both terminal states are absorbing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

use crate::engine::cancellation::RunState;
use crate::runner::TerminationSignal;

/// Unique identifier for an in-flight unit within one queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct HandleId(u64);

impl std::fmt::Display for HandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of one in-flight unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HandleState {
    /// The unit is executing.
    Running,
    /// The completion signal arrived before any termination request.
    Closed,
    /// Termination was issued before completion.
    Terminated,
}

enum HandleKind {
    /// A process unit; the sender is consumed by the first termination
    /// request, so re-signaling is structurally impossible.
    Unit {
        terminate: Option<oneshot::Sender<TerminationSignal>>,
    },
    /// A nested queue; termination recurses through its run state.
    SubQueue { child: Arc<RunState> },
}

/// One in-flight unit and its termination hook.
pub(crate) struct RunningHandle {
    state: HandleState,
    kind: HandleKind,
}

/// Outstanding handles for the currently active batch.
///
/// Mutated only by the executor driving the batch and by the cancellation
/// path; the mutex keeps those two writers coordinated.
pub(crate) struct HandleTable {
    next_id: AtomicU64,
    handles: Mutex<HashMap<HandleId, RunningHandle>>,
}

impl HandleTable {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            handles: Mutex::new(HashMap::new()),
        }
    }

    fn insert(&self, kind: HandleKind) -> HandleId {
        let id = HandleId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.handles.lock().insert(
            id,
            RunningHandle {
                state: HandleState::Running,
                kind,
            },
        );
        id
    }

    /// Track a process unit; the sender delivers its termination request.
    pub(crate) fn register_unit(
        &self,
        terminate: oneshot::Sender<TerminationSignal>,
    ) -> HandleId {
        self.insert(HandleKind::Unit {
            terminate: Some(terminate),
        })
    }

    /// Track a nested queue through its run state.
    pub(crate) fn register_sub_queue(&self, child: Arc<RunState>) -> HandleId {
        self.insert(HandleKind::SubQueue { child })
    }

    /// Record natural completion.
    ///
    /// Terminal states are absorbing: a handle already terminated stays
    /// terminated, and a handle already dropped by a table reset is left
    /// alone.
    pub(crate) fn close(&self, id: HandleId) {
        if let Some(handle) = self.handles.lock().get_mut(&id) {
            if handle.state == HandleState::Running {
                handle.state = HandleState::Closed;
            }
        }
    }

    /// Issue a termination request to every handle still running.
    ///
    /// Process units receive the signal at most once; nested queues are
    /// returned so the caller can recurse without holding the lock.
    pub(crate) fn terminate_all(&self, signal: TerminationSignal) -> Vec<Arc<RunState>> {
        let mut children = Vec::new();
        let mut handles = self.handles.lock();
        for (id, handle) in handles.iter_mut() {
            if handle.state != HandleState::Running {
                continue;
            }
            handle.state = HandleState::Terminated;
            match &mut handle.kind {
                HandleKind::Unit { terminate } => {
                    if let Some(sender) = terminate.take() {
                        // the receiver may be gone if the unit just finished
                        let _ = sender.send(signal);
                    }
                    debug!(unit = %id, "termination requested");
                }
                HandleKind::SubQueue { child } => {
                    children.push(child.clone());
                }
            }
        }
        children
    }

    /// Whether every process unit still tracked has left the running state.
    ///
    /// Nested-queue handles are excluded; their own tables answer for them.
    pub(crate) fn all_units_terminal(&self) -> bool {
        self.handles
            .lock()
            .values()
            .filter(|handle| matches!(handle.kind, HandleKind::Unit { .. }))
            .all(|handle| handle.state != HandleState::Running)
    }

    /// Drop every tracked handle.
    pub(crate) fn clear(&self) {
        self.handles.lock().clear();
    }

    #[cfg(test)]
    pub(crate) fn outstanding(&self) -> usize {
        self.handles.lock().len()
    }
}
