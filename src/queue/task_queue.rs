//! The task queue: fluent composition and the run/cancel surface

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::engine::batch_executor::BatchExecutor;
use crate::engine::cancellation::RunState;
use crate::engine::ExecutionError;
use crate::queue::{Batch, Discipline, QueueConfig, WorkItem};
use crate::Result;

/// An ordered list of batches executed strictly in submission order.
///
/// A queue is composed with the fluent `add_*` methods, executed once with
/// [`run`](TaskQueue::run), and aborted with [`cancel`](TaskQueue::cancel).
/// Clones share run state: a clone held by another task can cancel the
/// running instance, and a queue embedded in another queue's batch stays
/// reachable for recursive cancellation.
///
/// ```rust,no_run
/// use taskqueue::queue::TaskQueue;
///
/// # async fn example() -> taskqueue::Result<()> {
/// TaskQueue::new("ci")
///     .add_sequential(["make clean", "make"])
///     .add_group(["./dev-server.sh", "./test-watcher.sh"])
///     .run()
///     .await
/// # }
/// ```
#[derive(Clone)]
pub struct TaskQueue {
    name: String,
    config: QueueConfig,
    batches: Vec<Batch>,
    state: Arc<RunState>,
}

impl TaskQueue {
    /// Create an empty queue with the default configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, QueueConfig::new())
    }

    /// Create an empty queue with an explicit configuration.
    pub fn with_config(name: impl Into<String>, config: QueueConfig) -> Self {
        Self {
            name: name.into(),
            config,
            batches: Vec::new(),
            state: RunState::new(),
        }
    }

    /// Append a batch whose items run one at a time, in order.
    ///
    /// The first failing item stops the batch; later items never start.
    pub fn add_sequential<I>(self, items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<WorkItem>,
    {
        self.add_batch(Discipline::Sequential, items)
    }

    /// Append a batch whose items all start immediately and run
    /// independently.
    ///
    /// The first failure settles the batch, but surviving items keep
    /// running and their outcomes are ignored.
    pub fn add_concurrent<I>(self, items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<WorkItem>,
    {
        self.add_batch(Discipline::Concurrent, items)
    }

    /// Append a batch whose items all start immediately and are coupled:
    /// the first failure terminates every still-running sibling.
    ///
    /// Nested queues are accepted here like in the other disciplines;
    /// terminating one cancels it recursively.
    pub fn add_group<I>(self, items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<WorkItem>,
    {
        self.add_batch(Discipline::ConcurrentCancelOnFailure, items)
    }

    fn add_batch<I>(mut self, discipline: Discipline, items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<WorkItem>,
    {
        let items: Vec<WorkItem> = items.into_iter().map(Into::into).collect();
        self.batches.push(Batch::new(discipline, items));
        self
    }

    /// The queue's name, carried in logs and error messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The batches in submission order.
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Number of batches appended so far.
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// Whether the queue has no batches.
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Execute the batches strictly in submission order.
    ///
    /// Settles exactly once: `Ok(())` after every batch succeeded, or the
    /// first batch failure (later batches never start). The
    /// outstanding-handle table is reset on entry. Calling `run` more than
    /// once on the same queue is undefined; retries belong on a fresh
    /// queue.
    #[instrument(skip(self), fields(queue = %self.name))]
    pub async fn run(&self) -> Result<()> {
        self.run_inner().await
    }

    // type-erased so nested queues can recurse through the executor
    fn run_inner(&self) -> BoxFuture<'_, Result<()>> {
        async move {
            let run_id = Uuid::new_v4();
            self.state.reset_handles();
            if self.state.is_cancelled() {
                return Err(ExecutionError::Cancelled.into());
            }
            info!(run_id = %run_id, batches = self.batches.len(), "queue run started");

            let executor =
                BatchExecutor::new(self.name.clone(), self.config.clone(), self.state.clone());
            for (index, batch) in self.batches.iter().enumerate() {
                if let Err(error) = executor.execute(index, batch).await {
                    warn!(run_id = %run_id, batch = index, %error, "queue run failed");
                    return Err(error.into());
                }
            }

            info!(run_id = %run_id, "queue run completed");
            Ok(())
        }
        .boxed()
    }

    /// Request termination of everything still running, recursively through
    /// nested queues.
    ///
    /// Never fails and never blocks; the termination signal is delivered
    /// best-effort and the in-flight [`run`](TaskQueue::run) settles to
    /// failure promptly without waiting for the processes to die.
    /// Idempotent: repeated calls are no-ops beyond the first effective
    /// one. Cancellation is sticky, so a cancelled queue cannot be re-run;
    /// build a fresh queue instead.
    pub fn cancel(&self) {
        debug!(queue = %self.name, "cancellation requested");
        self.state.cancel(self.config.termination_signal());
    }

    /// Diagnostic: whether every process handle in the outstanding table
    /// has left the running state.
    ///
    /// Nested-queue handles are excluded; ask the nested queue directly.
    pub fn all_terminated(&self) -> bool {
        self.state.handles().all_units_terminal()
    }

    pub(crate) fn run_state(&self) -> Arc<RunState> {
        self.state.clone()
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("name", &self.name)
            .field("batches", &self.batches.len())
            .finish()
    }
}
