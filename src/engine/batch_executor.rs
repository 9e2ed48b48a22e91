//! Batch execution under the three disciplines

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, instrument};

use crate::engine::cancellation::{cancelled, RunState};
use crate::engine::ExecutionError;
use crate::queue::{Batch, Discipline, QueueConfig, WorkItem};
use crate::runner::UnitOutcome;

/// Settled result of one item, produced after its handle is closed.
type ItemFuture = BoxFuture<'static, Result<(), ExecutionError>>;

/// Drives the batches of one queue run.
pub(crate) struct BatchExecutor {
    queue: String,
    config: QueueConfig,
    state: Arc<RunState>,
}

impl BatchExecutor {
    pub(crate) fn new(queue: String, config: QueueConfig, state: Arc<RunState>) -> Self {
        Self {
            queue,
            config,
            state,
        }
    }

    /// Execute one batch to settlement under its discipline.
    #[instrument(skip(self, batch), fields(queue = %self.queue, batch = index, discipline = %batch.discipline()))]
    pub(crate) async fn execute(&self, index: usize, batch: &Batch) -> Result<(), ExecutionError> {
        // the table tracks only the active batch; the previous batch's
        // handles are all terminal by the time it settled
        self.state.reset_handles();
        debug!(items = batch.len(), "batch started");
        match batch.discipline() {
            Discipline::Sequential => self.run_sequential(batch).await,
            Discipline::Concurrent => self.run_concurrent(batch, false).await,
            Discipline::ConcurrentCancelOnFailure => self.run_concurrent(batch, true).await,
        }
    }

    /// Items one at a time, in order; the first failure stops the batch and
    /// later items never start.
    async fn run_sequential(&self, batch: &Batch) -> Result<(), ExecutionError> {
        for item in batch.items() {
            if self.state.is_cancelled() {
                return Err(ExecutionError::Cancelled);
            }
            let unit = self.start_item(item, batch.discipline()).await?;
            tokio::select! {
                result = unit => result?,
                _ = cancelled(self.state.subscribe()) => return Err(ExecutionError::Cancelled),
            }
        }
        Ok(())
    }

    /// All items start in append order and run to completion independently.
    ///
    /// The first failure settles the batch. With `cancel_siblings` the
    /// still-running items are terminated before settling; without it they
    /// are left running and their outcomes are ignored.
    async fn run_concurrent(
        &self,
        batch: &Batch,
        cancel_siblings: bool,
    ) -> Result<(), ExecutionError> {
        let mut in_flight = FuturesUnordered::new();
        for item in batch.items() {
            if self.state.is_cancelled() {
                return Err(ExecutionError::Cancelled);
            }
            match self.start_item(item, batch.discipline()).await {
                Ok(unit) => in_flight.push(tokio::spawn(unit)),
                Err(error) => {
                    if cancel_siblings {
                        self.terminate_siblings();
                    }
                    return Err(error);
                }
            }
        }

        // dropping `in_flight` on an early return detaches the spawned
        // tasks; their supervisors keep the handle table current
        let cancel_wait = cancelled(self.state.subscribe());
        tokio::pin!(cancel_wait);
        loop {
            tokio::select! {
                _ = &mut cancel_wait => return Err(ExecutionError::Cancelled),
                joined = in_flight.next() => match joined {
                    None => return Ok(()),
                    Some(Ok(Ok(()))) => {}
                    Some(Ok(Err(error))) => {
                        if cancel_siblings {
                            self.terminate_siblings();
                        }
                        return Err(error);
                    }
                    Some(Err(join_error)) => {
                        if cancel_siblings {
                            self.terminate_siblings();
                        }
                        return Err(ExecutionError::Join(join_error));
                    }
                },
            }
        }
    }

    fn terminate_siblings(&self) {
        self.state
            .terminate_outstanding(self.config.termination_signal());
    }

    /// Start one item and return the future that settles it.
    ///
    /// The unit is spawned and registered before this returns, so items
    /// observably start in append order and cancellation can always reach
    /// them.
    async fn start_item(
        &self,
        item: &WorkItem,
        discipline: Discipline,
    ) -> Result<ItemFuture, ExecutionError> {
        match item {
            WorkItem::Command(spec) => {
                let unit = self
                    .config
                    .runner()
                    .spawn(spec, discipline, self.config.shell())
                    .await?;
                let (terminate, completion) = unit.into_parts();
                let id = self.state.handles().register_unit(terminate);
                debug!(unit = %id, command = %spec.line(), "unit started");
                if self.state.is_cancelled() {
                    // cancellation may have walked the table before this
                    // registration; re-walk so the handle is not lost
                    self.terminate_siblings();
                }
                let state = self.state.clone();
                let command = spec.line().to_owned();
                Ok(async move {
                    let outcome = completion
                        .await
                        .unwrap_or(UnitOutcome::Failed { code: None });
                    state.handles().close(id);
                    debug!(unit = %id, outcome = ?outcome, "unit settled");
                    match outcome {
                        UnitOutcome::Success => Ok(()),
                        UnitOutcome::Failed { code } => {
                            Err(ExecutionError::UnitFailed { command, code })
                        }
                        UnitOutcome::Terminated => Err(ExecutionError::UnitTerminated { command }),
                    }
                }
                .boxed())
            }
            WorkItem::SubQueue(queue) => {
                let queue = queue.clone();
                let id = self.state.handles().register_sub_queue(queue.run_state());
                debug!(unit = %id, nested = %queue.name(), "nested queue started");
                if self.state.is_cancelled() {
                    self.terminate_siblings();
                }
                let state = self.state.clone();
                Ok(async move {
                    let result = queue.run().await;
                    state.handles().close(id);
                    result.map_err(|error| ExecutionError::SubQueue {
                        name: queue.name().to_owned(),
                        source: Box::new(error),
                    })
                }
                .boxed())
            }
        }
    }
}
