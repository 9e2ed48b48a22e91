//! Batch execution engine
//!
//! This module drives one batch at a time under its discipline, tracks a
//! handle for every in-flight unit, and implements the cancellation
//! protocol that terminates outstanding work on demand.

use thiserror::Error;

use crate::runner::RunnerError;
use crate::TaskQueueError;

pub(crate) mod batch_executor;
pub(crate) mod cancellation;
pub(crate) mod handle;

/// Errors raised while executing a batch
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// A command exited with a non-zero status or abnormally.
    #[error("command `{command}` exited with status {}", .code.unwrap_or(-1))]
    UnitFailed {
        /// Command line of the failing unit.
        command: String,
        /// Exit code when the OS reported one.
        code: Option<i32>,
    },

    /// A command was terminated before it completed.
    #[error("command `{command}` was terminated before completion")]
    UnitTerminated {
        /// Command line of the terminated unit.
        command: String,
    },

    /// A nested queue settled to failure.
    #[error("nested queue `{name}` failed: {source}")]
    SubQueue {
        /// Name of the nested queue.
        name: String,
        /// The nested queue's own failure.
        source: Box<TaskQueueError>,
    },

    /// Execution was cancelled.
    #[error("execution cancelled")]
    Cancelled,

    /// A unit supervisor task panicked.
    #[error("unit supervisor panicked: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// The unit runner failed to spawn a unit.
    #[error(transparent)]
    Runner(#[from] RunnerError),
}
