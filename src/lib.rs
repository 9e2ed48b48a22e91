//! # TaskQueue
//!
//! A programmatic task-execution queue for composing and running build
//! pipelines with full control over sequencing, concurrency, and
//! cancellation.
//!
//! ## Overview
//!
//! TaskQueue is an alternative to declarative build-script runners: instead
//! of wiring tasks together in a configuration file, the caller composes
//! batches of shell commands (or nested sub-queues) in code and runs them.
//! Batches execute strictly in submission order; within a batch, items run
//! under one of three disciplines:
//!
//! - **Sequential**: items run one at a time, stopping at the first failure.
//! - **Concurrent**: items run simultaneously; the first failure settles the
//!   batch while the surviving items keep running.
//! - **ConcurrentCancelOnFailure**: items run simultaneously; the first
//!   failure terminates every still-running sibling.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use taskqueue::queue::TaskQueue;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let queue = TaskQueue::new("release")
//!     .add_sequential(["cargo clean", "cargo build --release"])
//!     .add_concurrent(["./docs.sh", "./package.sh"]);
//!
//! queue.run().await?;
//! # Ok(())
//! # }
//! ```
//!
//! A queue can be embedded in another queue's batch, producing a tree of
//! work. Cancelling the outer queue recursively terminates everything still
//! running, including processes owned by nested queues.
//!
//! ## Key Features
//!
//! - **Fluent composition**: append batches with `add_sequential`,
//!   `add_concurrent`, and `add_group`, then `run()` once
//! - **Deterministic failure propagation**: the first failing batch settles
//!   the run; later batches never start
//! - **Recursive cancellation**: `cancel()` terminates every outstanding
//!   process, depth-first through nested queues
//! - **Pluggable execution**: the process-spawning strategy is an injected
//!   [`runner::UnitRunner`], replaceable per queue
//! - **Async execution**: fully async/await compatible with the Tokio runtime
//!
//! ## Modules
//!
//! - [`queue`]: queue composition and the run/cancel surface
//! - [`engine`]: batch execution disciplines and the cancellation protocol
//! - [`runner`]: the unit-runner contract and the default shell runner

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

use thiserror::Error;

/// Result type for TaskQueue operations
pub type Result<T> = std::result::Result<T, TaskQueueError>;

/// Main error type for TaskQueue operations
#[derive(Error, Debug)]
pub enum TaskQueueError {
    /// Execution error while driving a batch
    #[error("Execution error: {0}")]
    Execution(#[from] engine::ExecutionError),

    /// Error from the unit runner while spawning work
    #[error("Runner error: {0}")]
    Runner(#[from] runner::RunnerError),
}

/// Queue composition and the run/cancel surface
pub mod queue;

/// Batch execution engine and cancellation protocol
pub mod engine;

/// Unit-runner contract and default shell runner
pub mod runner;
