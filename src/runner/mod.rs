//! The unit-runner contract
//!
//! The queue never spawns work itself; it asks a [`UnitRunner`] for a
//! [`SpawnedUnit`] and tracks the returned hooks. The default
//! [`ShellRunner`] hands command lines to the configured shell; hosts
//! replace it to run work any other way (containers, remote executors,
//! test doubles).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;

use crate::queue::{CommandSpec, Discipline};

pub mod shell;

pub use shell::{ShellConfig, ShellRunner};

#[cfg(test)]
pub(crate) mod testing;

/// Errors raised while spawning units of work
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The unit could not be started.
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        /// Command line that failed to start.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Signal delivered when a unit's termination is requested.
///
/// Interrupt-style delivery is the default; terminate-style is available
/// for hosts whose processes ignore interrupts. Each unit receives at most
/// one signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TerminationSignal {
    /// Cooperative interrupt (SIGINT on unix).
    #[default]
    Interrupt,
    /// Termination request (SIGTERM on unix).
    Terminate,
}

/// Final status of one unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitOutcome {
    /// The unit exited with status 0.
    Success,
    /// The unit exited with a non-zero status, or abnormally.
    Failed {
        /// Exit code when the OS reported one.
        code: Option<i32>,
    },
    /// The unit was terminated before completing.
    Terminated,
}

impl UnitOutcome {
    /// Whether the unit completed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, UnitOutcome::Success)
    }
}

/// Hooks for one spawned unit of work.
///
/// The termination sender is consumed by the first request; the completion
/// receiver resolves exactly once with the unit's outcome.
#[derive(Debug)]
pub struct SpawnedUnit {
    terminate: oneshot::Sender<TerminationSignal>,
    completion: oneshot::Receiver<UnitOutcome>,
}

impl SpawnedUnit {
    /// Pair a termination sender with a completion receiver.
    pub fn new(
        terminate: oneshot::Sender<TerminationSignal>,
        completion: oneshot::Receiver<UnitOutcome>,
    ) -> Self {
        Self {
            terminate,
            completion,
        }
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        oneshot::Sender<TerminationSignal>,
        oneshot::Receiver<UnitOutcome>,
    ) {
        (self.terminate, self.completion)
    }
}

/// Strategy for running one unit of work.
///
/// Implementations must not block the caller: `spawn` returns the unit's
/// hooks immediately and signals completion asynchronously. A termination
/// request arriving through the hooks is delivered to the unit
/// best-effort; an already-finished unit may ignore it.
#[async_trait]
pub trait UnitRunner: Send + Sync {
    /// Start one command under the given shell and return its hooks.
    async fn spawn(
        &self,
        command: &CommandSpec,
        discipline: Discipline,
        shell: &ShellConfig,
    ) -> Result<SpawnedUnit, RunnerError>;
}
