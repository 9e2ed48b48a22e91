//! Work items: the schedulable units a batch is made of

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::queue::TaskQueue;

/// Descriptor for one shell command.
///
/// The command line is handed to the configured shell verbatim; the queue
/// never parses it. Working directory and environment overrides apply only
/// to the spawned process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    line: String,
    cwd: Option<PathBuf>,
    env: Vec<(String, String)>,
}

impl CommandSpec {
    /// Create a descriptor for the given command line.
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            cwd: None,
            env: Vec::new(),
        }
    }

    /// Set the working directory for the spawned process.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Add an environment variable for the spawned process.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// The command line as given.
    pub fn line(&self) -> &str {
        &self.line
    }

    /// The working directory override, if any.
    pub fn working_dir(&self) -> Option<&PathBuf> {
        self.cwd.as_ref()
    }

    /// Environment overrides in insertion order.
    pub fn env_vars(&self) -> &[(String, String)] {
        &self.env
    }
}

/// One schedulable unit inside a batch.
///
/// Either a shell command handed to the unit runner, or a nested
/// [`TaskQueue`] whose own `run()` stands in for the unit's execution.
#[derive(Clone)]
pub enum WorkItem {
    /// A shell command executed by the queue's unit runner.
    Command(CommandSpec),
    /// A nested queue treated as a single unit; it must never contain the
    /// queue it is embedded in, directly or transitively.
    SubQueue(TaskQueue),
}

impl std::fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkItem::Command(spec) => f.debug_tuple("Command").field(&spec.line()).finish(),
            WorkItem::SubQueue(queue) => f.debug_tuple("SubQueue").field(&queue.name()).finish(),
        }
    }
}

impl From<CommandSpec> for WorkItem {
    fn from(spec: CommandSpec) -> Self {
        WorkItem::Command(spec)
    }
}

impl From<&str> for WorkItem {
    fn from(line: &str) -> Self {
        WorkItem::Command(CommandSpec::new(line))
    }
}

impl From<String> for WorkItem {
    fn from(line: String) -> Self {
        WorkItem::Command(CommandSpec::new(line))
    }
}

impl From<TaskQueue> for WorkItem {
    fn from(queue: TaskQueue) -> Self {
        WorkItem::SubQueue(queue)
    }
}
