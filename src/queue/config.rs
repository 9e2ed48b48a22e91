//! Per-queue execution configuration

use std::sync::Arc;

use crate::runner::{ShellConfig, ShellRunner, TerminationSignal, UnitRunner};

/// Execution configuration carried by each queue instance.
///
/// Shell selection and the termination signal are explicit per-instance
/// state, resolved once at construction from the host platform and
/// overridable with the `with_*` builders. There is no ambient global
/// configuration.
#[derive(Clone)]
pub struct QueueConfig {
    runner: Arc<dyn UnitRunner>,
    shell: ShellConfig,
    signal: TerminationSignal,
}

impl QueueConfig {
    /// Create a configuration with the default shell runner, the host
    /// platform's shell, and interrupt-style termination.
    pub fn new() -> Self {
        Self {
            runner: Arc::new(ShellRunner::new()),
            shell: ShellConfig::host_default(),
            signal: TerminationSignal::default(),
        }
    }

    /// Replace the unit runner used to spawn work.
    pub fn with_runner(mut self, runner: Arc<dyn UnitRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Override the shell program and invocation flag.
    pub fn with_shell(mut self, shell: ShellConfig) -> Self {
        self.shell = shell;
        self
    }

    /// Select the signal delivered when a unit is terminated.
    pub fn with_termination_signal(mut self, signal: TerminationSignal) -> Self {
        self.signal = signal;
        self
    }

    /// The unit runner spawning this queue's work.
    pub fn runner(&self) -> &Arc<dyn UnitRunner> {
        &self.runner
    }

    /// The shell used for command items.
    pub fn shell(&self) -> &ShellConfig {
        &self.shell
    }

    /// The signal delivered on termination.
    pub fn termination_signal(&self) -> TerminationSignal {
        self.signal
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for QueueConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueConfig")
            .field("runner", &"UnitRunner")
            .field("shell", &self.shell)
            .field("signal", &self.signal)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = QueueConfig::new();
        assert_eq!(config.termination_signal(), TerminationSignal::Interrupt);
        assert_eq!(config.shell(), &ShellConfig::host_default());
    }

    #[test]
    fn test_config_overrides() {
        let config = QueueConfig::new()
            .with_shell(ShellConfig::new("/bin/bash", "-c"))
            .with_termination_signal(TerminationSignal::Terminate);

        assert_eq!(config.shell().program(), "/bin/bash");
        assert_eq!(config.termination_signal(), TerminationSignal::Terminate);
    }
}
