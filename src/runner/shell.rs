//! Default shell-backed unit runner

use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::{RunnerError, SpawnedUnit, TerminationSignal, UnitOutcome, UnitRunner};
use crate::queue::{CommandSpec, Discipline};

/// Shell program and invocation flag used for command items.
///
/// Carried by each queue instance; there is no process-global shell
/// selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellConfig {
    program: String,
    flag: String,
}

impl ShellConfig {
    /// Use an explicit shell program and invocation flag.
    pub fn new(program: impl Into<String>, flag: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            flag: flag.into(),
        }
    }

    /// The host platform's shell: `cmd /C` on windows, `/bin/sh -c`
    /// elsewhere.
    pub fn host_default() -> Self {
        if cfg!(windows) {
            Self::new("cmd", "/C")
        } else {
            Self::new("/bin/sh", "-c")
        }
    }

    /// The shell program.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The flag introducing the command line.
    pub fn flag(&self) -> &str {
        &self.flag
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self::host_default()
    }
}

/// Default [`UnitRunner`] spawning commands through the configured shell.
///
/// Every spawned process is overseen by a detached task that waits for it
/// to exit and honors at most one termination request. On a request the
/// configured signal is delivered and the child is reaped afterwards; the
/// exit status collected after signaling is discarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl ShellRunner {
    /// Create the default shell runner.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl UnitRunner for ShellRunner {
    async fn spawn(
        &self,
        command: &CommandSpec,
        _discipline: Discipline,
        shell: &ShellConfig,
    ) -> Result<SpawnedUnit, RunnerError> {
        let mut cmd = Command::new(shell.program());
        cmd.arg(shell.flag()).arg(command.line());
        if let Some(dir) = command.working_dir() {
            cmd.current_dir(dir);
        }
        for (key, value) in command.env_vars() {
            cmd.env(key, value);
        }
        cmd.stdin(Stdio::null());

        let mut child = cmd.spawn().map_err(|source| RunnerError::Spawn {
            command: command.line().to_owned(),
            source,
        })?;
        let pid = child.id();
        debug!(command = %command.line(), pid, "process spawned");

        let (terminate_tx, terminate_rx) = oneshot::channel();
        let (completion_tx, completion_rx) = oneshot::channel();
        let line = command.line().to_owned();

        tokio::spawn(async move {
            let outcome = oversee(&mut child, pid, terminate_rx, &line).await;
            let _ = completion_tx.send(outcome);
        });

        Ok(SpawnedUnit::new(terminate_tx, completion_rx))
    }
}

/// Wait for the child to exit or for a termination request, whichever comes
/// first.
async fn oversee(
    child: &mut Child,
    pid: Option<u32>,
    mut terminate_rx: oneshot::Receiver<TerminationSignal>,
    line: &str,
) -> UnitOutcome {
    tokio::select! {
        status = child.wait() => exit_outcome(status, line),
        request = &mut terminate_rx => match request {
            Ok(signal) => {
                deliver_signal(child, pid, signal, line);
                // reap; the status after signaling is not meaningful
                let _ = child.wait().await;
                UnitOutcome::Terminated
            }
            // sender dropped without a request: keep waiting for exit
            Err(_) => exit_outcome(child.wait().await, line),
        },
    }
}

fn exit_outcome(status: std::io::Result<std::process::ExitStatus>, line: &str) -> UnitOutcome {
    match status {
        Ok(status) if status.success() => UnitOutcome::Success,
        Ok(status) => {
            debug!(command = %line, code = ?status.code(), "process failed");
            UnitOutcome::Failed {
                code: status.code(),
            }
        }
        Err(error) => {
            warn!(command = %line, %error, "failed waiting on process");
            UnitOutcome::Failed { code: None }
        }
    }
}

#[cfg(unix)]
fn deliver_signal(_child: &mut Child, pid: Option<u32>, signal: TerminationSignal, line: &str) {
    // no pid means the child was already reaped
    let Some(pid) = pid else { return };
    let signo = match signal {
        TerminationSignal::Interrupt => libc::SIGINT,
        TerminationSignal::Terminate => libc::SIGTERM,
    };
    debug!(command = %line, pid, ?signal, "delivering termination signal");
    // SAFETY: pid names a child this runner spawned and has not yet reaped
    unsafe {
        libc::kill(pid as libc::pid_t, signo);
    }
}

#[cfg(not(unix))]
fn deliver_signal(child: &mut Child, _pid: Option<u32>, _signal: TerminationSignal, line: &str) {
    debug!(command = %line, "killing process");
    let _ = child.start_kill();
}
