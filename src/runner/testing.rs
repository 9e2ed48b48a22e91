//! Test doubles for the unit-runner seam

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::sleep;

use super::{RunnerError, ShellConfig, SpawnedUnit, TerminationSignal, UnitOutcome, UnitRunner};
use crate::queue::{CommandSpec, Discipline};

#[derive(Debug, Clone, Copy)]
enum Directive {
    Ok,
    Fail,
    Hang,
}

/// Runner that interprets command lines as scripted outcomes instead of
/// spawning processes.
///
/// Lines are `ok`, `fail`, or `hang`, optionally suffixed with a delay in
/// milliseconds (`ok:100`). Unknown lines succeed immediately. Every
/// spawned line is recorded so tests can assert which items started.
pub(crate) struct ScriptedRunner {
    started: Arc<Mutex<Vec<String>>>,
}

impl ScriptedRunner {
    pub(crate) fn new() -> Self {
        Self {
            started: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Lines spawned so far, in start order.
    pub(crate) fn started(&self) -> Vec<String> {
        self.started.lock().clone()
    }
}

fn parse(line: &str) -> (Directive, Duration) {
    let (word, delay) = match line.split_once(':') {
        Some((word, ms)) => (word, ms.parse().unwrap_or(0)),
        None => (line, 0),
    };
    let directive = match word {
        "fail" => Directive::Fail,
        "hang" => Directive::Hang,
        _ => Directive::Ok,
    };
    (directive, Duration::from_millis(delay))
}

#[async_trait]
impl UnitRunner for ScriptedRunner {
    async fn spawn(
        &self,
        command: &CommandSpec,
        _discipline: Discipline,
        _shell: &ShellConfig,
    ) -> Result<SpawnedUnit, RunnerError> {
        self.started.lock().push(command.line().to_owned());
        let (directive, delay) = parse(command.line());

        let (terminate_tx, mut terminate_rx) = oneshot::channel();
        let (completion_tx, completion_rx) = oneshot::channel();

        tokio::spawn(async move {
            let natural = async {
                sleep(delay).await;
                match directive {
                    Directive::Ok => UnitOutcome::Success,
                    Directive::Fail => UnitOutcome::Failed { code: Some(1) },
                    Directive::Hang => std::future::pending().await,
                }
            };
            tokio::pin!(natural);
            let outcome = tokio::select! {
                outcome = &mut natural => outcome,
                request = &mut terminate_rx => match request {
                    Ok(_) => UnitOutcome::Terminated,
                    // sender dropped without a request: run to completion
                    Err(_) => natural.await,
                },
            };
            let _ = completion_tx.send(outcome);
        });

        Ok(SpawnedUnit::new(terminate_tx, completion_rx))
    }
}
