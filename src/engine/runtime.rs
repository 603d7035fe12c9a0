// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::engine::scheduler::ScheduledChain;
use crate::errors::Result;
use crate::exec::ExecutorBackend;

use super::core::CoreRuntime;
use super::{CoreCommand, RunSummary, RuntimeEvent};

/// Drives the chain scheduler in response to `RuntimeEvent`s and delegates
/// actual chain execution to an `ExecutorBackend`.
///
/// All runtime semantics live in `CoreRuntime`; this struct only reads
/// events from the channel and dispatches chains to the executor.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Main event loop.
    ///
    /// - Consumes `RuntimeEvent`s from `event_rx`.
    /// - Feeds them into the core runtime.
    /// - Executes commands returned by the core.
    ///
    /// Returns the tally of finished runs once the core stops or the channel
    /// closes.
    pub async fn run(mut self) -> Result<RunSummary> {
        info!("assetflow runtime started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        let summary = self.core.summary();
        info!(
            succeeded = summary.succeeded,
            blocked = summary.blocked,
            failed = summary.failed,
            "runtime exiting"
        );
        Ok(summary)
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchChains(chains) => self.spawn_ready(chains).await?,
            CoreCommand::RequestExit => {
                // keep_running=false already ends the loop.
                debug!("core issued RequestExit command");
            }
        }
        Ok(())
    }

    async fn spawn_ready(&mut self, chains: Vec<ScheduledChain>) -> Result<()> {
        if chains.is_empty() {
            return Ok(());
        }

        let categories: Vec<_> = chains.iter().map(|c| c.category.as_str()).collect();
        let run_ids: Vec<_> = chains.iter().map(|c| c.run_id).collect();
        debug!(?categories, ?run_ids, "spawning chains");

        self.executor.spawn_ready_chains(chains).await
    }
}
