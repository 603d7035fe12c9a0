// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{debug, info, warn};

use crate::engine::queue::TriggerQueue;
use crate::engine::scheduler::{ScheduledChain, Scheduler};
use crate::engine::{ChainOutcome, RunId, RunSummary, RuntimeOptions, TriggerReason};
use crate::types::Category;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these chains to the executor.
    DispatchChains(Vec<ScheduledChain>),
    /// Request that the process exits (one-shot builds once idle).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Handle a chain trigger.
///
/// - Unknown categories are ignored.
/// - If the category is idle, or the queue runs in parallel mode, the chain
///   is dispatched right away.
/// - Otherwise the trigger is remembered and replayed once the running chain
///   completes. Running chains are never cancelled.
pub fn handle_chain_trigger(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    category: Category,
    reason: TriggerReason,
) -> CoreStep {
    if !scheduler.knows(category) {
        debug!(%category, "trigger for a category outside this invocation; ignoring");
        return CoreStep::continue_with(Vec::new());
    }

    if scheduler.is_running(category) && queue.defers_while_running() {
        queue.record_trigger(category);
        return CoreStep::continue_with(Vec::new());
    }

    let commands = scheduler
        .dispatch(category, reason)
        .map(|chain| vec![CoreCommand::DispatchChains(vec![chain])])
        .unwrap_or_default();

    CoreStep::continue_with(commands)
}

/// Handle a chain completion.
pub fn handle_chain_completion(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    options: &RuntimeOptions,
    summary: &mut RunSummary,
    category: Category,
    run_id: RunId,
    outcome: ChainOutcome,
) -> CoreStep {
    let mut commands = Vec::new();

    if scheduler.complete(category, run_id) {
        summary.record(outcome);
        match outcome {
            ChainOutcome::Success => info!(%category, run_id, "chain finished"),
            ChainOutcome::Blocked => {
                warn!(%category, run_id, "chain blocked by validation errors")
            }
            ChainOutcome::Failed(n) => warn!(%category, run_id, failures = n, "chain failed"),
        }
    }

    // Replay one queued trigger for this category.
    if !scheduler.is_running(category) && queue.take_pending(category) {
        if let Some(chain) = scheduler.dispatch(category, TriggerReason::FileWatch) {
            commands.push(CoreCommand::DispatchChains(vec![chain]));
        }
    }

    let mut keep_running = true;
    if options.exit_when_idle && scheduler.is_idle() && queue.is_empty() {
        keep_running = false;
        commands.push(CoreCommand::RequestExit);
    }

    CoreStep {
        commands,
        keep_running,
    }
}
