// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for reading
//! events from channels and sending `ScheduledChain`s to the executor.
//!
//! The core is unit tested without any Tokio, channels or filesystem.

use crate::engine::event_handlers::{handle_chain_completion, handle_chain_trigger, CoreStep};
use crate::engine::queue::TriggerQueue;
use crate::engine::scheduler::Scheduler;
use crate::engine::{RunSummary, RuntimeEvent, RuntimeOptions};
use crate::types::TriggerWhileRunningBehaviour;

/// Pure core runtime state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    queue: TriggerQueue,
    options: RuntimeOptions,
    summary: RunSummary,
}

impl CoreRuntime {
    pub fn new(
        scheduler: Scheduler,
        behaviour: TriggerWhileRunningBehaviour,
        queue_length: usize,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            scheduler,
            queue: TriggerQueue::new(behaviour, queue_length),
            options,
            summary: RunSummary::default(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::ChainTriggered { category, reason } => {
                handle_chain_trigger(&mut self.scheduler, &mut self.queue, category, reason)
            }
            RuntimeEvent::ChainCompleted {
                category,
                run_id,
                outcome,
            } => handle_chain_completion(
                &mut self.scheduler,
                &mut self.queue,
                &self.options,
                &mut self.summary,
                category,
                run_id,
                outcome,
            ),
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ChainOutcome, ChainPlan, CoreCommand, ScheduledChain, TriggerReason};
    use crate::tasks::{ChainKind, TaskChain};
    use crate::types::Category;

    fn core(behaviour: TriggerWhileRunningBehaviour, exit_when_idle: bool) -> CoreRuntime {
        let plan = ChainPlan::new()
            .with_chain(TaskChain::for_category(Category::Styles, ChainKind::Watch))
            .with_chain(TaskChain::for_category(Category::Scripts, ChainKind::Watch));
        CoreRuntime::new(
            Scheduler::new(plan),
            behaviour,
            1,
            RuntimeOptions { exit_when_idle },
        )
    }

    fn trigger(category: Category) -> RuntimeEvent {
        RuntimeEvent::ChainTriggered {
            category,
            reason: TriggerReason::FileWatch,
        }
    }

    fn dispatched(step: &CoreStep) -> Vec<ScheduledChain> {
        step.commands
            .iter()
            .filter_map(|c| match c {
                CoreCommand::DispatchChains(chains) => Some(chains.clone()),
                CoreCommand::RequestExit => None,
            })
            .flatten()
            .collect()
    }

    fn complete(chain: &ScheduledChain, outcome: ChainOutcome) -> RuntimeEvent {
        RuntimeEvent::ChainCompleted {
            category: chain.category,
            run_id: chain.run_id,
            outcome,
        }
    }

    #[test]
    fn trigger_while_running_is_replayed_once() {
        let mut core = core(TriggerWhileRunningBehaviour::Queue, false);

        let first = dispatched(&core.step(trigger(Category::Styles)));
        assert_eq!(first.len(), 1);

        // Three saves during the build coalesce into one queued run.
        for _ in 0..3 {
            assert!(dispatched(&core.step(trigger(Category::Styles))).is_empty());
        }

        let replay = dispatched(&core.step(complete(&first[0], ChainOutcome::Success)));
        assert_eq!(replay.len(), 1);
        assert_eq!(replay[0].category, Category::Styles);

        let after = dispatched(&core.step(complete(&replay[0], ChainOutcome::Success)));
        assert!(after.is_empty());
        assert!(core.is_idle());
        assert!(core.queue_is_empty());
    }

    #[test]
    fn other_categories_run_concurrently() {
        let mut core = core(TriggerWhileRunningBehaviour::Queue, false);
        assert_eq!(dispatched(&core.step(trigger(Category::Styles))).len(), 1);
        assert_eq!(dispatched(&core.step(trigger(Category::Scripts))).len(), 1);
    }

    #[test]
    fn parallel_mode_overlaps_runs() {
        let mut core = core(TriggerWhileRunningBehaviour::Parallel, false);
        assert_eq!(dispatched(&core.step(trigger(Category::Styles))).len(), 1);
        assert_eq!(dispatched(&core.step(trigger(Category::Styles))).len(), 1);
        assert_eq!(core.scheduler().running_count(Category::Styles), 2);
    }

    #[test]
    fn failures_never_stop_a_watching_core() {
        let mut core = core(TriggerWhileRunningBehaviour::Queue, false);
        let run = dispatched(&core.step(trigger(Category::Styles)));
        let step = core.step(complete(&run[0], ChainOutcome::Failed(1)));
        assert!(step.keep_running);
        assert_eq!(core.summary().failed, 1);

        // The next change is the retry.
        assert_eq!(dispatched(&core.step(trigger(Category::Styles))).len(), 1);
    }

    #[test]
    fn one_shot_core_exits_when_everything_finished() {
        let mut core = core(TriggerWhileRunningBehaviour::Queue, true);
        let a = dispatched(&core.step(trigger(Category::Styles)));
        let b = dispatched(&core.step(trigger(Category::Scripts)));

        assert!(core.step(complete(&a[0], ChainOutcome::Blocked)).keep_running);
        let last = core.step(complete(&b[0], ChainOutcome::Success));
        assert!(!last.keep_running);
        assert!(matches!(last.commands.last(), Some(CoreCommand::RequestExit)));

        let summary = core.summary();
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.blocked, 1);
        assert!(!summary.all_succeeded());
    }

    #[test]
    fn shutdown_stops_the_loop() {
        let mut core = core(TriggerWhileRunningBehaviour::Queue, false);
        assert!(!core.step(RuntimeEvent::ShutdownRequested).keep_running);
    }
}
