// src/engine/mod.rs

//! Orchestration engine for assetflow.
//!
//! This module ties together:
//! - the chain scheduler (which category chains are in flight)
//! - the trigger queue (what happens when a category is triggered while it
//!   is already running)
//! - the main runtime event loop that reacts to:
//!   - initial and file-watch triggers
//!   - chain completion events
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use crate::types::Category;

/// Monotonically increasing id of a dispatched chain run.
pub type RunId = u64;

/// Result of one chain run, reported to the core instead of crashing the
/// process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOutcome {
    /// Every step ran and no file failed.
    Success,
    /// A validation step found errors; the transform did not run.
    Blocked,
    /// The transform ran but this many files (or steps) failed.
    Failed(usize),
}

/// Why a chain was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Initial run at startup (one-shot builds and watch registration).
    Initial,
    /// Triggered due to a filesystem event.
    FileWatch,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// If true, exit the runtime once no chain is running and nothing is
    /// queued (one-shot builds).
    pub exit_when_idle: bool,
}

/// Events flowing into the runtime from watchers, executors, etc.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A category chain should run.
    ChainTriggered {
        category: Category,
        reason: TriggerReason,
    },
    /// A chain run finished with a concrete outcome.
    ChainCompleted {
        category: Category,
        run_id: RunId,
        outcome: ChainOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Tally of finished runs, returned when the runtime stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub blocked: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: ChainOutcome) {
        match outcome {
            ChainOutcome::Success => self.succeeded += 1,
            ChainOutcome::Blocked => self.blocked += 1,
            ChainOutcome::Failed(_) => self.failed += 1,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.blocked == 0 && self.failed == 0
    }
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;
pub mod scheduler;

pub use self::core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::TriggerQueue;
pub use runtime::Runtime;
pub use scheduler::{ChainPlan, ScheduledChain, Scheduler};
pub use crate::types::TriggerWhileRunningBehaviour;
