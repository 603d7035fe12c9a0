// src/engine/scheduler.rs

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::engine::{RunId, TriggerReason};
use crate::tasks::TaskChain;
use crate::types::Category;

/// The chains this invocation knows how to run, one per category.
///
/// Built once at startup from the task selector and build mode; a trigger for
/// a category that is not in the plan is ignored.
#[derive(Debug, Clone, Default)]
pub struct ChainPlan {
    chains: BTreeMap<Category, TaskChain>,
}

impl ChainPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chain(mut self, chain: TaskChain) -> Self {
        self.insert(chain);
        self
    }

    pub fn insert(&mut self, chain: TaskChain) {
        self.chains.insert(chain.category, chain);
    }

    pub fn get(&self, category: Category) -> Option<&TaskChain> {
        self.chains.get(&category)
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.chains.keys().copied()
    }

    pub fn chains(&self) -> impl Iterator<Item = &TaskChain> {
        self.chains.values()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

/// A chain handed to the executor.
#[derive(Debug, Clone)]
pub struct ScheduledChain {
    pub category: Category,
    pub run_id: RunId,
    pub reason: TriggerReason,
    pub chain: TaskChain,
}

/// Scheduler holds the immutable chain plan plus the set of runs in flight.
///
/// It is responsible for:
/// - handing out run ids
/// - remembering which runs of which category are active
/// - forgetting runs when they complete
#[derive(Debug)]
pub struct Scheduler {
    plan: ChainPlan,
    active: BTreeMap<Category, BTreeSet<RunId>>,
    run_counter: RunId,
}

impl Scheduler {
    pub fn new(plan: ChainPlan) -> Self {
        Self {
            plan,
            active: BTreeMap::new(),
            run_counter: 0,
        }
    }

    /// Returns `true` if no chain of any category is running.
    pub fn is_idle(&self) -> bool {
        self.active.values().all(|runs| runs.is_empty())
    }

    pub fn is_running(&self, category: Category) -> bool {
        self.active.get(&category).is_some_and(|runs| !runs.is_empty())
    }

    pub fn knows(&self, category: Category) -> bool {
        self.plan.get(category).is_some()
    }

    /// Number of runs of `category` currently in flight.
    pub fn running_count(&self, category: Category) -> usize {
        self.active.get(&category).map_or(0, |runs| runs.len())
    }

    /// Start a new run of `category`. Returns `None` for categories that are
    /// not part of the plan.
    pub fn dispatch(&mut self, category: Category, reason: TriggerReason) -> Option<ScheduledChain> {
        let chain = self.plan.get(category)?.clone();

        self.run_counter += 1;
        let run_id = self.run_counter;
        self.active.entry(category).or_default().insert(run_id);

        debug!(%category, run_id, ?reason, "scheduler: dispatching chain");

        Some(ScheduledChain {
            category,
            run_id,
            reason,
            chain,
        })
    }

    /// Mark a run as finished. Returns `false` if the run was not known to be
    /// active.
    pub fn complete(&mut self, category: Category, run_id: RunId) -> bool {
        let removed = self
            .active
            .get_mut(&category)
            .is_some_and(|runs| runs.remove(&run_id));

        if !removed {
            warn!(%category, run_id, "completion for a run that is not active; ignoring");
        }
        removed
    }
}
