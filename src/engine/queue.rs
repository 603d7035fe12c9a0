// src/engine/queue.rs

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::types::{Category, TriggerWhileRunningBehaviour};

/// Triggers that arrive while a category's chain is already running.
///
/// Semantics:
/// - In `Queue` mode each category keeps a count of pending runs, capped at
///   `max_runs`. A trigger while the category runs bumps the count; once the
///   run finishes the core takes one pending run and dispatches it.
/// - `max_runs` defaults to 1 ("at most one future run is remembered"), so a
///   burst of saves during a long build turns into exactly one follow-up run.
/// - In `Parallel` mode nothing is ever deferred and the queue stays empty.
#[derive(Debug)]
pub struct TriggerQueue {
    behaviour: TriggerWhileRunningBehaviour,
    max_runs: usize,
    pending: BTreeMap<Category, usize>,
}

impl TriggerQueue {
    /// Create a new queue with the given behaviour and maximum queued runs.
    ///
    /// `max_runs` is clamped to at least 1, as a zero-length queue would drop
    /// every change made during a build.
    pub fn new(behaviour: TriggerWhileRunningBehaviour, max_runs: usize) -> Self {
        Self {
            behaviour,
            max_runs: max_runs.max(1),
            pending: BTreeMap::new(),
        }
    }

    pub fn behaviour(&self) -> TriggerWhileRunningBehaviour {
        self.behaviour
    }

    /// Returns true if no category has a pending run.
    pub fn is_empty(&self) -> bool {
        self.pending.values().all(|n| *n == 0)
    }

    pub fn pending_for(&self, category: Category) -> usize {
        self.pending.get(&category).copied().unwrap_or(0)
    }

    /// Whether a trigger for a category that is currently running should be
    /// deferred rather than dispatched right away.
    pub fn defers_while_running(&self) -> bool {
        matches!(self.behaviour, TriggerWhileRunningBehaviour::Queue)
    }

    /// Record that `category` was triggered while one of its runs is in
    /// flight.
    pub fn record_trigger(&mut self, category: Category) {
        let max_runs = self.max_runs;
        let count = self.pending.entry(category).or_insert(0);

        if *count >= max_runs {
            warn!(
                %category,
                max_runs,
                "queue full; trigger merged into the already queued run"
            );
            return;
        }

        *count += 1;
        debug!(%category, pending = *count, "queued trigger while running");
    }

    /// Take one pending run for `category`, if any.
    pub fn take_pending(&mut self, category: Category) -> bool {
        match self.pending.get_mut(&category) {
            Some(count) if *count > 0 => {
                *count -= 1;
                debug!(%category, remaining = *count, "took queued run");
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_slot_queue_coalesces_bursts() {
        let mut q = TriggerQueue::new(TriggerWhileRunningBehaviour::Queue, 1);
        q.record_trigger(Category::Styles);
        q.record_trigger(Category::Styles);
        q.record_trigger(Category::Styles);
        assert_eq!(q.pending_for(Category::Styles), 1);

        assert!(q.take_pending(Category::Styles));
        assert!(!q.take_pending(Category::Styles));
        assert!(q.is_empty());
    }

    #[test]
    fn categories_are_queued_independently() {
        let mut q = TriggerQueue::new(TriggerWhileRunningBehaviour::Queue, 2);
        q.record_trigger(Category::Styles);
        q.record_trigger(Category::Scripts);
        q.record_trigger(Category::Scripts);
        assert_eq!(q.pending_for(Category::Styles), 1);
        assert_eq!(q.pending_for(Category::Scripts), 2);
        assert_eq!(q.pending_for(Category::Templates), 0);
    }

    #[test]
    fn zero_length_is_clamped() {
        let mut q = TriggerQueue::new(TriggerWhileRunningBehaviour::Queue, 0);
        q.record_trigger(Category::Fonts);
        assert_eq!(q.pending_for(Category::Fonts), 1);
    }

    #[test]
    fn parallel_mode_never_defers() {
        let q = TriggerQueue::new(TriggerWhileRunningBehaviour::Parallel, 1);
        assert!(!q.defers_while_running());
        assert!(q.is_empty());
    }
}
