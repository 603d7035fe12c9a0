// src/plan.rs

//! Invocation plan: which chains a CLI task runs, which categories are
//! watched, and whether the process serves and stays alive.

use std::fmt;

use crate::cli::TaskSelector;
use crate::engine::{ChainPlan, RuntimeOptions};
use crate::tasks::{ChainKind, TaskChain};
use crate::types::{BuildMode, Category};

/// Categories bound to watchers by the default development invocation.
const DEFAULT_WATCHED: [Category; 3] = [Category::Styles, Category::Scripts, Category::Templates];

#[derive(Debug, Clone)]
pub struct InvocationPlan {
    pub chains: ChainPlan,
    /// Categories whose sources are watched.
    pub watched: Vec<Category>,
    /// Categories triggered once at startup.
    pub initial: Vec<Category>,
    pub serve: bool,
    pub options: RuntimeOptions,
}

impl InvocationPlan {
    pub fn for_task(task: TaskSelector, mode: BuildMode) -> Self {
        match (task.category(), task.is_watch()) {
            (None, _) if mode.is_development() => Self::default_development(),
            (None, _) => Self::one_shot(&Category::ALL),
            (Some(category), false) => Self::one_shot(&[category]),
            (Some(category), true) => Self::watch(category),
        }
    }

    /// Serve, watch styles/scripts/templates, copy images and fonts once.
    fn default_development() -> Self {
        let mut chains = ChainPlan::new();
        for category in Category::ALL {
            let kind = if DEFAULT_WATCHED.contains(&category) {
                ChainKind::Watch
            } else {
                ChainKind::OneShot
            };
            chains.insert(TaskChain::for_category(category, kind));
        }

        Self {
            chains,
            watched: DEFAULT_WATCHED.to_vec(),
            initial: Category::ALL.to_vec(),
            serve: true,
            options: RuntimeOptions {
                exit_when_idle: false,
            },
        }
    }

    fn one_shot(categories: &[Category]) -> Self {
        let mut chains = ChainPlan::new();
        for &category in categories {
            chains.insert(TaskChain::for_category(category, ChainKind::OneShot));
        }

        Self {
            chains,
            watched: Vec::new(),
            initial: categories.to_vec(),
            serve: false,
            options: RuntimeOptions {
                exit_when_idle: true,
            },
        }
    }

    fn watch(category: Category) -> Self {
        Self {
            chains: ChainPlan::new().with_chain(TaskChain::for_category(category, ChainKind::Watch)),
            watched: vec![category],
            initial: vec![category],
            serve: false,
            options: RuntimeOptions {
                exit_when_idle: false,
            },
        }
    }

    pub fn is_one_shot(&self) -> bool {
        self.options.exit_when_idle
    }
}

impl fmt::Display for InvocationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "chains ({}):", self.chains.categories().count())?;
        for chain in self.chains.chains() {
            let steps: Vec<_> = chain.steps.iter().map(|s| s.name()).collect();
            let watched = if self.watched.contains(&chain.category) {
                " (watched)"
            } else {
                ""
            };
            writeln!(f, "  - {}{watched}: {}", chain.category, steps.join(" -> "))?;
        }
        writeln!(f, "serve: {}", self.serve)?;
        write!(f, "exit when idle: {}", self.options.exit_when_idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::Step;

    #[test]
    fn default_development_serves_and_watches_three_categories() {
        let plan = InvocationPlan::for_task(TaskSelector::Default, BuildMode::Development);
        assert!(plan.serve);
        assert!(!plan.is_one_shot());
        assert_eq!(plan.watched, DEFAULT_WATCHED.to_vec());
        assert_eq!(plan.initial.len(), 5);

        let styles = plan.chains.get(Category::Styles).unwrap();
        assert_eq!(styles.steps, vec![Step::LintStyles, Step::CompileStyles]);
        let images = plan.chains.get(Category::Images).unwrap();
        assert_eq!(images.steps, vec![Step::OptimizeImages]);
    }

    #[test]
    fn default_production_builds_everything_once() {
        let plan = InvocationPlan::for_task(TaskSelector::Default, BuildMode::Production);
        assert!(!plan.serve);
        assert!(plan.is_one_shot());
        assert!(plan.watched.is_empty());
        assert_eq!(plan.chains.categories().count(), 5);
        assert!(plan
            .chains
            .chains()
            .all(|c| c.steps.iter().all(|s| !s.is_validation())));
    }

    #[test]
    fn named_tasks_select_one_category() {
        let plan = InvocationPlan::for_task(TaskSelector::BuildJs, BuildMode::Development);
        assert!(plan.is_one_shot());
        assert_eq!(plan.initial, vec![Category::Scripts]);

        let plan = InvocationPlan::for_task(TaskSelector::WatchStyleFiles, BuildMode::Production);
        assert!(!plan.is_one_shot());
        assert!(!plan.serve);
        assert_eq!(plan.watched, vec![Category::Styles]);
        assert_eq!(
            plan.chains.get(Category::Styles).unwrap().steps,
            vec![Step::LintStyles, Step::CompileStyles]
        );
    }
}
