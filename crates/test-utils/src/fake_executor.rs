use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use assetflow::engine::{ChainOutcome, RuntimeEvent, ScheduledChain};
use assetflow::errors::Result;
use assetflow::exec::ExecutorBackend;
use assetflow::types::Category;
use tokio::sync::mpsc;

/// A fake executor that:
/// - records which categories were "run"
/// - immediately reports `ChainCompleted` for each scheduled chain, with
///   `Success` unless an outcome was configured for that category.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<Category>>>,
    outcomes: BTreeMap<Category, ChainOutcome>,
}

impl FakeExecutor {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, executed: Arc<Mutex<Vec<Category>>>) -> Self {
        Self {
            runtime_tx,
            executed,
            outcomes: BTreeMap::new(),
        }
    }

    pub fn with_outcome(mut self, category: Category, outcome: ChainOutcome) -> Self {
        self.outcomes.insert(category, outcome);
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_chains(
        &mut self,
        chains: Vec<ScheduledChain>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let outcomes = self.outcomes.clone();

        Box::pin(async move {
            for chain in chains {
                {
                    let mut guard = executed.lock().unwrap();
                    guard.push(chain.category);
                }

                let outcome = outcomes
                    .get(&chain.category)
                    .copied()
                    .unwrap_or(ChainOutcome::Success);

                tx.send(RuntimeEvent::ChainCompleted {
                    category: chain.category,
                    run_id: chain.run_id,
                    outcome,
                })
                .await
                .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
