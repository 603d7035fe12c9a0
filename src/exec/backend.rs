// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of a raw mpsc sender, so
//! tests can record dispatched chains and emit completions directly while
//! production runs the real task chains.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::engine::{RuntimeEvent, ScheduledChain};
use crate::errors::{Error, Result};
use crate::tasks::TaskContext;

use super::executor_loop::spawn_executor;

/// Trait abstracting how scheduled chains are executed.
pub trait ExecutorBackend: Send {
    /// Dispatch the given chains for execution.
    fn spawn_ready_chains(
        &mut self,
        chains: Vec<ScheduledChain>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Real executor backend used in production.
///
/// Wraps the background loop from [`spawn_executor`] and forwards chains to
/// it over an mpsc channel.
pub struct RealExecutorBackend {
    tx: mpsc::Sender<ScheduledChain>,
}

impl RealExecutorBackend {
    /// Spawns the background executor loop immediately.
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, ctx: Arc<TaskContext>) -> Self {
        let tx = spawn_executor(runtime_tx, ctx);
        Self { tx }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn spawn_ready_chains(
        &mut self,
        chains: Vec<ScheduledChain>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();

        Box::pin(async move {
            for chain in chains {
                tx.send(chain).await.map_err(Error::from)?;
            }
            Ok(())
        })
    }
}
