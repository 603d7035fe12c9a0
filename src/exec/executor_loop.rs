// src/exec/executor_loop.rs

//! Background loop that runs scheduled chains.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{RuntimeEvent, ScheduledChain};
use crate::tasks::{run_chain, TaskContext};

/// Spawn the background executor loop.
///
/// The returned sender is what `RealExecutorBackend` forwards chains to. Each
/// chain runs in its own Tokio task; its steps run strictly in sequence. Once
/// the chain finishes, a `ChainCompleted` event carrying the outcome is sent
/// back to the runtime. Chains are never cancelled.
pub fn spawn_executor(
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    ctx: Arc<TaskContext>,
) -> mpsc::Sender<ScheduledChain> {
    let (tx, mut rx) = mpsc::channel::<ScheduledChain>(32);

    tokio::spawn(async move {
        info!("executor loop started");

        while let Some(scheduled) = rx.recv().await {
            let ctx = Arc::clone(&ctx);
            let rt_tx = runtime_tx.clone();
            tokio::spawn(run_scheduled(scheduled, ctx, rt_tx));
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}

async fn run_scheduled(
    scheduled: ScheduledChain,
    ctx: Arc<TaskContext>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    let ScheduledChain {
        category,
        run_id,
        reason,
        chain,
    } = scheduled;

    info!(%category, run_id, ?reason, steps = ?chain.steps, "starting chain");

    let outcome = run_chain(ctx, &chain).await;

    debug!(%category, run_id, ?outcome, "chain finished; reporting to runtime");

    if let Err(err) = runtime_tx
        .send(RuntimeEvent::ChainCompleted {
            category,
            run_id,
            outcome,
        })
        .await
    {
        // Runtime already stopped (Ctrl-C); nothing waits for this result.
        warn!(%category, run_id, "failed to report chain completion: {err}");
    }
}
