// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod manifest;
pub mod mode;
pub mod notify;
pub mod paths;
pub mod plan;
pub mod server;
pub mod tasks;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::ConfigFile;
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, Scheduler, TriggerReason};
use crate::exec::RealExecutorBackend;
use crate::mode::BuildSettings;
use crate::notify::ConsoleNotifier;
use crate::paths::PathTable;
use crate::plan::InvocationPlan;
use crate::server::{LiveServer, ReloadHandle};
use crate::tasks::TaskContext;
use crate::watch::build_profiles;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and mode resolution
/// - the invocation plan for the selected task
/// - scheduler / queue / runtime
/// - executor
/// - (optional) live reload server and file watcher
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let mut cfg = load_and_validate(&config_path)?;
    if let Some(port) = args.port {
        cfg.server.port = port;
    }

    let root = project_root_dir(&config_path);
    let settings = BuildSettings::resolve(&args, root, &cfg.paths);
    let plan = InvocationPlan::for_task(args.task, settings.mode);

    if args.dry_run {
        print_dry_run(&settings, &cfg, &plan);
        return Ok(());
    }

    info!(
        task = ?args.task,
        mode = %settings.mode,
        layout = %settings.layout,
        output = %settings.output_dir,
        "starting assetflow"
    );

    let reload = ReloadHandle::new();
    let ctx = Arc::new(
        TaskContext::new(settings, cfg, Arc::new(ConsoleNotifier)).with_reload(reload.clone()),
    );

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let server = if plan.serve {
        Some(LiveServer::start(&ctx.config.server, ctx.settings.output_root(), reload).await?)
    } else {
        None
    };

    let _watcher_handle = if plan.watched.is_empty() {
        None
    } else {
        let profiles = build_profiles(&ctx.paths, &plan.watched)?;
        Some(crate::watch::spawn_watcher(
            ctx.settings.project_root.clone(),
            profiles,
            rt_tx.clone(),
        )?)
    };

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    // All initial triggers must be queued before the runtime loop starts.
    info!(categories = ?plan.initial, "initial runs");
    for &category in &plan.initial {
        rt_tx
            .send(RuntimeEvent::ChainTriggered {
                category,
                reason: TriggerReason::Initial,
            })
            .await?;
    }

    let core = CoreRuntime::new(
        Scheduler::new(plan.chains.clone()),
        ctx.config.config.triggered_while_running_behaviour,
        ctx.config.config.queue_length,
        plan.options,
    );
    let executor = RealExecutorBackend::new(rt_tx, Arc::clone(&ctx));
    let summary = Runtime::new(core, rt_rx, executor).run().await?;

    if let Some(server) = server {
        server.shutdown().await;
    }

    if plan.is_one_shot() && !summary.all_succeeded() {
        bail!(
            "build finished with {} failed and {} blocked chain(s)",
            summary.failed,
            summary.blocked
        );
    }
    Ok(())
}

/// Project root: directory containing the config file, or `.`.
fn project_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Print resolved settings, the path table and the chain plan.
fn print_dry_run(settings: &BuildSettings, cfg: &ConfigFile, plan: &InvocationPlan) {
    println!("assetflow dry-run");
    println!("  mode = {}", settings.mode);
    println!("  layout = {}", settings.layout);
    println!("  project_root = {}", settings.project_root.display());
    println!("  output_root = {}", settings.output_root().display());
    println!(
        "  config.triggered_while_running_behaviour = {:?}",
        cfg.config.triggered_while_running_behaviour
    );
    println!("  config.queue_length = {}", cfg.config.queue_length);
    println!();

    let table = PathTable::new(settings, &cfg.paths);
    println!("paths:");
    for entry in table.iter() {
        println!("  - {}", entry.category);
        println!("      include: {:?}", entry.include);
        if !entry.exclude.is_empty() {
            println!("      exclude: {:?}", entry.exclude);
        }
        println!("      dest: {}", entry.dest.display());
    }
    println!();

    println!("scripts: entry = {}, target = {}", cfg.scripts.entry, cfg.scripts.target);
    if !cfg.scripts.after.is_empty() {
        println!("  after: {:?}", cfg.scripts.after);
    }
    println!("templates: entry = {}", cfg.templates.entry);
    if !cfg.templates.after.is_empty() {
        println!("  after: {:?}", cfg.templates.after);
    }
    if plan.serve {
        println!("server: http://{}:{}", cfg.server.host, cfg.server.port);
    }
    println!();

    println!("{plan}");

    debug!("dry-run complete (no execution)");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_root_is_config_parent_or_cwd() {
        assert_eq!(project_root_dir(Path::new("Assetflow.toml")), PathBuf::from("."));
        assert_eq!(
            project_root_dir(Path::new("site/Assetflow.toml")),
            PathBuf::from("site")
        );
    }
}
