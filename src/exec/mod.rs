// src/exec/mod.rs

//! Chain execution layer.
//!
//! - [`executor_loop`] owns the background loop that runs scheduled chains
//!   and reports `ChainCompleted` back to the runtime.
//! - [`backend`] provides the `ExecutorBackend` trait and the
//!   `RealExecutorBackend` used in production; tests swap in a fake.
//! - [`command`] runs external optimizer binaries with `tokio::process`.

pub mod backend;
pub mod command;
pub mod executor_loop;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use executor_loop::spawn_executor;
