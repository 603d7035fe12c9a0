// src/watch/mod.rs

//! File watching and source discovery.
//!
//! This module is responsible for:
//! - Compiling include / exclude glob patterns per category.
//! - Collecting the source files of a category.
//! - Wiring up a cross-platform filesystem watcher (`notify`) that turns
//!   changes into category triggers.
//!
//! It does not know how chains are scheduled; that is the engine's job.

pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use patterns::{build_profiles, collect_matching_files, CategoryWatchProfile, SourceFile};
pub use watcher::{spawn_watcher, WatcherHandle};
