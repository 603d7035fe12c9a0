// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{RuntimeEvent, TriggerReason};
use crate::errors::Result;
use crate::types::Category;
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::CategoryWatchProfile;

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher that observes `root` recursively and sends
/// `RuntimeEvent::ChainTriggered` for every category whose patterns match a
/// created, modified or removed path.
///
/// Events are not debounced or coalesced: every matching event is one
/// trigger.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    profiles: Vec<CategoryWatchProfile>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or_else(|_| root.clone());

    let profiles = Arc::new(profiles);

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    // Tracing may already be torn down here; use stderr.
                    eprintln!("assetflow: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("assetflow: file watch error: {err}");
            }
        },
        Config::default(),
    )
    .map_err(anyhow::Error::from)?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(anyhow::Error::from)?;

    let names: Vec<&str> = profiles.iter().map(|p| p.category().as_str()).collect();
    info!(?root, categories = ?names, "file watcher started");

    let async_root = root.clone();
    let async_profiles = Arc::clone(&profiles);
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if !is_content_event(&event.kind) {
                continue;
            }
            debug!(?event, "received notify event");

            for path in &event.paths {
                for category in matching_categories(&async_root, path, &async_profiles) {
                    debug!(%category, ?path, "watch match -> triggering chain");
                    if let Err(err) = runtime_tx
                        .send(RuntimeEvent::ChainTriggered {
                            category,
                            reason: TriggerReason::FileWatch,
                        })
                        .await
                    {
                        // Runtime is gone; nothing left to notify.
                        warn!("failed to send RuntimeEvent::ChainTriggered: {err}");
                        return;
                    }
                }
            }
        }

        debug!("file watcher loop ended");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// Create / modify / remove ("all" events). Pure access events are ignored
/// so reading sources during a build never re-triggers it.
fn is_content_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Any | EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// Categories whose profile matches `path`.
pub(crate) fn matching_categories(
    root: &Path,
    path: &Path,
    profiles: &[CategoryWatchProfile],
) -> Vec<Category> {
    let Some(rel) = relative_str(root, path) else {
        warn!(?path, ?root, "could not relativize event path");
        return Vec::new();
    };

    profiles
        .iter()
        .filter(|p| p.matches(&rel))
        .map(|p| p.category())
        .collect()
}

#[cfg(test)]
mod tests {
    use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind};

    use super::*;
    use crate::config::PathsSection;
    use crate::mode::BuildSettings;
    use crate::paths::PathTable;
    use crate::types::{BuildMode, Layout};
    use crate::watch::patterns::build_profiles;

    #[test]
    fn only_content_events_trigger() {
        assert!(is_content_event(&EventKind::Create(CreateKind::File)));
        assert!(is_content_event(&EventKind::Modify(ModifyKind::Any)));
        assert!(is_content_event(&EventKind::Remove(RemoveKind::File)));
        assert!(!is_content_event(&EventKind::Access(AccessKind::Any)));
    }

    #[test]
    fn event_paths_map_to_categories() {
        let paths = PathsSection::default();
        let settings = BuildSettings::new(BuildMode::Development, Layout::Ltr, "/p", &paths);
        let table = PathTable::new(&settings, &paths);
        let profiles =
            build_profiles(&table, &[Category::Styles, Category::Scripts]).unwrap();

        let root = PathBuf::from("/p");
        assert_eq!(
            matching_categories(&root, Path::new("/p/src/scss/a.scss"), &profiles),
            vec![Category::Styles]
        );
        assert!(matching_categories(&root, Path::new("/p/publicDev/assets/css/a.css"), &profiles)
            .is_empty());
    }
}
