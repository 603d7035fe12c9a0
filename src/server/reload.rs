// src/server/reload.rs

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

/// Message pushed to connected browsers.
///
/// Serialized as `{"kind":"reload"}` or
/// `{"kind":"inject","paths":["/assets/css/main.css"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Full page reload.
    Reload,
    /// Swap the listed stylesheets in place.
    Inject { paths: Vec<String> },
}

/// Cloneable sender side of the reload channel.
///
/// Tasks send on it whether or not a server (or any browser) is listening.
#[derive(Debug, Clone)]
pub struct ReloadHandle {
    tx: broadcast::Sender<ReloadMessage>,
}

impl ReloadHandle {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(64);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.tx.subscribe()
    }

    pub fn send(&self, message: ReloadMessage) {
        match self.tx.send(message) {
            Ok(clients) => debug!(clients, "reload message sent"),
            Err(_) => debug!("no reload clients connected"),
        }
    }
}

impl Default for ReloadHandle {
    fn default() -> Self {
        Self::new()
    }
}
