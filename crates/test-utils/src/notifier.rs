use std::sync::{Arc, Mutex};

use assetflow::notify::{Notification, Notifier};

/// Notifier that keeps every notification for later assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    seen: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<Notification> {
        self.all().into_iter().filter(|n| n.is_error()).collect()
    }

    pub fn successes(&self) -> Vec<String> {
        self.all()
            .into_iter()
            .filter(|n| !n.is_error())
            .map(|n| n.message)
            .collect()
    }

    pub fn clear(&self) {
        self.seen.lock().unwrap().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        self.seen.lock().unwrap().push(notification.clone());
    }
}
