// src/notify.rs

//! Error Notifier: user-facing reports of chain failures and completions.
//!
//! Chains never propagate transform errors; they turn them into
//! [`Notification`]s, hand them to a [`Notifier`] and carry on.

use std::fmt;

use chrono::{DateTime, Local};
use console::style;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Error,
    Success,
}

/// One user-facing message.
#[derive(Debug, Clone)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Local>,
}

impl Notification {
    /// A failure inside `transform` (e.g. `"sass"`, `"swc"`).
    pub fn error(transform: &str, message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            title: format!("Compiling error with \"{transform}\""),
            message: message.into(),
            timestamp: Local::now(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: "assetflow".to_string(),
            message: message.into(),
            timestamp: Local::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NotificationKind::Error
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.timestamp.format("%H:%M:%S"),
            self.title,
            self.message
        )
    }
}

/// Sink for notifications. Implementations must never fail or panic.
pub trait Notifier: Send + Sync + fmt::Debug {
    fn notify(&self, notification: &Notification);
}

/// Default notifier: a styled block on stderr plus a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, n: &Notification) {
        match n.kind {
            NotificationKind::Error => {
                error!(title = %n.title, "{}", n.message);
                eprintln!(
                    "\n{} {}\n{}\n",
                    style(n.timestamp.format("%H:%M:%S")).dim(),
                    style(&n.title).red().bold(),
                    n.message.trim_end()
                );
            }
            NotificationKind::Success => {
                info!("{}", n.message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_title_names_the_transform() {
        let n = Notification::error("sass", "expected \";\"");
        assert_eq!(n.title, "Compiling error with \"sass\"");
        assert!(n.is_error());
        assert!(n.to_string().contains("expected \";\""));
    }

    #[test]
    fn console_notifier_does_not_panic() {
        ConsoleNotifier.notify(&Notification::error("minijinja", "boom"));
        ConsoleNotifier.notify(&Notification::success("KIT Files Compiled!"));
    }
}
