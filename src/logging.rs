// src/logging.rs

//! Logging setup for `assetflow` using `tracing` + `tracing-subscriber`.
//!
//! The filter comes from, in order:
//! 1. the `--log-level` flag, applied to `assetflow` itself
//! 2. `ASSETFLOW_LOG`, any `EnvFilter` directive list
//!    (e.g. `"debug"` or `"assetflow=debug,axum=warn"`)
//! 3. `info`
//!
//! Logs go to STDERR; lint reports and the dry-run plan use STDOUT.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "ASSETFLOW_LOG";

/// Directives the server and transform crates log at when only our own
/// level is raised.
const QUIET_DEPENDENCIES: &str = "hyper=warn,axum=warn,notify=warn";

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = build_filter(cli_level, std::env::var(LOG_ENV).ok().as_deref())?;

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing log subscriber: {e}"))
}

fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> Result<EnvFilter> {
    if let Some(level) = cli_level {
        let level = level.as_directive();
        return Ok(EnvFilter::new(format!(
            "{level},assetflow={level},{QUIET_DEPENDENCIES}"
        )));
    }

    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)
            .map_err(|e| anyhow!("invalid {LOG_ENV} value '{directives}': {e}")),
        None => Ok(EnvFilter::new(format!("info,{QUIET_DEPENDENCIES}"))),
    }
}

impl LogLevel {
    fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_level_wins_over_env() {
        let filter = build_filter(Some(LogLevel::Debug), Some("error")).unwrap();
        assert!(filter.to_string().contains("assetflow=debug"), "{filter}");
    }

    #[test]
    fn env_accepts_directive_lists() {
        let filter = build_filter(None, Some("assetflow=trace,axum=off")).unwrap();
        let text = filter.to_string();
        assert!(text.contains("assetflow=trace"), "{text}");
        assert!(text.contains("axum=off"), "{text}");
    }

    #[test]
    fn bad_env_value_is_an_error() {
        assert!(build_filter(None, Some("assetflow=loud")).is_err());
    }

    #[test]
    fn blank_env_means_info() {
        let filter = build_filter(None, Some("  ")).unwrap();
        assert!(filter.to_string().contains("info"), "{filter}");
    }
}
