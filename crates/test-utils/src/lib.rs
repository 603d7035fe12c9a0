//! Shared helpers for assetflow's integration tests.

pub mod builders;
pub mod es5;
pub mod fake_executor;
pub mod notifier;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use assetflow::logging::LOG_ENV;
use tracing_subscriber::{fmt, EnvFilter};

static TRACING: Once = Once::new();

/// Transforms compile slowly in debug builds; tests wait this long.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Capture logs per test with the same `ASSETFLOW_LOG` directives the binary
/// accepts (`ASSETFLOW_LOG=assetflow=debug cargo test`). Output shows up for
/// failing tests or with `--nocapture`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Await `f`, panicking after [`TEST_TIMEOUT`].
pub async fn with_timeout<F: Future>(f: F) -> F::Output {
    match tokio::time::timeout(TEST_TIMEOUT, f).await {
        Ok(out) => out,
        Err(_) => panic!("test timed out after {TEST_TIMEOUT:?}"),
    }
}
