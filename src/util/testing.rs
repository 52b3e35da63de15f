//! Logging for unit and integration tests.

use std::sync::Once;

use tracing_subscriber::{fmt, fmt::format::FmtSpan, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Route `tracing` output through the test harness, once per test binary.
///
/// `RUST_LOG` picks the filter; without it the crate logs at debug level.
pub fn init_test_setup() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("shortlist=debug"));
        let layer = fmt::layer()
            .with_test_writer()
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(filter);
        // Another subscriber may already be installed by the harness
        if let Err(e) = tracing_subscriber::registry().with(layer).try_init() {
            eprintln!("test logging not installed: {}", e);
        }
        tracing::info!("test logging ready");
    });
}
