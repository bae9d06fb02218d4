//! Logging initialization.
//!
//! Wired up by [`GraphQueryEngine::new`](crate::lineage::GraphQueryEngine::new)
//! from [`ObservabilityConfig`], so `RUST_LOG`, the configured log level, and
//! JSON formatting take effect as soon as an engine exists. The subscriber is
//! process-global: the first installer wins, and later calls (another engine,
//! or an embedding application that set up tracing itself) keep the existing
//! one.
//!
//! Metrics are emitted through the `metrics` facade at the call sites that
//! issue searches; installing an exporter is the embedding application's
//! concern.

use crate::config::ObservabilityConfig;
use crate::error::Result;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing output. Respects `RUST_LOG` when set. Safe to call
/// more than once; only the first call installs a subscriber.
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    let result = if config.json_logs {
        subscriber.with(fmt::layer().json()).try_init()
    } else {
        subscriber.with(fmt::layer()).try_init()
    };

    if let Err(e) = result {
        debug!(error = %e, "Tracing subscriber already installed, keeping the existing one");
    }

    Ok(())
}
