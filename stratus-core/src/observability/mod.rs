//! Observability: tracing subscriber setup and run metrics.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod metrics;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `level` is used, or `debug` when
/// `debug` is set. Call once at startup, before the orchestrator runs.
pub fn init(level: &str, debug: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let level = if debug { "debug" } else { level };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true).with_level(true))
        .try_init()?;

    metrics::register_run_metrics();
    tracing::debug!("Observability initialized (level: {})", level);
    Ok(())
}
