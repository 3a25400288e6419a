//! Logging setup
//!
//! Installs the global `tracing` subscriber. `RUST_LOG` takes precedence
//! over the default filter.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

pub const DEFAULT_FILTER: &str = "building_mapper=info";

/// Fails if a global subscriber is already installed.
pub fn init_logging(default_filter: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    Registry::default()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()?;

    Ok(())
}
