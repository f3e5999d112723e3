//! Tracing initialization (fmt subscriber + env filter).
//!
//! Log verbosity is controlled with the standard `RUST_LOG` environment variable,
//! defaulting to `info` when unset:
//!
//! ```bash
//! RUST_LOG=storefront=debug,tower_http=debug ./storefront
//! ```

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber with console output.
///
/// Safe to call once at startup; returns an error if a global subscriber is
/// already installed.
pub fn init_telemetry() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}
