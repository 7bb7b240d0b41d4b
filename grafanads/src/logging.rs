//! Logging setup for the provider process.
//!
//! The plugin host that serves [`crate::GrafanaProvider`] calls
//! [`init_logging`] once at startup, before the handshake. Test binaries and
//! embedders that may already own a subscriber call [`try_init_logging`].
//!
//! Logs go to **stderr**; stdout belongs to the plugin handshake. Filtering
//! follows `RUST_LOG` and falls back to `info`:
//!
//! ```bash
//! RUST_LOG=grafanads=debug terraform apply
//! ```

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn stderr_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
}

/// Install the global subscriber.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(stderr_layer())
        .init();
}

/// Like [`init_logging`] but returns false instead of panicking when a
/// subscriber is already installed. Safe to call from every test.
pub fn try_init_logging() -> bool {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(stderr_layer())
        .try_init()
        .is_ok()
}
