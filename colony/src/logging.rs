//! Development-time tracing for debugging the colony.
//!
//! # Separation of Concerns
//!
//! - **Tracing (this module)**: Dev diagnostics via `RUST_LOG`, output to stderr.
//!   Not persisted, not part of colony product output.
//!
//! - **Tick reports (`io/tick_log`)**: Product artifacts in
//!   `.colony/ticks/`. Always written, unaffected by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber for development logging.
///
/// Reads `RUST_LOG` env var. Defaults to `warn` if unset, so underserved
/// creation requests show up without extra flags.
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=colony=info colony run --ticks 50
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
