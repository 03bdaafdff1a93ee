//! Logging setup for atoll.
//!
//! Installs a `tracing-subscriber` registry with an [`EnvFilter`] and a
//! compact formatter. Level selection, first match wins:
//!
//! 1. `--verbose` / `--debug` / `ATOLL_DEBUG`: debug for every atoll crate
//! 2. `--quiet`: errors only
//! 3. `RUST_LOG`
//! 4. info for every atoll crate

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const ATOLL_TARGETS: &[&str] = &[
    "atoll",
    "atoll_core",
    "atoll_bundler",
    "atoll_gen",
    "atoll_plugin_head",
    "atoll_plugin_style",
];

/// Filter directives enabling `level` for every atoll crate
pub fn directives(level: &str) -> String {
    ATOLL_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn filter(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(directives("debug"))
    } else if quiet {
        EnvFilter::new(directives("error"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives("info")))
    }
}

/// Initialize the global subscriber.
///
/// Calling it again is a no-op; the first subscriber stays installed.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .compact();

    let installed = tracing_subscriber::registry()
        .with(filter(verbose, quiet))
        .with(fmt_layer)
        .try_init();
    if installed.is_err() {
        tracing::debug!("logger already initialized");
    }
}
