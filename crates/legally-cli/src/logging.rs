//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "legally=info";

/// Build the filter from `RUST_LOG`, falling back to [`DEFAULT_FILTER`]
#[must_use]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber; logs go to stderr
///
/// Does nothing if a subscriber is already installed.
pub fn init(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr);

    let result = if json {
        builder.json().with_current_span(false).try_init()
    } else {
        builder.with_target(false).try_init()
    };
    if result.is_err() {
        tracing::debug!("subscriber already installed");
    }
}
