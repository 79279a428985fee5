use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_FILTER: &str = "info";

/// Log to stderr, filtered by `RUST_LOG` (default `info`). Stdout is left
/// for command output.
pub fn init(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let (text, json) = match json {
        true => (None, Some(fmt::layer().json().with_writer(std::io::stderr))),
        false => (Some(fmt::layer().with_writer(std::io::stderr)), None),
    };
    // Fails only if a subscriber is already installed.
    _ = tracing_subscriber::registry().with(filter).with(text).with(json).try_init();
}
