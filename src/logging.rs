//! Diagnostic logging setup
//!
//! Events go to stderr so stdout stays clean CSV.

use tracing_subscriber::EnvFilter;

/// Default filter when neither `--log-level` nor `RUST_LOG` is set
pub const DEFAULT_FILTER: &str = "warn";

/// Install the global tracing subscriber
///
/// `filter` takes precedence over `RUST_LOG`. Calling this twice is harmless;
/// the second call is ignored.
pub fn init(filter: Option<&str>) {
    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_does_not_panic() {
        init(Some("debug"));
        init(None);
        tracing::debug!("logging initialised");
    }
}
