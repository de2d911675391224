//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Filter used when neither `--log` nor `RUST_LOG` is given.
pub const DEFAULT_FILTER: &str = "tabshell=info";

/// Installs the global fmt subscriber.
///
/// `filter` wins over `RUST_LOG`. Returns false if a subscriber was already
/// installed, which is harmless.
pub fn init_tracing(filter: Option<&str>) -> bool {
    let env_filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
