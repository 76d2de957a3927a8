use std::env;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::DiagnosticsConfig;

/// Installs the process-wide `tracing` subscriber. `RUST_LOG` takes precedence over the
/// configured filter. Returns `false` if a subscriber was already installed.
pub fn init(config: &DiagnosticsConfig) -> bool {
    let directives = env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| config.log_filter.clone());

    tracing_subscriber::fmt::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .parse_lossy(directives),
        )
        .try_init()
        .is_ok()
}
