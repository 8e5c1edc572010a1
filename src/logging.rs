//! Tracing subscriber setup for the binary
//!
//! Filter precedence: `RUST_LOG`, then `logging.level` from configuration,
//! then `info`. Output goes to stderr so `evaluate --json` stays parseable.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

static INIT: Once = Once::new();

/// Build the filter for the given configured level
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = env_filter(&config.level);
        let layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

        let result = match config.format {
            LogFormat::Full => tracing_subscriber::registry()
                .with(layer)
                .with(filter)
                .try_init(),
            LogFormat::Compact => tracing_subscriber::registry()
                .with(layer.compact())
                .with(filter)
                .try_init(),
        };

        if let Err(e) = result {
            eprintln!("logging already initialised: {}", e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_invalid_level_falls_back() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert_eq!(env_filter("warn").max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(env_filter("credit_risk=loud").max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig::default();
        init_logging(&config);
        init_logging(&config);
        tracing::info!("logging initialised twice without panicking");
    }
}
