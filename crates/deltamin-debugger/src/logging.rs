//! Tracing subscriber setup.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{DebugError, Result};

/// Install a global subscriber for `config`.
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a global
/// subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| DebugError::Logging(format!("Failed to parse log filter: {}", e)))?;

    match config.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_target(config.include_targets))
                .try_init()
                .map_err(|e| DebugError::Logging(e.to_string()))?;
        }
        "compact" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_target(config.include_targets))
                .try_init()
                .map_err(|e| DebugError::Logging(e.to_string()))?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty().with_target(config.include_targets))
                .try_init()
                .map_err(|e| DebugError::Logging(e.to_string()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_an_error() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            format: "compact".to_string(),
            include_targets: false,
        };

        // Another test may already have installed a subscriber; either way
        // the second call in this test cannot succeed.
        let _ = init_tracing(&config);
        assert!(matches!(
            init_tracing(&config),
            Err(DebugError::Logging(_))
        ));
    }
}
