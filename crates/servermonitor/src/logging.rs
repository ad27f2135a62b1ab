//! Logging system setup

use crate::config::LoggingSettings;
use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global subscriber, writing to stderr so stdout only carries
/// server status lines.
///
/// `RUST_LOG` overrides the configured level when set.
pub fn setup_logging(config: &LoggingSettings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.json_format {
        registry
            .with(fmt::layer().json().with_target(false).with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()?;
    }

    tracing::debug!("Logging initialized with level: {}", config.level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_setup() {
        let first = setup_logging(&LoggingSettings::default());
        assert!(first.is_ok());

        // Only one global subscriber can be installed
        let second = setup_logging(&LoggingSettings {
            level: "debug".to_string(),
            json_format: true,
        });
        assert!(second.is_err());
    }
}
