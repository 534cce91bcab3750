//! Logging setup

use crate::config::ConfigError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `default_level`. Output goes to stderr so stdout
/// stays free for command results. A second call is ignored.
pub fn init_logging(default_level: &str) -> Result<(), ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| ConfigError::LogFilter(e.to_string()))?;

    // try_init fails only when a subscriber is already installed
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        assert!(init_logging("warn").is_ok());
        assert!(init_logging("debug").is_ok());
    }
}
