//! Tracing initialisation

use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::{Error, Result};

/// Install a JSON subscriber filtered by the configured log level
///
/// An unparseable level falls back to `info`. Installing twice in one process
/// is a [`Error::Configuration`].
pub fn init_tracing(config: &Config) -> Result<()> {
    let log_level = &config.service.log_level;

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .map_err(|err| Error::Configuration(format!("tracing subscriber already installed: {err}")))?;

    tracing::info!(service = %config.service.name, log_level = %log_level, "tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_an_error() {
        let config = Config::default();
        let _ = init_tracing(&config);

        assert!(matches!(init_tracing(&config), Err(Error::Configuration(_))));
    }
}
